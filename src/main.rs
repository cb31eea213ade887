use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use keyseq::cli::{find_conflicts, parse_script, replay, CliArgs, CliCommand};
use keyseq::keymap::{load_keymap_file, CompoundSelectors, Keymap, UsLayout};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    keyseq::tracing::init(args.log_file.as_deref()).context("failed to initialize logging")?;

    match &args.command {
        CliCommand::Replay { keymap, script } => {
            let mut engine = build_keymap(&args, keymap)?;
            let text = std::fs::read_to_string(script)
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let steps = parse_script(&text, engine.settings().platform)
                .with_context(|| format!("invalid script {}", script.display()))?;

            for event in replay(&mut engine, &steps) {
                println!("{event}");
            }
        }
        CliCommand::Check { keymap } => {
            let engine = build_keymap(&args, keymap)?;
            println!("{} binding(s) registered", engine.bindings().len());

            for (short, long) in find_conflicts(&engine) {
                println!(
                    "conflict on `{}`: `{}` ({}) waits for the timeout because of `{}` ({})",
                    short.selector(),
                    short.sequence(),
                    short.command(),
                    long.sequence(),
                    long.command()
                );
            }
        }
    }

    Ok(())
}

/// Load a keymap file, apply CLI overrides and register its bindings
///
/// Rejected bindings are printed and otherwise skipped.
fn build_keymap(args: &CliArgs, path: &Path) -> Result<Keymap> {
    let file = load_keymap_file(path)
        .with_context(|| format!("failed to load keymap {}", path.display()))?;

    let mut settings = file.settings;
    args.apply_overrides(&mut settings);

    let mut engine = Keymap::new(UsLayout, CompoundSelectors, settings);
    let registration = engine.add_bindings(file.bindings);
    for diagnostic in &registration.diagnostics {
        eprintln!("{}: {}", path.display(), diagnostic);
    }
    Ok(engine)
}
