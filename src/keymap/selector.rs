//! Scope selectors: which focused-element contexts a binding applies to
//!
//! The engine only ever talks to a [`Selectors`] implementation. The default
//! [`CompoundSelectors`] understands comma-separated lists of `*` or compound
//! selectors (`tag#id.class.class`), which covers typical keymap scopes such
//! as `.editor`, `#palette` or `text-editor.mini`. Combinators are not
//! supported.

use std::fmt;

/// Selector collaborator used for validation, precedence and matching
pub trait Selectors {
    /// The element type found in an event's target chain
    type Element: Clone;

    fn is_valid_selector(&self, selector: &str) -> bool;

    /// Precedence score, higher is more specific
    fn specificity_of(&self, selector: &str) -> u32;

    fn matches(&self, element: &Self::Element, selector: &str) -> bool;
}

/// A node in a target chain, as seen by [`CompoundSelectors`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Parse an element description like `div#main.editor.focused`
    pub fn parse(text: &str) -> Option<Self> {
        let compound = Compound::parse(text.trim())?;
        Some(Self {
            tag: compound.tag?,
            id: compound.id,
            classes: compound.classes,
        })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(ref id) = self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        Ok(())
    }
}

/// One entry of a selector list
#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl Compound {
    fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }

        let mut compound = Compound::default();
        let mut rest = text;

        if let Some(after) = rest.strip_prefix('*') {
            rest = after;
        } else {
            let end = rest.find(|c| !is_ident_char(c)).unwrap_or(rest.len());
            if end > 0 {
                compound.tag = Some(rest[..end].to_ascii_lowercase());
                rest = &rest[end..];
            }
        }

        while let Some(sigil) = rest.chars().next() {
            let body = &rest[sigil.len_utf8()..];
            let end = body.find(|c| !is_ident_char(c)).unwrap_or(body.len());
            if end == 0 {
                return None;
            }
            let ident = body[..end].to_string();
            match sigil {
                '#' if compound.id.is_none() => compound.id = Some(ident),
                '.' => compound.classes.push(ident),
                _ => return None,
            }
            rest = &body[end..];
        }

        Some(compound)
    }

    fn specificity(&self) -> u32 {
        let ids = u32::from(self.id.is_some());
        let classes = self.classes.len() as u32;
        let tags = u32::from(self.tag.is_some());
        ids * 100 + classes * 10 + tags
    }

    fn matches(&self, element: &Element) -> bool {
        if let Some(ref tag) = self.tag {
            if !tag.eq_ignore_ascii_case(&element.tag) {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if element.id.as_ref() != Some(id) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.classes.contains(c))
    }
}

fn parse_list(selector: &str) -> Option<Vec<Compound>> {
    selector.split(',').map(|s| Compound::parse(s.trim())).collect()
}

/// Default selector engine over [`Element`]
#[derive(Clone, Copy, Debug, Default)]
pub struct CompoundSelectors;

impl Selectors for CompoundSelectors {
    type Element = Element;

    fn is_valid_selector(&self, selector: &str) -> bool {
        parse_list(selector).is_some()
    }

    /// For a list, the highest entry wins, whichever entry matched the element
    fn specificity_of(&self, selector: &str) -> u32 {
        parse_list(selector)
            .map(|list| list.iter().map(Compound::specificity).max().unwrap_or(0))
            .unwrap_or(0)
    }

    fn matches(&self, element: &Element, selector: &str) -> bool {
        parse_list(selector).is_some_and(|list| list.iter().any(|c| c.matches(element)))
    }
}
