//! Parsing of linked-request declarations.
//!
//! A declaration is either `name` or `name(dep1, dep2, ...)`. Dependency names may
//! be separated by commas, whitespace, or both. Names are word characters only.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{PipelineError, Result};

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w+)\s*(?:\(([^()]*)\))?\s*$").expect("declaration pattern is valid")
});

static DEPENDENCY_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]+").expect("separator pattern is valid"));

/// One parsed declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Source name
    pub name: String,
    /// Names whose results this source receives, in declared order
    pub dependencies: Vec<String>,
}

impl Declaration {
    /// Parses `name` or `name(dep1, dep2)`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidDeclaration`] for anything else, including
    /// empty parentheses and dependency names with non-word characters.
    pub fn parse(declaration: &str) -> Result<Self> {
        let invalid = || PipelineError::InvalidDeclaration {
            declaration: declaration.to_string(),
        };

        let captures = DECLARATION.captures(declaration).ok_or_else(invalid)?;
        let name = captures[1].to_string();

        let dependencies = match captures.get(2) {
            None => Vec::new(),
            Some(list) => {
                let deps: Vec<String> = DEPENDENCY_SEPARATOR
                    .split(list.as_str().trim())
                    .map(str::to_string)
                    .collect();
                if deps.iter().any(|d| d.is_empty() || !d.chars().all(is_word_char)) {
                    return Err(invalid());
                }
                deps
            }
        };

        Ok(Self { name, dependencies })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
