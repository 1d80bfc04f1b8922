//! Action definitions and alias expansion
//!
//! An action definition is an action name followed by its arguments, e.g.
//! `change_font_size all +2.0`. `combine <sep> a <sep> b` chains several
//! definitions, and configured aliases expand to other definitions.

use std::fmt;

use indexmap::IndexMap;

/// Action name that chains several definitions
pub const COMBINE: &str = "combine";

/// An elementary action: a name plus positional string arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub name: String,
    pub args: Vec<String>,
}

impl Action {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse a single definition without alias or combine expansion
    pub fn parse(definition: &str) -> Result<Self, AliasExpansionError> {
        let (name, rest) = split_word(definition);
        if name.is_empty() {
            return Err(AliasExpansionError::Empty);
        }
        Ok(Self::new(name, tokenize(rest)?))
    }

    /// Definition text that parses back to this action
    pub fn pretty(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\') {
                write!(f, " '{}'", arg.replace('\'', "'\\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Errors from expanding an action definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AliasExpansionError {
    #[error("empty action definition")]
    Empty,
    #[error("combine needs a separator followed by at least one action")]
    MissingSeparator,
    #[error("unterminated quote in action arguments")]
    UnterminatedQuote,
}

/// Named shorthands for action definitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    aliases: IndexMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` to expand to `expansion`, replacing any earlier alias
    pub fn insert(&mut self, name: impl Into<String>, expansion: impl Into<String>) {
        self.aliases.insert(name.into(), expansion.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Expand a definition into the elementary actions it stands for, in order
    pub fn resolve(&self, definition: &str) -> Result<Vec<Action>, AliasExpansionError> {
        let mut actions = Vec::new();
        let mut expanding = Vec::new();
        self.expand(definition, &mut expanding, &mut actions)?;
        Ok(actions)
    }

    fn expand(
        &self,
        definition: &str,
        expanding: &mut Vec<String>,
        out: &mut Vec<Action>,
    ) -> Result<(), AliasExpansionError> {
        let (name, rest) = split_word(definition);
        if name.is_empty() {
            return Err(AliasExpansionError::Empty);
        }

        if name == COMBINE {
            let (separator, body) = split_word(rest);
            if separator.is_empty() || body.trim().is_empty() {
                return Err(AliasExpansionError::MissingSeparator);
            }
            for part in body.split(separator) {
                if part.trim().is_empty() {
                    return Err(AliasExpansionError::Empty);
                }
                self.expand(part, expanding, out)?;
            }
            return Ok(());
        }

        // An alias is not expanded again inside its own expansion
        if !expanding.iter().any(|active| active == name) {
            if let Some(expansion) = self.aliases.get(name) {
                let rest = rest.trim();
                let expanded = if rest.is_empty() {
                    expansion.clone()
                } else {
                    format!("{} {}", expansion, rest)
                };
                expanding.push(name.to_string());
                let result = self.expand(&expanded, expanding, out);
                expanding.pop();
                return result;
            }
        }

        out.push(Action::new(name, tokenize(rest)?));
        Ok(())
    }
}

/// Split off the first whitespace-delimited word
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], &text[end..]),
        None => (text, ""),
    }
}

/// Split arguments on whitespace, honoring quotes and backslash escapes
///
/// Single quotes are literal; inside double quotes and bare words a
/// backslash escapes the next character.
pub fn tokenize(text: &str) -> Result<Vec<String>, AliasExpansionError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(AliasExpansionError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c) => current.push(c),
                            None => return Err(AliasExpansionError::UnterminatedQuote),
                        },
                        Some(c) => current.push(c),
                        None => return Err(AliasExpansionError::UnterminatedQuote),
                    }
                }
            }
            '\\' => {
                in_token = true;
                if let Some(c) = chars.next() {
                    current.push(c);
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}
