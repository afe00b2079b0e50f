//! Encoding characters and escape handling.

use crate::error::ModelError;

/// Separator and escape characters declared by MSH-1 and MSH-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Field separator (MSH-1), normally `|`.
    pub field: char,
    /// Component separator, normally `^`.
    pub component: char,
    /// Repetition separator, normally `~`.
    pub repetition: char,
    /// Escape character, normally `\`.
    pub escape: char,
    /// Subcomponent separator, normally `&`.
    pub subcomponent: char,
    /// Truncation character (v2.7 and later), normally `#` when declared.
    pub truncation: Option<char>,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
            truncation: None,
        }
    }
}

impl Delimiters {
    /// Builds delimiters from the field separator and the MSH-2 encoding
    /// characters. Missing encoding characters fall back to the defaults; a
    /// fifth character declares the truncation character.
    pub fn from_header(field: char, encoding: &str) -> Result<Self, ModelError> {
        let defaults = Self::default();
        let mut chars = encoding.chars();
        let delimiters = Self {
            field,
            component: chars.next().unwrap_or(defaults.component),
            repetition: chars.next().unwrap_or(defaults.repetition),
            escape: chars.next().unwrap_or(defaults.escape),
            subcomponent: chars.next().unwrap_or(defaults.subcomponent),
            truncation: chars.next(),
        };
        delimiters.validate()?;
        Ok(delimiters)
    }

    /// The MSH-2 value for these delimiters.
    #[must_use]
    pub fn encoding_characters(&self) -> String {
        [
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ]
        .into_iter()
        .chain(self.truncation)
        .collect()
    }

    fn validate(&self) -> Result<(), ModelError> {
        let all: Vec<char> = [
            self.field,
            self.component,
            self.repetition,
            self.escape,
            self.subcomponent,
        ]
        .into_iter()
        .chain(self.truncation)
        .collect();
        for (index, candidate) in all.iter().enumerate() {
            if candidate.is_alphanumeric() || candidate.is_whitespace() {
                return Err(ModelError::decode(format!(
                    "delimiter '{candidate}' must be a punctuation character"
                )));
            }
            if all.iter().skip(index + 1).any(|other| other == candidate) {
                return Err(ModelError::decode(format!(
                    "delimiter '{candidate}' is declared more than once"
                )));
            }
        }
        Ok(())
    }

    /// Replaces delimiter characters in `value` with escape sequences.
    #[must_use]
    pub fn escape(&self, value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for ch in value.chars() {
            let code = match ch {
                c if c == self.field => Some('F'),
                c if c == self.component => Some('S'),
                c if c == self.subcomponent => Some('T'),
                c if c == self.repetition => Some('R'),
                c if c == self.escape => Some('E'),
                c if Some(c) == self.truncation => Some('P'),
                _ => None,
            };
            match code {
                Some(code) => {
                    escaped.push(self.escape);
                    escaped.push(code);
                    escaped.push(self.escape);
                }
                None => escaped.push(ch),
            }
        }
        escaped
    }

    /// Resolves delimiter escape sequences in `text`.
    ///
    /// Sequences other than the delimiter escapes (formatting hints,
    /// hexadecimal data) are preserved verbatim, as is an unterminated escape.
    #[must_use]
    pub fn unescape(&self, text: &str) -> String {
        if !text.contains(self.escape) {
            return text.to_owned();
        }
        let mut resolved = String::with_capacity(text.len());
        let mut rest = text;
        while let Some((before, after_open)) = rest.split_once(self.escape) {
            resolved.push_str(before);
            let Some((sequence, after)) = after_open.split_once(self.escape) else {
                resolved.push(self.escape);
                resolved.push_str(after_open);
                return resolved;
            };
            match self.resolve(sequence) {
                Some(ch) => resolved.push(ch),
                None => {
                    resolved.push(self.escape);
                    resolved.push_str(sequence);
                    resolved.push(self.escape);
                }
            }
            rest = after;
        }
        resolved.push_str(rest);
        resolved
    }

    fn resolve(&self, sequence: &str) -> Option<char> {
        match sequence {
            "F" => Some(self.field),
            "S" => Some(self.component),
            "T" => Some(self.subcomponent),
            "R" => Some(self.repetition),
            "E" => Some(self.escape),
            "P" => self.truncation,
            _ => None,
        }
    }
}
