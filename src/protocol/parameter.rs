//! Typed command parameters.
//!
//! A parameter is one field of a command: a single character, an 8-bit value
//! or a 16-bit value. Numeric fields are edited as fixed-width hex text and
//! encoded big-endian in the order the digits are written.

use super::document::ParamElement;
use super::error::ParamError;
use std::fmt;
use std::str::FromStr;

/// The closed set of parameter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Char,
    Uint8,
    Uint16,
}

impl ParamKind {
    /// Name used in protocol documents.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
        }
    }

    /// Number of hex digits a numeric kind is edited with.
    pub fn hex_width(self) -> Option<usize> {
        match self {
            Self::Char => None,
            Self::Uint8 => Some(2),
            Self::Uint16 => Some(4),
        }
    }

    /// Largest value the kind can hold.
    fn max_value(self) -> u16 {
        match self {
            Self::Char => 0,
            Self::Uint8 => u8::MAX as u16,
            Self::Uint16 => u16::MAX,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a type name that is not one of `char`, `uint8`, `uint16`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for ParamKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" => Ok(Self::Char),
            "uint8" => Ok(Self::Uint8),
            "uint16" => Ok(Self::Uint16),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// One typed field of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    kind: ParamKind,
    /// Char: zero or one character. Numeric: at most `hex_width` lowercase hex digits.
    text: String,
}

impl Parameter {
    pub fn char(name: impl Into<String>, value: &str) -> Self {
        let mut param = Self::blank(name, ParamKind::Char);
        param.set_char(value);
        param
    }

    pub fn uint8(name: impl Into<String>, value: u8) -> Self {
        let mut param = Self::blank(name, ParamKind::Uint8);
        param.text = format!("{value:02x}");
        param
    }

    pub fn uint16(name: impl Into<String>, value: u16) -> Self {
        let mut param = Self::blank(name, ParamKind::Uint16);
        param.text = format!("{value:04x}");
        param
    }

    /// A parameter as freshly added by the operator: empty char, `00`, `0000`.
    pub fn with_default(name: impl Into<String>, kind: ParamKind) -> Self {
        match kind {
            ParamKind::Char => Self::char(name, ""),
            ParamKind::Uint8 => Self::uint8(name, 0),
            ParamKind::Uint16 => Self::uint16(name, 0),
        }
    }

    /// A parameter with no text at all; it has no byte encoding until edited.
    pub fn blank(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            text: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    /// The text shown to the operator.
    pub fn display_value(&self) -> &str {
        &self.text
    }

    /// Edit the raw text, as typed into a masked field.
    ///
    /// Char keeps the first character only (an empty string clears it).
    /// Numeric kinds accept up to their width in hex digits; incomplete text
    /// is stored but will not encode.
    pub fn set_text(&mut self, text: &str) -> Result<(), ParamError> {
        match self.kind.hex_width() {
            None => {
                self.text = text.chars().take(1).collect();
                Ok(())
            }
            Some(width) => {
                if text.len() > width || !text.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(ParamError::InvalidInput {
                        kind: self.kind,
                        text: text.to_string(),
                    });
                }
                self.text = text.to_ascii_lowercase();
                Ok(())
            }
        }
    }

    /// Set a char parameter from a string; only the first character is kept
    /// and an empty string leaves the current value alone.
    pub fn set_char(&mut self, value: &str) {
        if let Some(c) = value.chars().next() {
            self.text = c.to_string();
        }
    }

    /// Set a numeric parameter; formats as zero-padded lowercase hex.
    pub fn set_number(&mut self, value: u16) -> Result<(), ParamError> {
        match self.kind.hex_width() {
            Some(width) if value <= self.kind.max_value() => {
                self.text = format!("{value:0width$x}");
                Ok(())
            }
            _ => Err(ParamError::InvalidInput {
                kind: self.kind,
                text: value.to_string(),
            }),
        }
    }

    /// Numeric value of the current text. `None` for char or empty text.
    pub fn number(&self) -> Option<u16> {
        match self.kind {
            ParamKind::Char => None,
            _ => u16::from_str_radix(&self.text, 16).ok(),
        }
    }

    /// Bytes this parameter contributes to a command.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ParamError> {
        match self.kind.hex_width() {
            None => Ok(self.text.as_bytes().to_vec()),
            Some(width) => {
                if self.text.len() != width {
                    return Err(self.format_error(width));
                }
                hex::decode(&self.text).map_err(|_| self.format_error(width))
            }
        }
    }

    /// Document form: the char itself, or the decimal value of a numeric field.
    pub fn to_element(&self) -> Result<ParamElement, ParamError> {
        let value = match self.kind.hex_width() {
            None => self.text.clone(),
            Some(width) => self
                .number()
                .ok_or_else(|| self.format_error(width))?
                .to_string(),
        };
        Ok(ParamElement {
            name: Some(self.name.clone()),
            kind: Some(self.kind.as_str().to_string()),
            value: Some(value),
        })
    }

    fn format_error(&self, expected: usize) -> ParamError {
        ParamError::Format {
            name: self.name.clone(),
            kind: self.kind,
            expected,
            text: self.text.clone(),
        }
    }
}
