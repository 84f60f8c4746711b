//! Loosely typed cell values as returned by the spreadsheet backend.
//!
//! The backend keeps no schema: the same column can hold text in one row and
//! a number in the next, or be missing altogether. `SheetValue` preserves
//! whatever arrived so that normalization can decide how to read it.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SheetValue {
    /// True for null, missing, and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            SheetValue::Empty => true,
            SheetValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Textual rendering used for identifiers and free-text columns.
    ///
    /// Whole numbers render without a fractional part so that a numeric
    /// `doctorId` of `3` compares equal to the text `"3"`.
    pub fn as_text(&self) -> String {
        match self {
            SheetValue::Empty => String::new(),
            SheetValue::Bool(flag) => flag.to_string(),
            SheetValue::Number(number) => format_number(*number),
            SheetValue::Text(text) => text.clone(),
        }
    }

    /// Trimmed text, for comparing identifiers.
    pub fn key(&self) -> String {
        self.as_text().trim().to_string()
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SheetValue::Number(number) if number.is_finite() => Some(*number),
            SheetValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|number| number.is_finite())
            }
            _ => None,
        }
    }
}

fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

impl fmt::Display for SheetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for SheetValue {
    fn from(value: &str) -> Self {
        SheetValue::Text(value.to_string())
    }
}

impl From<String> for SheetValue {
    fn from(value: String) -> Self {
        SheetValue::Text(value)
    }
}

impl From<f64> for SheetValue {
    fn from(value: f64) -> Self {
        SheetValue::Number(value)
    }
}

impl From<i64> for SheetValue {
    fn from(value: i64) -> Self {
        SheetValue::Number(value as f64)
    }
}
