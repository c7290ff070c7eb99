use std::fmt;

use serde::{Deserialize, Serialize};

/// Occupation code reduced to its digits. ANZSCO unit groups are 4 digits, occupations 6.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OccupationCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("occupation code '{0}' contains no digits")]
    Empty(String),
    #[error("occupation code '{raw}' has {digits} digits; expected 4 to 6")]
    Length { raw: String, digits: usize },
}

impl OccupationCode {
    pub const MIN_DIGITS: usize = 4;
    pub const MAX_DIGITS: usize = 6;

    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let digits = digits_only(raw);
        if digits.is_empty() {
            return Err(CodeError::Empty(raw.to_string()));
        }
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(CodeError::Length {
                raw: raw.to_string(),
                digits: digits.len(),
            });
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading digit: the ANZSCO major group.
    pub fn major_group(&self) -> u8 {
        self.0
            .bytes()
            .next()
            .map(|byte| byte - b'0')
            .unwrap_or_default()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        digits_only(candidate) == self.0
    }
}

impl fmt::Display for OccupationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
