//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

use super::codes::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

/// Tagged page variant. Error pages carry the status code they answer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageKind {
    #[default]
    Standard,
    Error { code: ErrorCode },
}

impl PageKind {
    pub fn error_code(self) -> Option<ErrorCode> {
        match self {
            PageKind::Standard => None,
            PageKind::Error { code } => Some(code),
        }
    }
}

/// Which copy of a page a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Latest edits, published or not.
    Draft,
    /// What anonymous visitors see.
    #[default]
    Live,
}
