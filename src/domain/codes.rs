//! HTTP error status codes that can carry a custom error page.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// An HTTP status code in the client or server error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub const BAD_REQUEST: ErrorCode = ErrorCode(400);
    pub const UNAUTHORIZED: ErrorCode = ErrorCode(401);
    pub const FORBIDDEN: ErrorCode = ErrorCode(403);
    pub const NOT_FOUND: ErrorCode = ErrorCode(404);
    pub const INTERNAL_SERVER_ERROR: ErrorCode = ErrorCode(500);

    /// Accepts the whole 4xx/5xx class, including codes such as 599 that
    /// have no catalog entry. Editors are only offered catalogued codes.
    pub fn new(value: u16) -> Result<Self, DomainError> {
        if (400..=599).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::validation(format!(
                "status code {value} is not an HTTP error code"
            )))
        }
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }

    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(self) -> bool {
        (500..600).contains(&self.0)
    }

    /// Canonical reason phrase, falling back to a class description for
    /// codes outside the catalog.
    pub fn reason(self) -> &'static str {
        match CATALOG.iter().find(|(code, _)| *code == self.0) {
            Some((_, reason)) => reason,
            None if self.is_client_error() => "Client Error",
            None => "Server Error",
        }
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable error code paired with its editor-facing label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCodeEntry {
    pub code: ErrorCode,
    pub label: String,
}

impl ErrorCodeEntry {
    fn from_catalog(code: u16, reason: &str) -> Self {
        Self {
            code: ErrorCode(code),
            label: format!("{code} - {reason}"),
        }
    }
}

/// Codes meaningful for page-level overrides, in presentation order.
const CATALOG: &[(u16, &str)] = &[
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Request Entity Too Large"),
    (414, "Request-URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Request Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (418, "I'm a teapot"),
    (421, "Misdirected Request"),
    (422, "Unprocessable Entity"),
    (423, "Locked"),
    (424, "Failed Dependency"),
    (425, "Too Early"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (507, "Insufficient Storage"),
    (508, "Loop Detected"),
    (510, "Not Extended"),
    (511, "Network Authentication Required"),
];

/// The full, unfiltered catalog.
pub fn catalog() -> impl Iterator<Item = ErrorCodeEntry> {
    CATALOG
        .iter()
        .map(|(code, reason)| ErrorCodeEntry::from_catalog(*code, reason))
}
