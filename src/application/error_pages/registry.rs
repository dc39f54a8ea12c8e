use std::collections::BTreeSet;

use crate::domain::codes::{ErrorCode, ErrorCodeEntry, catalog};

use super::ErrorPageConfig;

/// Status codes editors may attach error pages to.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeRegistry {
    allowed: Option<BTreeSet<ErrorCode>>,
}

impl ErrorCodeRegistry {
    pub fn new(allowed: Option<&[ErrorCode]>) -> Self {
        Self {
            allowed: allowed.map(|codes| codes.iter().copied().collect()),
        }
    }

    pub fn from_config(config: &ErrorPageConfig) -> Self {
        Self::new(config.allowed_error_codes.as_deref())
    }

    /// Catalog entries in catalog order, restricted to the allow-list when
    /// one is configured. Allow-listed codes missing from the catalog are
    /// ignored.
    pub fn available_codes(&self) -> Vec<ErrorCodeEntry> {
        catalog().filter(|entry| self.allows(entry.code)).collect()
    }

    pub fn label(&self, code: ErrorCode) -> Option<String> {
        self.available_codes()
            .into_iter()
            .find(|entry| entry.code == code)
            .map(|entry| entry.label)
    }

    pub fn contains(&self, code: ErrorCode) -> bool {
        self.allows(code) && catalog().any(|entry| entry.code == code)
    }

    fn allows(&self, code: ErrorCode) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&code))
    }
}
