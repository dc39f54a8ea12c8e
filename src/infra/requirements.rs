//! Asset requirement state adapters.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::render::AssetRequirements;

/// For renderers that do not aggregate CSS/JS per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAssetRequirements;

impl AssetRequirements for NoopAssetRequirements {
    fn clear(&self) {}

    fn clear_combined_files(&self) {}
}

/// Counts resets so callers can verify stale assets were discarded.
#[derive(Debug, Default)]
pub struct RecordingAssetRequirements {
    clears: AtomicUsize,
    combined_clears: AtomicUsize,
}

impl RecordingAssetRequirements {
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn clear_combined_count(&self) -> usize {
        self.combined_clears.load(Ordering::SeqCst)
    }
}

impl AssetRequirements for RecordingAssetRequirements {
    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_combined_files(&self) {
        self.combined_clears.fetch_add(1, Ordering::SeqCst);
    }
}
