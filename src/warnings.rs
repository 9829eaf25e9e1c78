//! Threshold warnings for story data.
//!
//! Browser local storage gives a story roughly 5 MiB. These warnings flag
//! stores approaching that budget, and stores accumulating unplaced beats.

use crate::storage::LOCAL_STORAGE_QUOTA;
use crate::store::StoryStats;

/// Persisted size above which a warning is raised
pub const STORAGE_WARNING_THRESHOLD: usize = 4 * 1024 * 1024;

/// Orphaned beat count above which a warning is raised
pub const ORPHAN_WARNING_THRESHOLD: usize = 50;

/// A warning about the state of the story data.
#[derive(Debug, Clone)]
pub enum Warning {
    /// Persisted data is close to the storage quota.
    LargeStorage { size_mb: f64, quota_mb: f64 },
    /// Many beats are not placed in any scene.
    ManyOrphans { count: usize, threshold: usize },
}

/// Check thresholds and return any warnings.
///
/// # Arguments
/// * `stats` - Story statistics from `StoryStore::get_stats()`
/// * `storage_bytes` - Bytes currently held by the storage backend
pub fn check_thresholds(stats: &StoryStats, storage_bytes: usize) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if storage_bytes > STORAGE_WARNING_THRESHOLD {
        warnings.push(Warning::LargeStorage {
            size_mb: storage_bytes as f64 / (1024.0 * 1024.0),
            quota_mb: LOCAL_STORAGE_QUOTA as f64 / (1024.0 * 1024.0),
        });
    }

    if stats.beats.orphaned > ORPHAN_WARNING_THRESHOLD {
        warnings.push(Warning::ManyOrphans {
            count: stats.beats.orphaned,
            threshold: ORPHAN_WARNING_THRESHOLD,
        });
    }

    warnings
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::LargeStorage { size_mb, quota_mb } => {
            format!(
                "Warning: story data ({:.1}MB) is approaching the {:.0}MB storage quota",
                size_mb, quota_mb
            )
        }
        Warning::ManyOrphans { count, threshold } => {
            format!(
                "Warning: {} beats are not in any scene (more than {})",
                count, threshold
            )
        }
    }
}
