//! Per-item outcome aggregation for multi-item operations.
//!
//! Datasource tests, datasource deploys and file generation all process
//! lists where a single bad item must not hide the others. Each item
//! yields an [`ItemOutcome`]; a summary succeeds when every non-skipped
//! item succeeded.

use serde::{Deserialize, Serialize};

/// Outcome of processing one item in a list operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub key: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ItemOutcome {
    /// A successfully processed item.
    pub fn ok(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            skipped: false,
            reason: None,
            success: true,
            error: None,
        }
    }

    /// A failed item; the error is recorded, not propagated.
    pub fn failed(key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            skipped: false,
            reason: None,
            success: false,
            error: Some(error.into()),
        }
    }

    /// An item that was not processed at all. Skipped items never count
    /// against the summary.
    pub fn skipped(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            skipped: true,
            reason: Some(reason.into()),
            success: true,
            error: None,
        }
    }
}

/// Aggregate of all item outcomes for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeSummary {
    pub success: bool,
    pub items: Vec<ItemOutcome>,
}

impl OutcomeSummary {
    /// Build a summary; success is the AND over all non-skipped items.
    pub fn from_items(items: Vec<ItemOutcome>) -> Self {
        let success = items.iter().filter(|i| !i.skipped).all(|i| i.success);
        Self { success, items }
    }

    /// Count of items that actually ran and succeeded.
    pub fn passed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| !i.skipped && i.success)
            .count()
    }

    /// Count of items that ran and failed.
    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| !i.skipped && !i.success)
            .count()
    }

    /// Count of skipped items.
    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|i| i.skipped).count()
    }
}
