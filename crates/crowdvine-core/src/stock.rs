//! Stock display policy and badge classification

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::settings_store::{FEW_LEFT_THRESHOLD_KEY, SettingsStore};

/// Threshold used when nothing usable is configured
pub const DEFAULT_FEW_LEFT_THRESHOLD: u32 = 5;

/// How stock levels are presented on product cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDisplayPolicy {
    /// Products with at most this many bottles left read "Few left"
    pub few_left_threshold: u32,
}

impl Default for StockDisplayPolicy {
    fn default() -> Self {
        Self {
            few_left_threshold: DEFAULT_FEW_LEFT_THRESHOLD,
        }
    }
}

impl StockDisplayPolicy {
    pub fn new(few_left_threshold: u32) -> Self {
        Self { few_left_threshold }
    }

    /// Load the policy from the settings store.
    ///
    /// Never fails: a missing, malformed or negative value, or a store
    /// error, falls back to `fallback`.
    pub async fn load(store: &dyn SettingsStore, fallback: u32) -> Self {
        let threshold = match store.get_setting(FEW_LEFT_THRESHOLD_KEY).await {
            Ok(Some(value)) => parse_threshold(&value).unwrap_or_else(|| {
                warn!(
                    "Ignoring invalid {} value {} from {} store, using {}",
                    FEW_LEFT_THRESHOLD_KEY,
                    value,
                    store.name(),
                    fallback
                );
                fallback
            }),
            Ok(None) => {
                debug!(
                    "{} not set in {} store, using {}",
                    FEW_LEFT_THRESHOLD_KEY,
                    store.name(),
                    fallback
                );
                fallback
            }
            Err(e) => {
                warn!(
                    "Failed to read {} from {} store, using {}: {}",
                    FEW_LEFT_THRESHOLD_KEY,
                    store.name(),
                    fallback,
                    e
                );
                fallback
            }
        };

        Self::new(threshold)
    }

    pub fn classify(&self, available: i64) -> StockBadge {
        if available <= 0 {
            StockBadge::SoldOut
        } else if available <= i64::from(self.few_left_threshold) {
            StockBadge::FewLeft
        } else {
            StockBadge::InStock
        }
    }
}

/// Accepts non-negative integers, either as JSON numbers or numeric strings
fn parse_threshold(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Badge rendered next to a product's stock level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBadge {
    InStock,
    FewLeft,
    SoldOut,
}

impl StockBadge {
    pub fn label(&self) -> &'static str {
        match self {
            StockBadge::InStock => "In stock",
            StockBadge::FewLeft => "Few left",
            StockBadge::SoldOut => "Sold out",
        }
    }
}
