//! Model Pricing
//!
//! A versioned, in-memory price table mapping model names to per-category
//! unit prices (USD per 1M tokens). Model identifiers drift across releases
//! (dated suffixes, vendor prefixes), so lookup falls through several tiers:
//! exact match on the normalized name, substring match in either direction,
//! family fallback for anything containing `opus`/`sonnet`/`haiku`, and
//! finally an all-zero row so unknown models never corrupt totals with
//! guessed prices.
//!
//! The table is built once and passed by reference into the parser; tests can
//! construct alternate tables without touching process-global state.

use crate::models::{ModelPrice, TokenUsage};

const MILLION: f64 = 1_000_000.0;

// Representative rows reused by the family fallback tier.
const OPUS_PRICE: ModelPrice = ModelPrice {
    input: 15.0,
    output: 75.0,
    cache_write: 18.75,
    cache_read: 1.50,
};
const SONNET_PRICE: ModelPrice = ModelPrice {
    input: 3.0,
    output: 15.0,
    cache_write: 3.75,
    cache_read: 0.30,
};
const HAIKU_PRICE: ModelPrice = ModelPrice {
    input: 0.80,
    output: 4.0,
    cache_write: 1.0,
    cache_read: 0.08,
};

/// Immutable price lookup. Entry order matters: the substring tier scans in
/// insertion order, so more specific names come first.
#[derive(Debug, Clone)]
pub struct PriceTable {
    entries: Vec<(String, ModelPrice)>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PriceTable {
    /// The built-in table covering current and recent model generations.
    pub fn builtin() -> Self {
        let rows = [
            ("claude-opus-4", OPUS_PRICE),
            ("claude-sonnet-4", SONNET_PRICE),
            ("claude-3-7-sonnet", SONNET_PRICE),
            ("claude-3-5-sonnet", SONNET_PRICE),
            ("claude-3-5-haiku", HAIKU_PRICE),
            ("claude-3-opus", OPUS_PRICE),
            (
                "claude-3-haiku",
                ModelPrice {
                    input: 0.25,
                    output: 1.25,
                    cache_write: 0.30,
                    cache_read: 0.03,
                },
            ),
        ];
        Self {
            entries: rows.iter().map(|(n, p)| (n.to_string(), *p)).collect(),
        }
    }

    /// Build a table from explicit rows, e.g. for tests or injected overrides.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, ModelPrice)>,
        S: Into<String>,
    {
        Self {
            entries: rows
                .into_iter()
                .map(|(n, p)| (normalize(&n.into()), p))
                .collect(),
        }
    }

    /// Resolve a model name to a price row. Never fails: unknown models get
    /// the all-zero row.
    pub fn price_for(&self, model_name: &str) -> ModelPrice {
        let name = normalize(model_name);
        if name.is_empty() {
            return ModelPrice::ZERO;
        }

        for (key, price) in &self.entries {
            if *key == name {
                return *price;
            }
        }

        // Substring match, either direction: "claude-3-5-sonnet-20241022"
        // should hit "claude-3-5-sonnet", and a bare "sonnet-4" should hit
        // "claude-sonnet-4" via the reverse check.
        for (key, price) in &self.entries {
            if name.contains(key.as_str()) || key.contains(name.as_str()) {
                return *price;
            }
        }

        if name.contains("opus") {
            OPUS_PRICE
        } else if name.contains("sonnet") {
            SONNET_PRICE
        } else if name.contains("haiku") {
            HAIKU_PRICE
        } else {
            ModelPrice::ZERO
        }
    }

    /// Cost of one usage record under this table.
    pub fn cost_of(&self, usage: &TokenUsage, model_name: &str) -> f64 {
        let price = self.price_for(model_name);
        usage.input_tokens as f64 * price.input / MILLION
            + usage.output_tokens as f64 * price.output / MILLION
            + usage.cache_creation_tokens as f64 * price.cache_write / MILLION
            + usage.cache_read_tokens as f64 * price.cache_read / MILLION
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}
