use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point of a product's price series. The series is append-only and
/// owned by the storage collaborator; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceObservation {
    pub product_id: String,
    pub price: i64,
    pub recorded_at: DateTime<Utc>,
}

/// Derived summary of a price series. Never stored; recomputed per call
/// since the underlying series may grow between reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceStats {
    pub min: i64,
    pub max: i64,
    pub current: i64,
    pub first: i64,
    pub delta: i64,
    pub delta_percent: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriceDirection {
    Increased,
    Decreased,
    Unchanged,
}

impl PriceStats {
    pub fn direction(&self) -> PriceDirection {
        match self.delta {
            d if d > 0 => PriceDirection::Increased,
            d if d < 0 => PriceDirection::Decreased,
            _ => PriceDirection::Unchanged,
        }
    }
}
