use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{generate_id, Source};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    Temp,
    Activated,
}

/// A tracked product. Created in `Temp` state with no bound email;
/// activation binds it to exactly one verified email and is
/// irreversible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchlistEntry {
    pub id: String,
    pub product_name: String,
    pub product_url: String,
    pub image_url: Option<String>,
    pub source: Source,
    pub current_price: i64,
    pub target_price: Option<i64>,
    pub user_email: Option<String>,
    pub state: WatchState,
    pub created_at: DateTime<Utc>,
}

/// Snapshot of a search result being promoted into the watchlist.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewWatchEntry {
    #[validate(length(min = 1, message = "product name is required"))]
    pub product_name: String,
    /// Listing URL, or the `"#"` placeholder when the source did not
    /// provide one.
    #[validate(length(min = 1, message = "product url is required"))]
    pub product_url: String,
    pub image_url: Option<String>,
    pub source: Source,
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub current_price: i64,
    pub target_price: Option<i64>,
}

impl WatchlistEntry {
    pub fn temporary(new_entry: NewWatchEntry, target_price: Option<i64>) -> Self {
        Self {
            id: generate_id(),
            product_name: new_entry.product_name,
            product_url: new_entry.product_url,
            image_url: new_entry.image_url,
            source: new_entry.source,
            current_price: new_entry.current_price,
            target_price,
            user_email: None,
            state: WatchState::Temp,
            created_at: Utc::now(),
        }
    }

    pub fn is_temp(&self) -> bool {
        self.state == WatchState::Temp
    }

    pub fn is_activated(&self) -> bool {
        self.state == WatchState::Activated
    }

    /// Whether an activated entry is bound to the given email.
    pub fn is_bound_to(&self, email: &str) -> bool {
        self.user_email.as_deref() == Some(email)
    }

    /// One-way Temp -> Activated transition, binding the entry to the
    /// email. Activating an already-activated entry for the same email
    /// is a no-op; there is no path back to Temp.
    pub fn activate(&mut self, email: &str) {
        if self.state == WatchState::Temp {
            self.state = WatchState::Activated;
            self.user_email = Some(email.to_string());
        }
    }
}
