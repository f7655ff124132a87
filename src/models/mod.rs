use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod pagination;
pub mod price_history;
pub mod product;
pub mod watchlist;

// Re-exports for convenience
pub use pagination::*;
pub use price_history::*;
pub use product::*;
pub use watchlist::*;

/// Marketplace a record or watch entry came from. Carried explicitly on
/// every request and record instead of living in ambient UI state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    #[serde(rename = "SSG")]
    Ssg,
    #[serde(rename = "NAVER")]
    Naver,
    #[serde(rename = "ELEVENTH_STREET")]
    EleventhStreet,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ssg => "SSG",
            Source::Naver => "NAVER",
            Source::EleventhStreet => "ELEVENTH_STREET",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SSG" => Ok(Source::Ssg),
            "NAVER" => Ok(Source::Naver),
            "ELEVENTH_STREET" | "11ST" => Ok(Source::EleventhStreet),
            other => Err(format!("unknown source: {}", other)),
        }
    }
}

// Helper function to generate entry ids in the format expected by callers
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
