use validator::{Validate, ValidateEmail};

use crate::gateway::WatchStore;
use crate::models::{NewWatchEntry, WatchlistEntry};
use crate::utils::error::{AppError, Result};

/// Result of a bulk activation. Entries activate independently, so a
/// batch can partially succeed; rejections are reported per entry and
/// never silently dropped.
#[derive(Debug)]
pub struct ActivationReport {
    pub activated_count: usize,
    pub rejected: Vec<RejectedActivation>,
}

#[derive(Debug)]
pub struct RejectedActivation {
    pub entry_id: String,
    pub error: AppError,
}

/// Owns the watchlist state machine: entries are captured as anonymous
/// TEMP records, bound to exactly one email on activation, and removed
/// only by their owner once activated. There is no path back from
/// ACTIVATED to TEMP.
pub struct WatchlistManager<S> {
    store: S,
    max_activated: usize,
    target_price_percent: u8,
}

impl<S: WatchStore> WatchlistManager<S> {
    pub fn new(store: S, max_activated: usize, target_price_percent: u8) -> Self {
        Self {
            store,
            max_activated,
            target_price_percent,
        }
    }

    /// Stage a search result as an anonymous TEMP entry. When the
    /// caller names no target price, default to a fixed fraction of the
    /// current price (90% unless configured otherwise).
    pub async fn add_temporary(&self, request: NewWatchEntry) -> Result<WatchlistEntry> {
        request.validate()?;

        let target_price = request.target_price.or_else(|| {
            Some(request.current_price * i64::from(self.target_price_percent) / 100)
        });

        let entry = WatchlistEntry::temporary(request, target_price);
        tracing::info!(entry_id = %entry.id, product = %entry.product_name, "staged temp watch entry");
        self.store.insert(entry).await
    }

    /// Convert every TEMP entry to ACTIVATED, bound to `email`. Safe to
    /// call twice: already-activated entries are skipped by the store's
    /// conditional transition, so a repeat call reports zero. Entries
    /// that would push the email past the activated ceiling are
    /// rejected with a capacity error and stay TEMP.
    pub async fn activate_all(&self, email: &str) -> Result<ActivationReport> {
        if !email.validate_email() {
            return Err(AppError::Validation(format!("invalid email address: {}", email)));
        }

        let temp_entries = self.store.list_temp().await?;
        let mut active = self.store.count_activated(email).await?;
        let mut report = ActivationReport {
            activated_count: 0,
            rejected: Vec::new(),
        };

        for entry in temp_entries {
            if active >= self.max_activated {
                tracing::warn!(entry_id = %entry.id, email, limit = self.max_activated, "activation rejected at capacity");
                report.rejected.push(RejectedActivation {
                    entry_id: entry.id,
                    error: AppError::Capacity {
                        email: email.to_string(),
                        limit: self.max_activated,
                    },
                });
                continue;
            }

            match self.store.activate(&entry.id, email).await {
                Ok(true) => {
                    active += 1;
                    report.activated_count += 1;
                }
                // Lost a race to a concurrent activation; nothing to count.
                Ok(false) => {}
                Err(error) => {
                    report.rejected.push(RejectedActivation {
                        entry_id: entry.id,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            email,
            activated = report.activated_count,
            rejected = report.rejected.len(),
            "watchlist activation finished"
        );
        Ok(report)
    }

    /// Remove an entry. TEMP entries are anonymous and removable by
    /// anyone; an ACTIVATED entry only by the email it is bound to —
    /// a mismatch is an authorization failure, never a silent no-op.
    pub async fn remove(&self, entry_id: &str, email: Option<&str>) -> Result<()> {
        let entry = self.store.get(entry_id).await?.ok_or_else(|| AppError::NotFound {
            resource: format!("watchlist entry {}", entry_id),
        })?;

        if entry.is_activated() {
            match email {
                Some(email) if entry.is_bound_to(email) => {}
                _ => {
                    return Err(AppError::Authorization(format!(
                        "entry {} is not owned by the given email",
                        entry_id
                    )));
                }
            }
        }

        self.store.delete(entry_id).await?;
        tracing::info!(entry_id, "removed watch entry");
        Ok(())
    }

    /// Anonymous staging area, shared until activation.
    pub async fn list_temporary(&self) -> Result<Vec<WatchlistEntry>> {
        self.store.list_temp().await
    }

    /// Entries bound to `email` only; one user never sees another's
    /// activated entries.
    pub async fn list_activated(&self, email: &str) -> Result<Vec<WatchlistEntry>> {
        self.store.list_activated(email).await
    }
}
