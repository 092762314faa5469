//! Clear private data on request

use std::sync::Arc;

use crate::category::DataCategory;
use crate::clearable::Clearable;
use crate::error::ClearError;
use crate::Result;

#[derive(Debug)]
pub struct ClearFailure {
    pub category: DataCategory,
    pub label: String,
    pub error: ClearError,
}

/// Outcome of one clear request. Failures are reported, never raised.
#[derive(Debug, Default)]
pub struct ClearReport {
    /// Labels of the clearables that succeeded
    pub cleared: Vec<String>,
    pub failures: Vec<ClearFailure>,
}

impl ClearReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Default, Clone)]
pub struct PrivateDataClearer {
    clearables: Vec<Arc<dyn Clearable>>,
}

impl PrivateDataClearer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, clearable: impl Clearable + 'static) {
        self.clearables.push(Arc::new(clearable));
    }

    pub fn with(mut self, clearable: impl Clearable + 'static) -> Self {
        self.register(clearable);
        self
    }

    pub fn len(&self) -> usize {
        self.clearables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clearables.is_empty()
    }

    /// Run every clearable whose category is in `categories`. A failed
    /// clear is retried once; a second failure is logged and reported and
    /// the remaining clearables still run.
    pub async fn clear(&self, categories: &[DataCategory]) -> ClearReport {
        let mut report = ClearReport::default();

        for clearable in self
            .clearables
            .iter()
            .filter(|c| categories.contains(&c.category()))
        {
            let label = clearable.label().to_string();
            match Self::clear_with_retry(Arc::clone(clearable)).await {
                Ok(()) => {
                    tracing::info!(category = %clearable.category(), %label, "Cleared private data");
                    report.cleared.push(label);
                }
                Err(error) => {
                    tracing::error!(
                        category = %clearable.category(),
                        %label,
                        %error,
                        "Failed to clear private data"
                    );
                    report.failures.push(ClearFailure {
                        category: clearable.category(),
                        label,
                        error,
                    });
                }
            }
        }

        report
    }

    async fn clear_with_retry(clearable: Arc<dyn Clearable>) -> Result<()> {
        match Self::clear_once(Arc::clone(&clearable)).await {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::warn!(label = clearable.label(), %error, "Clear failed; retrying");
                Self::clear_once(clearable).await
            }
        }
    }

    async fn clear_once(clearable: Arc<dyn Clearable>) -> Result<()> {
        tokio::task::spawn_blocking(move || clearable.clear())
            .await
            .map_err(|e| ClearError::Task(e.to_string()))?
    }
}
