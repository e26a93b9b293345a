// Review hooks - post-mutation notifications fired by the review service
// Mirrors the entity hook pattern: one narrow trait, invoked after every committed review write

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::{ListingId, ReviewId};
use crate::error::AppResult;

/// Kind of review write that just committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOperation {
    Create,
    Update,
    Delete,
}

/// Context handed to hooks after a review write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewMutation {
    pub review_id: ReviewId,
    pub listing_id: ListingId,
    pub operation: ReviewOperation,
}

/// Implemented by anything that must react to a changed review set.
///
/// `after_mutation` runs inside the request that performed the write; an error
/// fails that request, although the review write itself stays committed.
#[async_trait]
pub trait ReviewMutationHook: Send + Sync {
    async fn after_mutation(&self, mutation: &ReviewMutation) -> AppResult<()>;

    /// Hook name for logs
    fn name(&self) -> &str;
}

/// Ordered set of hooks run after each review mutation
#[derive(Default, Clone)]
pub struct ReviewHookRegistry {
    hooks: Vec<Arc<dyn ReviewMutationHook>>,
}

impl ReviewHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn ReviewMutationHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub async fn notify(&self, mutation: &ReviewMutation) -> AppResult<()> {
        for hook in &self.hooks {
            tracing::debug!(
                hook = hook.name(),
                review_id = %mutation.review_id,
                listing_id = %mutation.listing_id,
                operation = ?mutation.operation,
                "running review hook"
            );
            hook.after_mutation(mutation).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<ReviewMutation>>,
    }

    #[async_trait]
    impl ReviewMutationHook for Recorder {
        async fn after_mutation(&self, mutation: &ReviewMutation) -> AppResult<()> {
            self.seen.lock().unwrap().push(mutation.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    struct Failing;

    #[async_trait]
    impl ReviewMutationHook for Failing {
        async fn after_mutation(&self, _mutation: &ReviewMutation) -> AppResult<()> {
            Err(AppError::StorageError("unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn mutation() -> ReviewMutation {
        ReviewMutation {
            review_id: ReviewId::new(1),
            listing_id: ListingId::new(2),
            operation: ReviewOperation::Create,
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_order_and_stop_on_error() {
        let first = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let last = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });

        let mut registry = ReviewHookRegistry::new();
        registry.register(first.clone());
        registry.register(Arc::new(Failing));
        registry.register(last.clone());
        assert_eq!(registry.len(), 3);

        let result = registry.notify(&mutation()).await;
        assert!(matches!(result, Err(AppError::StorageError(_))));
        assert_eq!(first.seen.lock().unwrap().len(), 1);
        assert!(last.seen.lock().unwrap().is_empty());
    }
}
