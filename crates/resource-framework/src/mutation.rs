//! # Mutations
//!
//! A [`Mutation<I>`] wraps one write. On success it invalidates the whole
//! resource family in the cache and sends a success notification; on failure
//! it leaves the cache alone and sends exactly one error notification.
//!
//! Each mutation carries an in-flight guard: while one submission is running,
//! another is a no-op. [`Mutation::mutate`] returns `false` and
//! [`Mutation::mutate_async`] returns `Ok(None)` for the skipped submission.

use crate::cache::{FetchFuture, QueryCache, QueryKey};
use crate::client::Operation;
use crate::envelope::extract_message;
use crate::error::ResourceError;
use crate::notify::{Notification, Notifier};
use crate::query::QueryClient;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

type Runner<I> = Arc<dyn Fn(I) -> FetchFuture + Send + Sync>;

/// Titles and fallback texts for the notifications of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationMessages {
    pub success_title: String,
    pub success_fallback: String,
    pub error_title: String,
    pub error_fallback: String,
}

impl MutationMessages {
    /// Standard texts for a write on `label` (e.g. "connector").
    pub fn for_operation(label: &str, operation: Operation) -> Self {
        let done = match operation {
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
            Operation::ChangeStatus => "status changed",
            Operation::List | Operation::Get | Operation::Custom(_) | Operation::Write(_) => "saved",
        };
        let subject = match operation {
            Operation::Custom(name) | Operation::Write(name) => format!("{} {name}", capitalize(label)),
            _ => capitalize(label),
        };
        Self {
            success_title: "Success".to_string(),
            success_fallback: format!("{subject} {done} successfully"),
            error_title: "Error".to_string(),
            error_fallback: operation.fallback_message(label),
        }
    }

    fn success(&self, body: &Value) -> Notification {
        let message = extract_message(body).unwrap_or_else(|| self.success_fallback.clone());
        Notification::success(&self.success_title, message)
    }

    fn error(&self, err: &ResourceError) -> Notification {
        let message = err.user_message();
        let message = if message.trim().is_empty() {
            self.error_fallback.clone()
        } else {
            message
        };
        Notification::error(&self.error_title, message)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A guarded write with cache and notification side effects.
pub struct Mutation<I> {
    family: &'static str,
    run: Runner<I>,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    messages: MutationMessages,
    pending: Arc<AtomicBool>,
}

impl<I> Clone for Mutation<I> {
    fn clone(&self) -> Self {
        Self {
            family: self.family,
            run: self.run.clone(),
            cache: self.cache.clone(),
            notifier: self.notifier.clone(),
            messages: self.messages.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<I: Send + 'static> Mutation<I> {
    pub fn new<F>(client: &QueryClient, family: &'static str, messages: MutationMessages, run: F) -> Self
    where
        F: Fn(I) -> FetchFuture + Send + Sync + 'static,
    {
        Self {
            family,
            run: Arc::new(run),
            cache: client.cache().clone(),
            notifier: client.notifier().clone(),
            messages,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Fire-and-forget submission. Returns `false` if one is already running.
    pub fn mutate(&self, input: I) -> bool {
        let Some(guard) = self.begin() else {
            debug!(family = self.family, "Mutation already pending, submission ignored");
            return false;
        };
        let this = self.clone();
        tokio::spawn(async move {
            let _ = this.execute(input, guard).await;
        });
        true
    }

    /// Awaitable submission. `Ok(None)` means it was skipped as a duplicate.
    pub async fn mutate_async(&self, input: I) -> Result<Option<Value>, ResourceError> {
        let Some(guard) = self.begin() else {
            debug!(family = self.family, "Mutation already pending, submission ignored");
            return Ok(None);
        };
        self.execute(input, guard).await.map(Some)
    }

    fn begin(&self) -> Option<PendingGuard> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PendingGuard(self.pending.clone()))
    }

    async fn execute(&self, input: I, _guard: PendingGuard) -> Result<Value, ResourceError> {
        match (self.run)(input).await {
            Ok(body) => {
                match self.cache.invalidate(QueryKey::family(self.family)).await {
                    Ok(removed) => info!(family = self.family, removed, "Mutation succeeded"),
                    Err(e) => warn!(family = self.family, error = %e, "Cache invalidation failed"),
                }
                self.notifier.notify(self.messages.success(&body));
                Ok(body)
            }
            Err(err) => {
                warn!(family = self.family, error = %err, "Mutation failed");
                self.notifier.notify(self.messages.error(&err));
                Err(err)
            }
        }
    }
}

/// Clears the in-flight flag when the submission finishes, however it ends.
struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
