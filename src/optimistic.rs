use std::fmt::Display;
use std::future::Future;

use tokio::sync::Mutex;
use tracing::warn;

/// A local state change applied before its backend call and undone if the
/// call fails.
///
/// No deduplication or debouncing: two overlapping mutations on the same
/// state each apply and, on failure, each revert their own change.
pub struct OptimisticMutation<A, R> {
    apply: A,
    revert: R,
}

impl<A, R> OptimisticMutation<A, R> {
    pub fn new(apply: A, revert: R) -> Self {
        Self { apply, revert }
    }
}

impl<A: Clone> OptimisticMutation<A, A> {
    /// For patches that undo themselves when applied twice, like a toggle.
    pub fn involution(patch: A) -> Self {
        Self {
            apply: patch.clone(),
            revert: patch,
        }
    }
}

impl<A, R> OptimisticMutation<A, R> {
    pub async fn run<S, T, E, Fut>(self, state: &Mutex<S>, request: Fut) -> Result<T, E>
    where
        A: FnOnce(&mut S),
        R: FnOnce(&mut S),
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        (self.apply)(&mut *state.lock().await);
        match request.await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, "request failed, rolling back optimistic update");
                (self.revert)(&mut *state.lock().await);
                Err(err)
            }
        }
    }
}
