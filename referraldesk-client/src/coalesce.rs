//! Coalescing of identical in-flight reads.
//!
//! Several screens refresh the profile independently when they appear. When
//! those refreshes overlap, callers join the request already on the wire
//! instead of issuing another one.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::trace;

use crate::error::ApiError;

type SharedCall<T> = Shared<BoxFuture<'static, Result<T, ApiError>>>;

/// Table of in-flight calls keyed by request identity.
pub struct Coalescer<T>
where
    T: Clone,
{
    in_flight: Arc<Mutex<HashMap<String, SharedCall<T>>>>,
}

impl<T: Clone> Clone for Coalescer<T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T: Clone> Default for Coalescer<T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> std::fmt::Debug for Coalescer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pending = self.in_flight.lock().map_or(0, |map| map.len());
        f.debug_struct("Coalescer").field("pending", &pending).finish()
    }
}

impl<T> Coalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the call produced by `make`, or joins an identical call already
    /// in flight under `key`. The entry is dropped once the call settles, so
    /// a later caller always starts a fresh request.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> Result<T, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let call = {
            let mut in_flight = self.table();
            if let Some(existing) = in_flight.get(key) {
                trace!(key, "joining in-flight request");
                existing.clone()
            } else {
                let call = make().boxed().shared();
                in_flight.insert(key.to_owned(), call.clone());
                call
            }
        };

        let result = call.clone().await;

        let mut in_flight = self.table();
        if in_flight
            .get(key)
            .is_some_and(|current| current.ptr_eq(&call))
        {
            in_flight.remove(key);
        }
        result
    }

    // Entries are plain handles; a poisoned lock is still usable.
    fn table(&self) -> MutexGuard<'_, HashMap<String, SharedCall<T>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of distinct calls currently in flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.table().len()
    }
}
