use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future;
use tokio::sync::Semaphore;

/// Errors surfaced by [`ResourcePool::rent`] and friends.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has been shut down; no further handles will be granted.
    #[error("resource pool is shut down")]
    Closed,

    /// No handle became available before the caller's wait deadline.
    #[error("resource pool exhausted: timed out waiting for a free handle")]
    Exhausted,
}

/// A fixed-capacity pool of reusable handles with async rent/release.
///
/// All handles are pre-built and queued at construction; capacity never
/// changes afterwards.  `rent` suspends the calling task (never an OS
/// thread) until a handle is free and hands out a [`Lease`] that returns
/// the handle on drop.  The idle queue is the only point of
/// synchronization: renters dequeue, releasers enqueue, and each handle is
/// owned by at most one lease at a time.
///
/// Waiters are served in FIFO order as handles free up ("first available
/// handle, first served").  The wait queue itself is unbounded: under
/// sustained overload callers see growing latency, not rejections.  Callers
/// that need bounded waiting use [`ResourcePool::rent_timeout`].
pub struct ResourcePool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for ResourcePool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<T> {
    /// Idle handles available for rent.
    idle: Mutex<VecDeque<T>>,
    /// One permit per idle handle; closed on shutdown so waiters fail fast.
    permits: Semaphore,
    /// Set under the `idle` lock during shutdown; leases returned afterwards
    /// drop their handle instead of requeuing it.
    closed: AtomicBool,
    capacity: usize,
}

impl<T> ResourcePool<T> {
    /// Build a pool over a fixed set of pre-built handles.
    pub fn new(handles: Vec<T>) -> Self {
        let capacity = handles.len();
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(handles.into()),
                permits: Semaphore::new(capacity),
                closed: AtomicBool::new(false),
                capacity,
            }),
        }
    }

    /// Rent exclusive ownership of one handle, suspending until one is free.
    ///
    /// Fails with [`PoolError::Closed`] once the pool is shut down; this
    /// covers rents issued afterwards as well as rents already waiting.
    /// Cancelling the returned future before it resolves never loses a
    /// handle: the permit acquisition is cancel-safe and the dequeue only
    /// happens after it.
    pub async fn rent(&self) -> Result<Lease<T>, PoolError> {
        let permit = self
            .inner
            .permits
            .acquire()
            .await
            .map_err(|_| PoolError::Closed)?;
        // The permit is not returned on release; the lease adds a fresh one
        // after requeuing its handle.
        permit.forget();

        let handle = {
            let mut idle = self.inner.idle.lock().expect("pool mutex poisoned");
            idle.pop_front()
        };
        match handle {
            Some(handle) => Ok(Lease {
                handle: Some(handle),
                pool: Arc::clone(&self.inner),
            }),
            // A shutdown drained the queue between our acquire and dequeue.
            None => Err(PoolError::Closed),
        }
    }

    /// Like [`ResourcePool::rent`], but gives up after `wait` and surfaces
    /// [`PoolError::Exhausted`].  A timed-out rent never holds a handle.
    pub async fn rent_timeout(&self, wait: Duration) -> Result<Lease<T>, PoolError> {
        match tokio::time::timeout(wait, self.rent()).await {
            Ok(result) => result,
            Err(_) => Err(PoolError::Exhausted),
        }
    }

    /// Stop granting handles, drain the idle queue, and close every drained
    /// handle concurrently, waiting for all of them.
    ///
    /// Leases still outstanding are not revoked; when they are dropped their
    /// handles are discarded rather than requeued.  Callers are expected to
    /// quiesce traffic before shutting down.
    pub async fn shutdown<C, Fut>(&self, close: C)
    where
        C: Fn(T) -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        self.inner.permits.close();
        let drained: Vec<T> = {
            let mut idle = self.inner.idle.lock().expect("pool mutex poisoned");
            self.inner.closed.store(true, Ordering::Release);
            idle.drain(..).collect()
        };
        if drained.is_empty() {
            return;
        }
        let count = drained.len();
        future::join_all(drained.into_iter().map(close)).await;
        tracing::debug!(handles = count, "resource pool drained");
    }

    /// Fixed capacity the pool was built with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Handles currently idle in the queue.
    pub fn available(&self) -> usize {
        self.inner.idle.lock().expect("pool mutex poisoned").len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

/// Exclusive, short-lived ownership of one pooled handle.
///
/// Derefs to the handle; dropping the lease returns the handle to the pool.
/// Release-on-drop makes double release structurally impossible and
/// guarantees the handle comes back on every exit path, error or not.
pub struct Lease<T> {
    handle: Option<T>,
    pool: Arc<PoolInner<T>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Lease<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease").field("handle", &self.handle).finish()
    }
}

impl<T> Deref for Lease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.handle.as_ref().expect("lease already released")
    }
}

impl<T> DerefMut for Lease<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.handle.as_mut().expect("lease already released")
    }
}

impl<T> Drop for Lease<T> {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // Checking `closed` under the idle lock keeps this race-free against
        // a concurrent shutdown drain.
        if let Ok(mut idle) = self.pool.idle.lock() {
            if self.pool.closed.load(Ordering::Acquire) {
                // Pool is gone; close the handle by dropping it instead of
                // parking it in a queue nobody will drain again.
                drop(idle);
                drop(handle);
                return;
            }
            idle.push_back(handle);
            drop(idle);
            self.pool.permits.add_permits(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rent_and_release_restores_accounting() {
        let pool = ResourcePool::new(vec![1u32, 2, 3]);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.available(), 3);

        let a = pool.rent().await.unwrap();
        let b = pool.rent().await.unwrap();
        assert_eq!(pool.available(), 1);
        assert_eq!(*a + *b, 3); // FIFO: first two handles out

        drop(a);
        drop(b);
        assert_eq!(pool.available(), 3);
    }

    #[tokio::test]
    async fn rent_after_shutdown_fails() {
        let pool = ResourcePool::new(vec![(), ()]);
        pool.shutdown(|_| async {}).await;

        assert!(pool.is_closed());
        assert_eq!(pool.rent().await.unwrap_err(), PoolError::Closed);
    }

    #[tokio::test]
    async fn rent_timeout_on_empty_pool_is_exhausted() {
        let pool = ResourcePool::new(vec![()]);
        let _held = pool.rent().await.unwrap();

        let err = pool
            .rent_timeout(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err, PoolError::Exhausted);
        // The timed-out waiter must not have consumed the handle.
        drop(_held);
        assert_eq!(pool.available(), 1);
    }

    #[tokio::test]
    async fn lease_returned_after_shutdown_is_discarded() {
        let pool = ResourcePool::new(vec![7u32]);
        let lease = pool.rent().await.unwrap();

        pool.shutdown(|_| async {}).await;
        drop(lease);

        // Discarded, not requeued.
        assert_eq!(pool.available(), 0);
    }
}
