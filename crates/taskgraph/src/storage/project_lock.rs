//! Per-project serialization of graph mutations.
//!
//! Link insertion reads the whole link set of a project, runs the cycle
//! check and then writes. Two such sequences interleaving on one project can
//! each pass the check and together close a cycle, so every mutation of a
//! project runs while holding that project's lock.
//!
//! Locks are in-process only. They do not coordinate separate processes
//! sharing one store.

use crate::domain::ProjectId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of one mutex per project, created on first use.
///
/// # Examples
///
/// ```
/// use taskgraph::storage::ProjectLocks;
///
/// let locks = ProjectLocks::new();
/// let lock = locks.for_project(7);
/// let _guard = ProjectLocks::acquire(&lock);
/// // critical section for project 7
/// ```
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<ProjectId, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the lock of a project. Equal projects share one mutex.
    pub fn for_project(&self, project_id: ProjectId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(project_id).or_default())
    }

    /// Block until the project lock is held.
    ///
    /// The mutex guards no data, so a poisoned lock is still a valid lock.
    pub fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of projects that have had a lock created
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_project_shares_lock() {
        let locks = ProjectLocks::new();
        let a = locks.for_project(1);
        let b = locks.for_project(1);
        let c = locks.for_project(2);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_lock_excludes_concurrent_holders() {
        let locks = ProjectLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let lock = locks.for_project(42);
                    let _guard = ProjectLocks::acquire(&lock);
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
