use std::sync::Arc;

use arc_swap::ArcSwap;
use util::sync::Mutex;

use crate::error::Result;

/// SnapshotList is a copy-on-write list. Readers load an immutable snapshot
/// without blocking; writers serialize on `write_lock`, apply their change to
/// a private copy and publish it in one store.
pub(crate) struct SnapshotList<E> {
    entries: ArcSwap<Vec<E>>,
    write_lock: Mutex<()>,
}

impl<E> Default for SnapshotList<E> {
    fn default() -> Self {
        SnapshotList {
            entries: ArcSwap::from_pointee(vec![]),
            write_lock: Mutex::new(()),
        }
    }
}

impl<E: Clone> SnapshotList<E> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// snapshot returns the list as of the most recent completed update.
    pub(crate) fn snapshot(&self) -> Arc<Vec<E>> {
        self.entries.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    /// update runs `f` against a copy of the current list. The copy is
    /// published only when `f` succeeds, so a failed update leaves no trace.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Vec<E>) -> Result<R>) -> Result<R> {
        let _guard = self.write_lock.lock();
        let mut next = Vec::clone(&self.entries.load());
        let r = f(&mut next)?;
        self.entries.store(Arc::new(next));
        Ok(r)
    }

    /// take empties the list and returns what it held.
    pub(crate) fn take(&self) -> Arc<Vec<E>> {
        let _guard = self.write_lock.lock();
        self.entries.swap(Arc::new(vec![]))
    }
}

/// same_handle compares the data pointers of two shared handles, ignoring
/// trait object metadata.
pub(crate) fn same_handle<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}
