#[cfg(test)]
mod filter_test;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::snapshot::{same_handle, SnapshotList};
use crate::video_frame::VideoFrame;

lazy_static! {
    static ref FILTER_CHAIN_UNIQUE_ID: AtomicUsize = AtomicUsize::new(0);
    static ref FILTER_ATTACHMENT_UNIQUE_ID: AtomicUsize = AtomicUsize::new(0);
}

/// FilterVerdict tells the chain what to do with a frame after a filter ran.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterVerdict {
    /// Pass hands the (possibly modified) frame to the next filter.
    Pass,
    /// Drop ends the chain for this frame; no renderer sees it.
    Drop,
}

/// VideoFilter is a processing step attached to a video track.
///
/// process is called synchronously on whichever thread delivers frames. A
/// filter may modify the frame in place, replace it wholesale, or drop it.
/// Returning an error bypasses the filter: the frame continues down the
/// chain exactly as it was before the call.
pub trait VideoFilter {
    fn process(&self, frame: &mut VideoFrame) -> Result<FilterVerdict>;

    /// name is used in log output only
    fn name(&self) -> &str {
        "video-filter"
    }
}

#[derive(Clone)]
struct FilterEntry {
    id: usize,
    filter: Arc<dyn VideoFilter + Send + Sync>,
    internal: bool,
}

/// InternalFilterHandle is the removal capability for a filter inserted
/// through `add_internal`. Only the holder of the handle can detach it.
#[derive(Debug, PartialEq, Eq)]
pub struct InternalFilterHandle {
    chain_id: usize,
    id: usize,
}

/// ChainOutput is the result of running one frame through the chain.
#[derive(Debug)]
pub struct ChainOutput {
    /// None when a filter dropped the frame
    pub frame: Option<VideoFrame>,
    /// errors returned by filters that were bypassed
    pub faults: Vec<Error>,
}

/// FilterChain is the ordered sequence of filters a frame passes through
/// before reaching renderers. Order is attachment order.
pub struct FilterChain {
    id: usize,
    entries: SnapshotList<FilterEntry>,
    max_filters: usize,
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("id", &self.id)
            .field("len", &self.entries.len())
            .field("max_filters", &self.max_filters)
            .finish()
    }
}

impl FilterChain {
    pub(crate) fn new(max_filters: usize) -> Self {
        FilterChain {
            id: FILTER_CHAIN_UNIQUE_ID.fetch_add(1, Ordering::SeqCst),
            entries: SnapshotList::new(),
            max_filters,
        }
    }

    /// add appends an application filter to the end of the chain.
    pub fn add(&self, filter: Arc<dyn VideoFilter + Send + Sync>) -> Result<()> {
        self.insert(filter, false).map(|_| ())
    }

    /// add_internal appends an engine filter to the end of the chain. The
    /// returned handle is the only way to remove it again.
    pub fn add_internal(
        &self,
        filter: Arc<dyn VideoFilter + Send + Sync>,
    ) -> Result<InternalFilterHandle> {
        let id = self.insert(filter, true)?;
        Ok(InternalFilterHandle {
            chain_id: self.id,
            id,
        })
    }

    fn insert(&self, filter: Arc<dyn VideoFilter + Send + Sync>, internal: bool) -> Result<usize> {
        let name = filter.name().to_owned();
        let id = self.entries.update(|entries| {
            if entries.iter().any(|e| same_handle(&e.filter, &filter)) {
                return Err(Error::ErrFilterAlreadyAttached);
            }
            if entries.len() >= self.max_filters {
                return Err(Error::ErrFilterCapacityExceeded(self.max_filters));
            }

            let id = FILTER_ATTACHMENT_UNIQUE_ID.fetch_add(1, Ordering::SeqCst);
            entries.push(FilterEntry {
                id,
                filter,
                internal,
            });
            Ok(id)
        })?;

        log::debug!(
            "filter chain {}: attached {} filter {} ({})",
            self.id,
            if internal { "internal" } else { "application" },
            id,
            name
        );
        Ok(id)
    }

    /// remove detaches an application filter. Internal filters are refused
    /// with ErrInternalFilter.
    pub fn remove(&self, filter: &Arc<dyn VideoFilter + Send + Sync>) -> Result<()> {
        let id = self.entries.update(|entries| {
            let index = entries
                .iter()
                .position(|e| same_handle(&e.filter, filter))
                .ok_or(Error::ErrFilterNotFound)?;
            if entries[index].internal {
                return Err(Error::ErrInternalFilter);
            }
            Ok(entries.remove(index).id)
        })?;

        log::debug!("filter chain {}: detached filter {}", self.id, id);
        Ok(())
    }

    /// remove_internal detaches the internal filter the handle was issued for.
    pub fn remove_internal(&self, handle: InternalFilterHandle) -> Result<()> {
        if handle.chain_id != self.id {
            return Err(Error::ErrFilterNotFound);
        }

        self.entries.update(|entries| {
            let index = entries
                .iter()
                .position(|e| e.id == handle.id)
                .ok_or(Error::ErrFilterNotFound)?;
            entries.remove(index);
            Ok(())
        })?;

        log::debug!(
            "filter chain {}: detached internal filter {}",
            self.id,
            handle.id
        );
        Ok(())
    }

    pub fn contains(&self, filter: &Arc<dyn VideoFilter + Send + Sync>) -> bool {
        self.entries
            .snapshot()
            .iter()
            .any(|e| same_handle(&e.filter, filter))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// process runs the frame through one snapshot of the chain. Filters
    /// attached or detached while the frame is in flight take effect from
    /// the next frame on.
    pub fn process(&self, mut frame: VideoFrame) -> ChainOutput {
        let entries = self.entries.snapshot();
        let mut faults = vec![];

        for entry in entries.iter() {
            let before = frame.clone();
            match entry.filter.process(&mut frame) {
                Ok(FilterVerdict::Pass) => {}
                Ok(FilterVerdict::Drop) => {
                    log::trace!(
                        "filter chain {}: frame {} dropped by filter {} ({})",
                        self.id,
                        before.timestamp_us,
                        entry.id,
                        entry.filter.name()
                    );
                    return ChainOutput {
                        frame: None,
                        faults,
                    };
                }
                Err(err) => {
                    log::warn!(
                        "filter chain {}: filter {} ({}) failed, bypassing it: {}",
                        self.id,
                        entry.id,
                        entry.filter.name(),
                        err
                    );
                    frame = before;
                    faults.push(err);
                }
            }
        }

        ChainOutput {
            frame: Some(frame),
            faults,
        }
    }

    /// clear detaches every filter, internal ones included.
    pub(crate) fn clear(&self) -> usize {
        self.entries.take().len()
    }
}
