
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::snapshot::{same_handle, SnapshotList};
use crate::video_frame::VideoFrame;

/// VideoRenderer consumes the frames that survive a track's filter chain.
///
/// on_frame must return promptly; it runs on the frame-delivery thread.
pub trait VideoRenderer {
    fn on_frame(&self, frame: &VideoFrame) -> Result<()>;
}

/// RendererSet fans each frame out to every attached renderer. Delivery
/// order among renderers is unspecified.
pub struct RendererSet {
    renderers: SnapshotList<Arc<dyn VideoRenderer + Send + Sync>>,
    max_renderers: usize,
}

impl fmt::Debug for RendererSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererSet")
            .field("len", &self.renderers.len())
            .field("max_renderers", &self.max_renderers)
            .finish()
    }
}

impl RendererSet {
    pub(crate) fn new(max_renderers: usize) -> Self {
        RendererSet {
            renderers: SnapshotList::new(),
            max_renderers,
        }
    }

    pub fn add(&self, renderer: Arc<dyn VideoRenderer + Send + Sync>) -> Result<()> {
        self.renderers.update(|renderers| {
            if renderers.iter().any(|r| same_handle(r, &renderer)) {
                return Err(Error::ErrRendererAlreadyAttached);
            }
            if renderers.len() >= self.max_renderers {
                return Err(Error::ErrRendererCapacityExceeded(self.max_renderers));
            }
            renderers.push(renderer);
            Ok(())
        })
    }

    pub fn remove(&self, renderer: &Arc<dyn VideoRenderer + Send + Sync>) -> Result<()> {
        self.renderers.update(|renderers| {
            let index = renderers
                .iter()
                .position(|r| same_handle(r, renderer))
                .ok_or(Error::ErrRendererNotFound)?;
            renderers.swap_remove(index);
            Ok(())
        })
    }

    pub fn contains(&self, renderer: &Arc<dyn VideoRenderer + Send + Sync>) -> bool {
        self.renderers
            .snapshot()
            .iter()
            .any(|r| same_handle(r, renderer))
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// render delivers the frame to every renderer, even when some of them
    /// fail. Failures are logged and otherwise ignored; the return value is
    /// how many renderers accepted the frame.
    pub fn render(&self, frame: &VideoFrame) -> usize {
        let renderers = self.renderers.snapshot();
        let mut n = 0;

        for renderer in renderers.iter() {
            match renderer.on_frame(frame) {
                Ok(()) => n += 1,
                Err(err) => {
                    log::warn!("renderer failed on frame {}: {}", frame.timestamp_us, err);
                }
            }
        }

        n
    }

    pub(crate) fn clear(&self) -> usize {
        self.renderers.take().len()
    }
}
