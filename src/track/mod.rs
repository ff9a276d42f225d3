pub mod track_local;
pub mod track_remote;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use portable_atomic::AtomicBool;

use crate::api::setting_engine::SettingEngine;
use crate::error::{Error, Result};
use crate::filter::{ChainOutput, FilterChain, InternalFilterHandle, VideoFilter};
use crate::renderer::{RendererSet, VideoRenderer};
use crate::video_frame::VideoFrame;

lazy_static! {
    static ref VIDEO_TRACK_UNIQUE_ID: AtomicUsize = AtomicUsize::new(0);
}

pub(crate) fn next_track_id() -> usize {
    VIDEO_TRACK_UNIQUE_ID.fetch_add(1, Ordering::SeqCst)
}

/// VideoPipeline is the frame path every video track owns: a filter chain
/// followed by a renderer set.
pub struct VideoPipeline {
    filters: FilterChain,
    renderers: RendererSet,
    closed: AtomicBool,
}

impl fmt::Debug for VideoPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoPipeline")
            .field("filters", &self.filters)
            .field("renderers", &self.renderers)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl VideoPipeline {
    pub(crate) fn new(setting_engine: &SettingEngine) -> Self {
        VideoPipeline {
            filters: FilterChain::new(setting_engine.get_max_video_filters()),
            renderers: RendererSet::new(setting_engine.get_max_renderers()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn renderers(&self) -> &RendererSet {
        &self.renderers
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ErrTrackClosed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn add_filter(&self, filter: Arc<dyn VideoFilter + Send + Sync>) -> Result<()> {
        self.check_open()?;
        self.filters.add(Arc::clone(&filter))?;

        // close may have cleared the chain between the check and the insert
        if self.is_closed() {
            let _ = self.filters.remove(&filter);
            return Err(Error::ErrTrackClosed);
        }
        Ok(())
    }

    pub(crate) fn add_internal_filter(
        &self,
        filter: Arc<dyn VideoFilter + Send + Sync>,
    ) -> Result<InternalFilterHandle> {
        self.check_open()?;
        let handle = self.filters.add_internal(filter)?;

        if self.is_closed() {
            let _ = self.filters.remove_internal(handle);
            return Err(Error::ErrTrackClosed);
        }
        Ok(handle)
    }

    pub(crate) fn add_renderer(&self, renderer: Arc<dyn VideoRenderer + Send + Sync>) -> Result<()> {
        self.check_open()?;
        self.renderers.add(Arc::clone(&renderer))?;

        if self.is_closed() {
            let _ = self.renderers.remove(&renderer);
            return Err(Error::ErrTrackClosed);
        }
        Ok(())
    }

    /// dispatch runs one frame through the filter chain and hands the
    /// survivor to every renderer. Returns the number of renderers that
    /// accepted the frame; 0 when a filter dropped it. A failing filter is
    /// bypassed and a failing renderer is skipped; both are only logged.
    pub(crate) fn dispatch(&self, frame: VideoFrame) -> usize {
        let ChainOutput { frame, faults } = self.filters.process(frame);
        if !faults.is_empty() {
            log::debug!("{} filters bypassed for this frame", faults.len());
        }

        match frame {
            Some(frame) => {
                log::trace!(
                    "rendering frame {} ({}x{})",
                    frame.timestamp_us,
                    frame.width,
                    frame.height
                );
                self.renderers.render(&frame)
            }
            None => 0,
        }
    }

    /// close detaches everything and refuses later attachments. Returns
    /// false when already closed.
    pub(crate) fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        let filters = self.filters.clear();
        let renderers = self.renderers.clear();
        log::debug!(
            "video pipeline closed, detached {} filters and {} renderers",
            filters,
            renderers
        );
        true
    }
}

/// VideoTrack is the part of the track contract shared by local and remote
/// video tracks: attaching filters and renderers to the track's pipeline.
pub trait VideoTrack {
    /// tid is the process-unique id of this track object
    fn tid(&self) -> usize;

    /// id is the application supplied track id
    fn id(&self) -> &str;

    fn pipeline(&self) -> &VideoPipeline;

    /// add_video_filter appends an application filter to the end of the chain.
    fn add_video_filter(&self, filter: Arc<dyn VideoFilter + Send + Sync>) -> Result<()> {
        self.pipeline().add_filter(filter)
    }

    /// add_internal_video_filter appends an engine filter. Keep the handle:
    /// it is the only way to detach the filter again.
    fn add_internal_video_filter(
        &self,
        filter: Arc<dyn VideoFilter + Send + Sync>,
    ) -> Result<InternalFilterHandle> {
        self.pipeline().add_internal_filter(filter)
    }

    fn remove_video_filter(&self, filter: &Arc<dyn VideoFilter + Send + Sync>) -> Result<()> {
        self.pipeline().filters().remove(filter)
    }

    fn remove_internal_video_filter(&self, handle: InternalFilterHandle) -> Result<()> {
        self.pipeline().filters().remove_internal(handle)
    }

    fn add_renderer(&self, renderer: Arc<dyn VideoRenderer + Send + Sync>) -> Result<()> {
        self.pipeline().add_renderer(renderer)
    }

    fn remove_renderer(&self, renderer: &Arc<dyn VideoRenderer + Send + Sync>) -> Result<()> {
        self.pipeline().renderers().remove(renderer)
    }

    fn is_closed(&self) -> bool {
        self.pipeline().is_closed()
    }
}
