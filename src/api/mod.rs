#[cfg(test)]
mod api_test;

pub mod setting_engine;

use std::sync::Arc;

use setting_engine::*;

use crate::track::track_local::LocalVideoTrack;
use crate::track::track_remote::{RemoteVideoTrack, VideoTrackInfo};

/// API is the session-side factory for video tracks. Every track it creates
/// shares the same SettingEngine.
#[derive(Debug)]
pub struct API {
    pub(crate) setting_engine: Arc<SettingEngine>,
}

impl API {
    /// new_local_video_track creates a disabled, stopped track for a local
    /// capture source.
    pub fn new_local_video_track(&self, id: &str) -> Arc<LocalVideoTrack> {
        let track = LocalVideoTrack::new(id, Arc::clone(&self.setting_engine));
        log::debug!("created local video track {}", id);
        Arc::new(track)
    }

    /// new_remote_video_track creates a track for a stream received from
    /// the network. `info` may be None when the transport publishes it later
    /// through set_track_info.
    pub fn new_remote_video_track(
        &self,
        id: &str,
        info: Option<VideoTrackInfo>,
    ) -> Arc<RemoteVideoTrack> {
        let track = RemoteVideoTrack::new(id, info, &self.setting_engine);
        log::debug!("created remote video track {}", id);
        Arc::new(track)
    }
}

#[derive(Default)]
pub struct APIBuilder {
    setting_engine: Option<Arc<SettingEngine>>,
}

impl APIBuilder {
    pub fn new() -> Self {
        APIBuilder::default()
    }

    pub fn build(mut self) -> API {
        API {
            setting_engine: if let Some(setting_engine) = self.setting_engine.take() {
                setting_engine
            } else {
                Arc::new(SettingEngine::default())
            },
        }
    }

    /// with_setting_engine allows providing a SettingEngine to the API.
    /// Settings should not be changed after passing the engine to an API.
    pub fn with_setting_engine(mut self, setting_engine: SettingEngine) -> Self {
        self.setting_engine = Some(Arc::new(setting_engine));
        self
    }
}
