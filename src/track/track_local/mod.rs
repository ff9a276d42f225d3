
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use portable_atomic::AtomicBool;
use smol_str::SmolStr;
use tokio::sync::watch;
use util::sync::Mutex;

use super::{next_track_id, VideoPipeline, VideoTrack};
use crate::api::setting_engine::SettingEngine;
use crate::encoder::{SimulcastStreamConfig, VideoEncoderConfiguration};
use crate::error::{Error, Result};
use crate::state::{LocalVideoStreamError, LocalVideoStreamState, StateChange, StateMachine};
use crate::stats::{LocalVideoTrackStats, StatsCell};
use crate::video_frame::VideoFrame;

#[derive(Debug, Default)]
struct EncoderSettings {
    configuration: VideoEncoderConfiguration,
    simulcast: Option<SimulcastStreamConfig>,
}

/// LocalVideoTrack is a video track fed by a local capture source. Captured
/// frames go through the filter chain to the renderers; the encoder and
/// transport read the configuration stored here and report state and
/// statistics back into it.
///
/// A new track is disabled and stopped.
pub struct LocalVideoTrack {
    tid: usize,
    id: SmolStr,
    setting_engine: Arc<SettingEngine>,
    pipeline: VideoPipeline,
    enabled: AtomicBool,
    encoder: Mutex<EncoderSettings>,
    state: StateMachine<LocalVideoStreamState>,
    stats: StatsCell<LocalVideoTrackStats>,
}

impl fmt::Debug for LocalVideoTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalVideoTrack")
            .field("tid", &self.tid)
            .field("id", &self.id)
            .field("enabled", &self.is_enabled())
            .field("state", &self.get_state())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl LocalVideoTrack {
    pub(crate) fn new(id: &str, setting_engine: Arc<SettingEngine>) -> Self {
        let initial = LocalVideoTrackStats {
            ssrc_major_stream: rand::random::<u32>(),
            ssrc_minor_stream: rand::random::<u32>(),
            ..Default::default()
        };

        LocalVideoTrack {
            tid: next_track_id(),
            id: SmolStr::new(id),
            pipeline: VideoPipeline::new(&setting_engine),
            setting_engine,
            enabled: AtomicBool::new(false),
            encoder: Mutex::new(EncoderSettings::default()),
            state: StateMachine::new(),
            stats: StatsCell::with_initial(initial),
        }
    }

    /// set_enabled starts or stops the track. Disabling stops frame
    /// production and moves the state to Stopped; filters and renderers stay
    /// attached. Enabling moves the state to Starting, after which the
    /// transport reports Encoding.
    pub fn set_enabled(&self, enabled: bool) {
        if enabled {
            if self.pipeline.is_closed() {
                log::warn!("local video track {}: set_enabled on closed track", self.id);
                return;
            }
            if self.enabled.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Err(err) = self
                .state
                .transition_if(LocalVideoStreamState::Starting, LocalVideoStreamError::Ok, |_| {
                    self.check_enabled()
                })
            {
                log::warn!("local video track {}: cannot start: {}", self.id, err);
            }
        } else {
            if !self.enabled.swap(false, Ordering::SeqCst) {
                return;
            }
            self.state.stop(LocalVideoStreamError::Ok);
        }
        log::debug!("local video track {}: enabled = {}", self.id, enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn check_enabled(&self) -> Result<()> {
        if self.pipeline.is_closed() {
            Err(Error::ErrTrackClosed)
        } else if !self.is_enabled() {
            Err(Error::ErrTrackDisabled)
        } else {
            Ok(())
        }
    }

    /// set_video_encoder_configuration stores the ceiling the encoder may
    /// operate at. A configuration the active simulcast stream no longer
    /// fits under is rejected.
    pub fn set_video_encoder_configuration(&self, config: VideoEncoderConfiguration) -> Result<()> {
        config.validate(&self.setting_engine.get_encoder_limits())?;

        let mut encoder = self.encoder.lock();
        if let Some(simulcast) = &encoder.simulcast {
            simulcast.validate(&config)?;
        }
        encoder.configuration = config;
        drop(encoder);

        log::debug!(
            "local video track {}: encoder {} {} @ {} fps",
            self.id,
            config.codec_type,
            config.dimensions,
            config.frame_rate
        );
        Ok(())
    }

    /// encoder_configuration is what the encoder pulls when negotiating.
    pub fn encoder_configuration(&self) -> VideoEncoderConfiguration {
        self.encoder.lock().configuration
    }

    /// enable_simulcast_stream turns the low-quality stream on or off. The
    /// config is only checked when enabling.
    pub fn enable_simulcast_stream(&self, enabled: bool, config: SimulcastStreamConfig) -> Result<()> {
        let mut encoder = self.encoder.lock();
        if enabled {
            config.validate(&encoder.configuration)?;
            encoder.simulcast = Some(config);
        } else {
            encoder.simulcast = None;
        }
        drop(encoder);

        log::debug!(
            "local video track {}: simulcast stream {}",
            self.id,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// simulcast_stream_config returns the low-quality stream settings, None
    /// while simulcast is off.
    pub fn simulcast_stream_config(&self) -> Option<SimulcastStreamConfig> {
        self.encoder.lock().simulcast
    }

    pub fn get_state(&self) -> LocalVideoStreamState {
        self.state.state()
    }

    /// state_change returns the current state along with the reason and time
    /// of the transition into it.
    pub fn state_change(&self) -> StateChange<LocalVideoStreamState> {
        self.state.current()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StateChange<LocalVideoStreamState>> {
        self.state.subscribe()
    }

    /// get_statistics returns a copy of the latest statistics, or
    /// ErrStatsNotAvailable if the transport never reported any.
    pub fn get_statistics(&self) -> Result<LocalVideoTrackStats> {
        self.stats.snapshot().ok_or(Error::ErrStatsNotAvailable)
    }

    /// on_captured_frame is called by the capture source for every frame.
    /// Returns how many renderers received it. A disabled or closed track
    /// swallows the frame.
    pub fn on_captured_frame(&self, frame: VideoFrame) -> usize {
        if !self.is_enabled() || self.pipeline.is_closed() {
            log::trace!(
                "local video track {}: discarding frame {}, track inactive",
                self.id,
                frame.timestamp_us
            );
            return 0;
        }
        self.pipeline.dispatch(frame)
    }

    /// update_state is how the encoder/transport pushes a state change.
    /// Starting can only be entered while the track is enabled.
    pub fn update_state(
        &self,
        state: LocalVideoStreamState,
        reason: LocalVideoStreamError,
    ) -> Result<bool> {
        self.state.transition_if(state, reason, |_| match state {
            LocalVideoStreamState::Stopped => Ok(()),
            LocalVideoStreamState::Starting => self.check_enabled(),
            _ if self.pipeline.is_closed() => Err(Error::ErrTrackClosed),
            _ => Ok(()),
        })
    }

    /// update_statistics applies one stats update event atomically. The
    /// first update starts from the current encoder codec.
    pub fn update_statistics<R>(&self, f: impl FnOnce(&mut LocalVideoTrackStats) -> R) -> R {
        let codec_type = self.encoder.lock().configuration.codec_type;
        self.stats.update_seeded(|s| s.encoder_type = codec_type, f)
    }

    /// close detaches every filter and renderer, disables the track and
    /// stops it. Later attachments fail with ErrTrackClosed.
    pub fn close(&self) -> Result<()> {
        if !self.pipeline.close() {
            return Ok(());
        }
        self.enabled.store(false, Ordering::SeqCst);
        self.state.stop(LocalVideoStreamError::Ok);
        log::debug!("local video track {} closed", self.id);
        Ok(())
    }
}

impl VideoTrack for LocalVideoTrack {
    fn tid(&self) -> usize {
        self.tid
    }

    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn pipeline(&self) -> &VideoPipeline {
        &self.pipeline
    }
}
