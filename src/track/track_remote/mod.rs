
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use portable_atomic::AtomicU8;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tokio::sync::watch;
use util::sync::Mutex;

use super::{next_track_id, VideoPipeline, VideoTrack};
use crate::api::setting_engine::SettingEngine;
use crate::encoder::VideoCodecType;
use crate::error::{Error, Result};
use crate::receiver::{
    EncodedImageReceiver, EncodedVideoFrameInfo, MediaPacketInfo, MediaPacketReceiver, ReceiverSet,
};
use crate::state::{RemoteVideoStateReason, RemoteVideoStreamState, StateChange, StateMachine};
use crate::stats::{RemoteVideoTrackStats, StatsCell};
use crate::video_frame::VideoFrame;

/// RemoteVideoStreamType selects which stream of a simulcast sender to receive.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteVideoStreamType {
    #[default]
    High,
    Low,
}

const REMOTE_VIDEO_STREAM_TYPE_HIGH_STR: &str = "high";
const REMOTE_VIDEO_STREAM_TYPE_LOW_STR: &str = "low";

impl From<u8> for RemoteVideoStreamType {
    fn from(v: u8) -> Self {
        match v {
            1 => RemoteVideoStreamType::Low,
            _ => RemoteVideoStreamType::High,
        }
    }
}

impl From<RemoteVideoStreamType> for u8 {
    fn from(t: RemoteVideoStreamType) -> Self {
        match t {
            RemoteVideoStreamType::High => 0,
            RemoteVideoStreamType::Low => 1,
        }
    }
}

impl fmt::Display for RemoteVideoStreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RemoteVideoStreamType::High => REMOTE_VIDEO_STREAM_TYPE_HIGH_STR,
            RemoteVideoStreamType::Low => REMOTE_VIDEO_STREAM_TYPE_LOW_STR,
        };
        write!(f, "{s}")
    }
}

/// VideoTrackInfo is what the transport knows about the stream behind a
/// remote track.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoTrackInfo {
    pub is_local: bool,
    pub owner_uid: u32,
    pub track_id: u32,
    pub channel_id: SmolStr,
    pub codec_type: VideoCodecType,
    pub stream_type: RemoteVideoStreamType,
    /// the sender only delivers encoded frames, nothing is decoded locally
    pub encoded_frame_only: bool,
}

/// RemoteVideoTrack is a video track fed by the network. It has three
/// independent outputs: decoded frames through the filter chain to the
/// renderers, encoded images to encoded image receivers, and raw packets
/// to media packet receivers.
pub struct RemoteVideoTrack {
    tid: usize,
    id: SmolStr,
    pipeline: VideoPipeline,
    encoded_image_receivers: ReceiverSet<dyn EncodedImageReceiver + Send + Sync>,
    media_packet_receivers: ReceiverSet<dyn MediaPacketReceiver + Send + Sync>,
    stream_type: AtomicU8,
    track_info: Mutex<Option<VideoTrackInfo>>,
    state: StateMachine<RemoteVideoStreamState>,
    stats: StatsCell<RemoteVideoTrackStats>,
}

impl fmt::Debug for RemoteVideoTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteVideoTrack")
            .field("tid", &self.tid)
            .field("id", &self.id)
            .field("state", &self.get_state())
            .field("stream_type", &self.stream_type())
            .field("pipeline", &self.pipeline)
            .field("encoded_image_receivers", &self.encoded_image_receivers)
            .field("media_packet_receivers", &self.media_packet_receivers)
            .finish()
    }
}

impl RemoteVideoTrack {
    pub(crate) fn new(
        id: &str,
        track_info: Option<VideoTrackInfo>,
        setting_engine: &SettingEngine,
    ) -> Self {
        let stream_type = track_info
            .as_ref()
            .map(|info| info.stream_type)
            .unwrap_or_default();

        RemoteVideoTrack {
            tid: next_track_id(),
            id: SmolStr::new(id),
            pipeline: VideoPipeline::new(setting_engine),
            encoded_image_receivers: ReceiverSet::new(
                setting_engine.get_max_encoded_image_receivers(),
            ),
            media_packet_receivers: ReceiverSet::new(
                setting_engine.get_max_media_packet_receivers(),
            ),
            stream_type: AtomicU8::new(stream_type.into()),
            track_info: Mutex::new(track_info),
            state: StateMachine::new(),
            stats: StatsCell::default(),
        }
    }

    pub fn get_state(&self) -> RemoteVideoStreamState {
        self.state.state()
    }

    pub fn state_change(&self) -> StateChange<RemoteVideoStreamState> {
        self.state.current()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StateChange<RemoteVideoStreamState>> {
        self.state.subscribe()
    }

    /// get_statistics returns a copy of the latest statistics, or
    /// ErrStatsNotAvailable if the transport never reported any.
    pub fn get_statistics(&self) -> Result<RemoteVideoTrackStats> {
        self.stats.snapshot().ok_or(Error::ErrStatsNotAvailable)
    }

    pub fn get_track_info(&self) -> Result<VideoTrackInfo> {
        self.track_info
            .lock()
            .clone()
            .ok_or(Error::ErrTrackInfoNotAvailable)
    }

    pub fn register_video_encoded_image_receiver(
        &self,
        receiver: Arc<dyn EncodedImageReceiver + Send + Sync>,
    ) -> Result<()> {
        self.check_open()?;
        self.encoded_image_receivers.register(Arc::clone(&receiver))?;

        // close may have cleared the set between the check and the insert
        if self.pipeline.is_closed() {
            let _ = self.encoded_image_receivers.unregister(&receiver);
            return Err(Error::ErrTrackClosed);
        }
        log::debug!("remote video track {}: encoded image receiver registered", self.id);
        Ok(())
    }

    pub fn unregister_video_encoded_image_receiver(
        &self,
        receiver: &Arc<dyn EncodedImageReceiver + Send + Sync>,
    ) -> Result<()> {
        self.encoded_image_receivers.unregister(receiver)
    }

    pub fn register_media_packet_receiver(
        &self,
        receiver: Arc<dyn MediaPacketReceiver + Send + Sync>,
    ) -> Result<()> {
        self.check_open()?;
        self.media_packet_receivers.register(Arc::clone(&receiver))?;

        if self.pipeline.is_closed() {
            let _ = self.media_packet_receivers.unregister(&receiver);
            return Err(Error::ErrTrackClosed);
        }
        log::debug!("remote video track {}: media packet receiver registered", self.id);
        Ok(())
    }

    pub fn unregister_media_packet_receiver(
        &self,
        receiver: &Arc<dyn MediaPacketReceiver + Send + Sync>,
    ) -> Result<()> {
        self.media_packet_receivers.unregister(receiver)
    }

    /// set_stream_type selects the stream the transport should subscribe to.
    pub fn set_stream_type(&self, stream_type: RemoteVideoStreamType) {
        let prev: RemoteVideoStreamType =
            self.stream_type.swap(stream_type.into(), Ordering::SeqCst).into();
        if prev != stream_type {
            log::debug!(
                "remote video track {}: stream type {} -> {}",
                self.id,
                prev,
                stream_type
            );
        }
    }

    /// stream_type is the selection the transport pulls.
    pub fn stream_type(&self) -> RemoteVideoStreamType {
        self.stream_type.load(Ordering::SeqCst).into()
    }

    fn check_open(&self) -> Result<()> {
        if self.pipeline.is_closed() {
            Err(Error::ErrTrackClosed)
        } else {
            Ok(())
        }
    }

    /// on_decoded_frame is called by the decoder for every frame. Returns
    /// how many renderers received it.
    pub fn on_decoded_frame(&self, frame: VideoFrame) -> usize {
        if self.pipeline.is_closed() {
            return 0;
        }
        self.pipeline.dispatch(frame)
    }

    /// on_encoded_image hands a compressed frame to every encoded image
    /// receiver, bypassing the filter chain.
    pub fn on_encoded_image(&self, image: &[u8], info: &EncodedVideoFrameInfo) -> usize {
        if self.pipeline.is_closed() {
            return 0;
        }
        log::trace!(
            "remote video track {}: encoded image {} bytes, {:?}",
            self.id,
            image.len(),
            info.frame_type
        );
        self.encoded_image_receivers
            .deliver(|receiver| receiver.on_encoded_video_image(image, info))
    }

    /// on_media_packet hands a raw transport packet to every media packet
    /// receiver. The RTP header fields ride along when the packet has one.
    pub fn on_media_packet(&self, packet: &[u8]) -> usize {
        if self.pipeline.is_closed() || self.media_packet_receivers.is_empty() {
            return 0;
        }

        let info = MediaPacketInfo::parse(packet).ok();
        match &info {
            Some(info) => log::trace!(
                "remote video track {}: media packet ssrc={} seq={}",
                self.id,
                info.ssrc,
                info.sequence_number
            ),
            None => log::trace!(
                "remote video track {}: media packet of {} bytes without rtp header",
                self.id,
                packet.len()
            ),
        }
        self.media_packet_receivers
            .deliver(|receiver| receiver.on_media_packet(packet, info.as_ref()))
    }

    /// update_state is how the decoder/transport pushes a state change. A
    /// closed track only accepts Stopped.
    pub fn update_state(
        &self,
        state: RemoteVideoStreamState,
        reason: RemoteVideoStateReason,
    ) -> Result<bool> {
        self.state.transition_if(state, reason, |_| match state {
            RemoteVideoStreamState::Stopped => Ok(()),
            _ => self.check_open(),
        })
    }

    /// update_statistics applies one stats update event atomically. The
    /// first update starts from the track info and stream type known then.
    pub fn update_statistics<R>(&self, f: impl FnOnce(&mut RemoteVideoTrackStats) -> R) -> R {
        let info = self.track_info.lock().clone();
        let stream_type = self.stream_type();
        self.stats.update_seeded(
            |s| {
                s.stream_type = stream_type;
                if let Some(info) = info {
                    s.uid = info.owner_uid;
                    s.track_id = info.track_id;
                }
            },
            f,
        )
    }

    /// set_track_info publishes what the transport learned about the stream.
    pub fn set_track_info(&self, info: VideoTrackInfo) {
        log::debug!(
            "remote video track {}: track info uid={} track_id={} codec={}",
            self.id,
            info.owner_uid,
            info.track_id,
            info.codec_type
        );
        *self.track_info.lock() = Some(info);
    }

    /// close detaches every filter, renderer and receiver and stops the
    /// track. Later attachments fail with ErrTrackClosed.
    pub fn close(&self) -> Result<()> {
        if !self.pipeline.close() {
            return Ok(());
        }
        let receivers = self.encoded_image_receivers.clear() + self.media_packet_receivers.clear();
        self.state.stop(RemoteVideoStateReason::Internal);
        log::debug!(
            "remote video track {} closed, dropped {} receivers",
            self.id,
            receivers
        );
        Ok(())
    }
}

impl VideoTrack for RemoteVideoTrack {
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
