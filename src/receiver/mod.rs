
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use util::Unmarshal;

use crate::encoder::VideoCodecType;
use crate::error::{Error, Result};
use crate::snapshot::{same_handle, SnapshotList};
use crate::track::track_remote::RemoteVideoStreamType;
use crate::video_frame::VideoRotation;

/// Size of the fixed part of an RTP header.
pub(crate) const RTP_FIXED_HEADER_LEN: usize = 12;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoFrameType {
    #[default]
    Unknown,
    Blank,
    Key,
    Delta,
    B,
    Droppable,
}

/// EncodedVideoFrameInfo describes a compressed frame handed out before decoding.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct EncodedVideoFrameInfo {
    pub codec_type: VideoCodecType,
    pub width: u32,
    pub height: u32,
    pub frames_per_second: u32,
    pub frame_type: VideoFrameType,
    pub rotation: VideoRotation,
    pub track_id: u32,
    pub capture_time_ms: i64,
    pub uid: u32,
    pub stream_type: RemoteVideoStreamType,
}

/// MediaPacketInfo is the RTP header summary of a raw media packet.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct MediaPacketInfo {
    pub ssrc: u32,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub payload_type: u8,
    pub marker: bool,
}

impl From<&rtp::header::Header> for MediaPacketInfo {
    fn from(header: &rtp::header::Header) -> Self {
        MediaPacketInfo {
            ssrc: header.ssrc,
            sequence_number: header.sequence_number,
            timestamp: header.timestamp,
            payload_type: header.payload_type,
            marker: header.marker,
        }
    }
}

impl MediaPacketInfo {
    /// parse reads the RTP header at the front of `raw` without consuming it.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < RTP_FIXED_HEADER_LEN {
            return Err(Error::ErrRTPTooShort);
        }

        let mut buf = raw;
        let header = rtp::header::Header::unmarshal(&mut buf)?;
        Ok(MediaPacketInfo::from(&header))
    }
}

/// EncodedImageReceiver observes compressed frames before they are decoded.
/// It bypasses the filter chain and renderers.
pub trait EncodedImageReceiver {
    fn on_encoded_video_image(&self, image: &[u8], info: &EncodedVideoFrameInfo) -> Result<()>;
}

/// MediaPacketReceiver observes raw transport packets, the lowest level
/// output of a remote track. `info` is None when the packet does not start
/// with an RTP header; the packet is delivered either way.
pub trait MediaPacketReceiver {
    fn on_media_packet(&self, packet: &[u8], info: Option<&MediaPacketInfo>) -> Result<()>;
}

/// ReceiverSet holds the registered receivers of one kind.
pub struct ReceiverSet<T: ?Sized> {
    receivers: SnapshotList<Arc<T>>,
    max_receivers: usize,
}

impl<T: ?Sized> fmt::Debug for ReceiverSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverSet")
            .field("len", &self.receivers.len())
            .field("max_receivers", &self.max_receivers)
            .finish()
    }
}

impl<T: ?Sized> ReceiverSet<T> {
    pub(crate) fn new(max_receivers: usize) -> Self {
        ReceiverSet {
            receivers: SnapshotList::new(),
            max_receivers,
        }
    }

    pub fn register(&self, receiver: Arc<T>) -> Result<()> {
        self.receivers.update(|receivers| {
            if receivers.iter().any(|r| same_handle(r, &receiver)) {
                return Err(Error::ErrReceiverAlreadyRegistered);
            }
            if receivers.len() >= self.max_receivers {
                return Err(Error::ErrReceiverCapacityExceeded(self.max_receivers));
            }
            receivers.push(receiver);
            Ok(())
        })
    }

    pub fn unregister(&self, receiver: &Arc<T>) -> Result<()> {
        self.receivers.update(|receivers| {
            let index = receivers
                .iter()
                .position(|r| same_handle(r, receiver))
                .ok_or(Error::ErrReceiverNotFound)?;
            receivers.swap_remove(index);
            Ok(())
        })
    }

    pub fn contains(&self, receiver: &Arc<T>) -> bool {
        self.receivers
            .snapshot()
            .iter()
            .any(|r| same_handle(r, receiver))
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// deliver calls `f` for every receiver in one snapshot, carrying on past
    /// failures, which are only logged. Returns the number of receivers that
    /// succeeded.
    pub(crate) fn deliver(&self, mut f: impl FnMut(&T) -> Result<()>) -> usize {
        let receivers = self.receivers.snapshot();
        let mut n = 0;

        for receiver in receivers.iter() {
            match f(&**receiver) {
                Ok(()) => n += 1,
                Err(err) => log::warn!("receiver failed: {}", err),
            }
        }

        n
    }

    pub(crate) fn clear(&self) -> usize {
        self.receivers.take().len()
    }
}
