#[cfg(test)]
mod stats_test;

mod serialize;

use std::fmt;

use serde::Serialize;
use tokio::time::Instant;
use util::sync::RwLock;

use crate::encoder::VideoCodecType;
use crate::track::track_remote::RemoteVideoStreamType;

/// Stamped records carry the time of their most recent update.
pub trait Stamped {
    fn stamp(&mut self, at: Instant);
}

/// LocalVideoTrackStats is a point-in-time copy of a local track's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVideoTrackStats {
    #[serde(with = "serialize::instant_to_epoch_ms")]
    pub timestamp: Instant,

    pub number_of_streams: u64,
    pub bytes_major_stream: u64,
    pub bytes_minor_stream: u64,
    pub frames_encoded: u32,
    pub ssrc_major_stream: u32,
    pub ssrc_minor_stream: u32,
    pub input_frame_rate: u32,
    pub encode_frame_rate: u32,
    pub target_media_bitrate_bps: u32,
    pub media_bitrate_bps: u32,
    /// media plus FEC
    pub total_bitrate_bps: u32,
    pub width: u32,
    pub height: u32,
    pub encoder_type: VideoCodecType,
}

impl Default for LocalVideoTrackStats {
    fn default() -> Self {
        LocalVideoTrackStats {
            timestamp: Instant::now(),
            number_of_streams: 0,
            bytes_major_stream: 0,
            bytes_minor_stream: 0,
            frames_encoded: 0,
            ssrc_major_stream: 0,
            ssrc_minor_stream: 0,
            input_frame_rate: 0,
            encode_frame_rate: 0,
            target_media_bitrate_bps: 0,
            media_bitrate_bps: 0,
            total_bitrate_bps: 0,
            width: 0,
            height: 0,
            encoder_type: VideoCodecType::default(),
        }
    }
}

impl Stamped for LocalVideoTrackStats {
    fn stamp(&mut self, at: Instant) {
        self.timestamp = at;
    }
}

/// RemoteVideoTrackStats is a point-in-time copy of a remote track's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVideoTrackStats {
    #[serde(with = "serialize::instant_to_epoch_ms")]
    pub timestamp: Instant,

    /// id of the remote user owning the stream
    pub uid: u32,
    pub track_id: u32,
    pub delay_ms: u32,
    pub width: u32,
    pub height: u32,
    /// bitrate received over the last reporting interval
    pub received_bitrate_kbps: u32,
    /// frame rate received over the last reporting interval
    pub received_frame_rate: u32,
    pub stream_type: RemoteVideoStreamType,
    pub total_decoded_frames: u64,
}

impl Default for RemoteVideoTrackStats {
    fn default() -> Self {
        RemoteVideoTrackStats {
            timestamp: Instant::now(),
            uid: 0,
            track_id: 0,
            delay_ms: 0,
            width: 0,
            height: 0,
            received_bitrate_kbps: 0,
            received_frame_rate: 0,
            stream_type: RemoteVideoStreamType::default(),
            total_decoded_frames: 0,
        }
    }
}

impl Stamped for RemoteVideoTrackStats {
    fn stamp(&mut self, at: Instant) {
        self.timestamp = at;
    }
}

/// StatsCell guards one stats record. Every update is applied under a single
/// write lock, so a reader sees all of an update or none of it. Until the
/// first update there is nothing to read.
pub struct StatsCell<T> {
    stats: RwLock<Option<T>>,
    initial: T,
}

impl<T: fmt::Debug> fmt::Debug for StatsCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsCell")
            .field("stats", &*self.stats.read())
            .finish()
    }
}

impl<T: Clone + Default + Stamped> Default for StatsCell<T> {
    fn default() -> Self {
        Self::with_initial(T::default())
    }
}

impl<T: Clone + Stamped> StatsCell<T> {
    /// with_initial sets the record the first update starts from.
    pub fn with_initial(initial: T) -> Self {
        StatsCell {
            stats: RwLock::new(None),
            initial,
        }
    }

    /// snapshot returns a copy of the latest record, or None if the
    /// transport has not reported yet.
    pub fn snapshot(&self) -> Option<T> {
        self.stats.read().clone()
    }

    /// update applies one update event.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.update_seeded(|_| {}, f)
    }

    /// update_seeded is update where `seed` fills in the record created by
    /// the first update, before `f` sees it. Later updates skip `seed`.
    pub fn update_seeded<R>(&self, seed: impl FnOnce(&mut T), f: impl FnOnce(&mut T) -> R) -> R {
        let mut stats = self.stats.write();
        let record = stats.get_or_insert_with(|| {
            let mut record = self.initial.clone();
            seed(&mut record);
            record
        });
        let r = f(record);
        record.stamp(Instant::now());
        r
    }
}
