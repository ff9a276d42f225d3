use thiserror::Error;

use crate::state::{LocalVideoStreamState, RemoteVideoStreamState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ErrFilterAlreadyAttached indicates that the filter is already part
    /// of this track's filter chain.
    #[error("video filter already attached")]
    ErrFilterAlreadyAttached,

    /// ErrFilterNotFound indicates that the filter is not attached to this track.
    #[error("video filter not attached")]
    ErrFilterNotFound,

    /// ErrInternalFilter indicates an attempt to remove an engine-inserted
    /// filter without its InternalFilterHandle.
    #[error("video filter is internal and can only be removed through its handle")]
    ErrInternalFilter,

    /// ErrFilterCapacityExceeded indicates that the filter chain is full.
    #[error("video filter chain is full (max {0})")]
    ErrFilterCapacityExceeded(usize),

    /// ErrRendererAlreadyAttached indicates that the renderer is already
    /// part of this track's renderer set.
    #[error("video renderer already attached")]
    ErrRendererAlreadyAttached,

    /// ErrRendererNotFound indicates that the renderer is not attached to this track.
    #[error("video renderer not attached")]
    ErrRendererNotFound,

    /// ErrRendererCapacityExceeded indicates that the renderer set is full.
    #[error("video renderer set is full (max {0})")]
    ErrRendererCapacityExceeded(usize),

    /// ErrReceiverAlreadyRegistered indicates that the receiver is already registered.
    #[error("receiver already registered")]
    ErrReceiverAlreadyRegistered,

    /// ErrReceiverNotFound indicates that the receiver is not registered.
    #[error("receiver not registered")]
    ErrReceiverNotFound,

    /// ErrReceiverCapacityExceeded indicates that no more receivers of this kind can be registered.
    #[error("receiver set is full (max {0})")]
    ErrReceiverCapacityExceeded(usize),

    #[error("invalid video dimensions {width}x{height}")]
    ErrInvalidDimensions { width: u32, height: u32 },

    #[error("invalid frame rate {0}")]
    ErrInvalidFrameRate(u32),

    #[error("invalid bitrate: {0}")]
    ErrInvalidBitrate(String),

    #[error("invalid simulcast stream config: {0}")]
    ErrInvalidSimulcastConfig(String),

    #[error("invalid local video state transition {from} -> {to}")]
    ErrInvalidLocalStateTransition {
        from: LocalVideoStreamState,
        to: LocalVideoStreamState,
    },

    #[error("invalid remote video state transition {from} -> {to}")]
    ErrInvalidRemoteStateTransition {
        from: RemoteVideoStreamState,
        to: RemoteVideoStreamState,
    },

    /// ErrTrackDisabled indicates an operation that requires an enabled local track.
    #[error("video track is disabled")]
    ErrTrackDisabled,

    /// ErrTrackClosed indicates an operation executed after the track
    /// has already been closed.
    #[error("video track closed")]
    ErrTrackClosed,

    /// ErrStatsNotAvailable indicates that the transport has not reported
    /// any statistics for this track yet.
    #[error("statistics not available yet")]
    ErrStatsNotAvailable,

    /// ErrTrackInfoNotAvailable indicates that the transport has not published
    /// track information yet.
    #[error("track info not available yet")]
    ErrTrackInfoNotAvailable,

    #[error("not long enough to be a RTP Packet")]
    ErrRTPTooShort,

    #[error("{0}")]
    Util(#[from] util::Error),
    #[error("{0}")]
    Rtp(#[from] rtp::Error),

    #[allow(non_camel_case_types)]
    #[error("{0}")]
    new(String),
}
