use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// VideoRotation is the clockwise rotation to apply to a frame before display.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl VideoRotation {
    pub fn degrees(&self) -> u32 {
        match *self {
            VideoRotation::Rotation0 => 0,
            VideoRotation::Rotation90 => 90,
            VideoRotation::Rotation180 => 180,
            VideoRotation::Rotation270 => 270,
        }
    }
}

impl From<u32> for VideoRotation {
    fn from(degrees: u32) -> Self {
        match degrees % 360 {
            90 => VideoRotation::Rotation90,
            180 => VideoRotation::Rotation180,
            270 => VideoRotation::Rotation270,
            _ => VideoRotation::Rotation0,
        }
    }
}

impl fmt::Display for VideoRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// VideoFrame is a single raw frame travelling through a track's pipeline.
///
/// The pixel layout of `data` is opaque to the pipeline; filters that care
/// about it agree on a format among themselves.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rotation: VideoRotation,
    /// capture or render timestamp in microseconds
    pub timestamp_us: i64,
    pub data: Bytes,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, data: Bytes) -> Self {
        VideoFrame {
            width,
            height,
            data,
            ..Default::default()
        }
    }

    /// display_dimensions returns width and height after applying rotation
    pub fn display_dimensions(&self) -> (u32, u32) {
        match self.rotation {
            VideoRotation::Rotation90 | VideoRotation::Rotation270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }
}
