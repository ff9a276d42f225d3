
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoCodecType {
    Vp8,
    #[default]
    H264,
    H265,
    Vp9,
    Av1,
    Generic,
}

const VIDEO_CODEC_VP8_STR: &str = "VP8";
const VIDEO_CODEC_H264_STR: &str = "H264";
const VIDEO_CODEC_H265_STR: &str = "H265";
const VIDEO_CODEC_VP9_STR: &str = "VP9";
const VIDEO_CODEC_AV1_STR: &str = "AV1";
const VIDEO_CODEC_GENERIC_STR: &str = "generic";

impl From<&str> for VideoCodecType {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            VIDEO_CODEC_VP8_STR => VideoCodecType::Vp8,
            VIDEO_CODEC_H264_STR => VideoCodecType::H264,
            VIDEO_CODEC_H265_STR | "HEVC" => VideoCodecType::H265,
            VIDEO_CODEC_VP9_STR => VideoCodecType::Vp9,
            VIDEO_CODEC_AV1_STR => VideoCodecType::Av1,
            _ => VideoCodecType::Generic,
        }
    }
}

impl fmt::Display for VideoCodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            VideoCodecType::Vp8 => VIDEO_CODEC_VP8_STR,
            VideoCodecType::H264 => VIDEO_CODEC_H264_STR,
            VideoCodecType::H265 => VIDEO_CODEC_H265_STR,
            VideoCodecType::Vp9 => VIDEO_CODEC_VP9_STR,
            VideoCodecType::Av1 => VIDEO_CODEC_AV1_STR,
            VideoCodecType::Generic => VIDEO_CODEC_GENERIC_STR,
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for VideoDimensions {
    fn default() -> Self {
        VideoDimensions {
            width: 640,
            height: 360,
        }
    }
}

impl VideoDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        VideoDimensions { width, height }
    }

    fn long_side(&self) -> u32 {
        self.width.max(self.height)
    }

    fn short_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// fits_within compares orientation-independently: 1080x1920 fits
    /// within 1920x1080.
    pub fn fits_within(&self, other: &VideoDimensions) -> bool {
        self.long_side() <= other.long_side() && self.short_side() <= other.short_side()
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn invalid(&self) -> Error {
        Error::ErrInvalidDimensions {
            width: self.width,
            height: self.height,
        }
    }
}

impl fmt::Display for VideoDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// BitrateTarget is the requested encoder bitrate ceiling.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitrateTarget {
    /// let the engine pick the standard bitrate for the resolution and frame rate
    #[default]
    Standard,
    /// the lower bitrate profile used for interop with older clients
    Compatible,
    Kbps(u32),
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationMode {
    #[default]
    Adaptive,
    FixedLandscape,
    FixedPortrait,
}

/// DegradationPreference picks what the transport sacrifices first when
/// bandwidth is short.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradationPreference {
    #[default]
    MaintainQuality,
    MaintainFramerate,
    MaintainBalanced,
}

/// EncoderLimits bound what a configuration may request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncoderLimits {
    pub max_dimensions: VideoDimensions,
    pub max_frame_rate: u32,
}

/// VideoEncoderConfiguration is the ceiling the local track encodes at.
/// The transport may operate below it under poor network conditions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEncoderConfiguration {
    pub codec_type: VideoCodecType,
    pub dimensions: VideoDimensions,
    pub frame_rate: u32,
    pub bitrate: BitrateTarget,
    /// None lets the engine choose the floor
    pub min_bitrate_kbps: Option<u32>,
    pub orientation_mode: OrientationMode,
    pub degradation_preference: DegradationPreference,
}

impl Default for VideoEncoderConfiguration {
    fn default() -> Self {
        VideoEncoderConfiguration {
            codec_type: VideoCodecType::default(),
            dimensions: VideoDimensions::default(),
            frame_rate: 15,
            bitrate: BitrateTarget::default(),
            min_bitrate_kbps: None,
            orientation_mode: OrientationMode::default(),
            degradation_preference: DegradationPreference::default(),
        }
    }
}

impl VideoEncoderConfiguration {
    pub fn validate(&self, limits: &EncoderLimits) -> Result<()> {
        if self.dimensions.is_empty() || !self.dimensions.fits_within(&limits.max_dimensions) {
            return Err(self.dimensions.invalid());
        }
        if self.frame_rate == 0 || self.frame_rate > limits.max_frame_rate {
            return Err(Error::ErrInvalidFrameRate(self.frame_rate));
        }

        match (self.bitrate, self.min_bitrate_kbps) {
            (BitrateTarget::Kbps(0), _) => {
                return Err(Error::ErrInvalidBitrate(
                    "target bitrate must be positive".to_owned(),
                ))
            }
            (BitrateTarget::Kbps(target), Some(min)) if min > target => {
                return Err(Error::ErrInvalidBitrate(format!(
                    "min bitrate {min} kbps exceeds target {target} kbps"
                )))
            }
            _ => {}
        }

        Ok(())
    }
}

/// SimulcastStreamConfig describes the additional low-quality stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulcastStreamConfig {
    pub dimensions: VideoDimensions,
    pub bitrate_kbps: u32,
    pub frame_rate: u32,
}

impl Default for SimulcastStreamConfig {
    fn default() -> Self {
        SimulcastStreamConfig {
            dimensions: VideoDimensions::new(160, 120),
            bitrate_kbps: 65,
            frame_rate: 5,
        }
    }
}

impl SimulcastStreamConfig {
    /// validate checks the minor stream against the major stream it is
    /// derived from: it can be no larger, no faster, and must use less
    /// bitrate when the major stream has an explicit one.
    pub fn validate(&self, major: &VideoEncoderConfiguration) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(self.dimensions.invalid());
        }
        if !self.dimensions.fits_within(&major.dimensions) {
            return Err(Error::ErrInvalidSimulcastConfig(format!(
                "minor stream {} larger than major stream {}",
                self.dimensions, major.dimensions
            )));
        }
        if self.frame_rate == 0 {
            return Err(Error::ErrInvalidFrameRate(self.frame_rate));
        }
        if self.frame_rate > major.frame_rate {
            return Err(Error::ErrInvalidSimulcastConfig(format!(
                "minor stream frame rate {} above major stream {}",
                self.frame_rate, major.frame_rate
            )));
        }
        if self.bitrate_kbps == 0 {
            return Err(Error::ErrInvalidBitrate(
                "minor stream bitrate must be positive".to_owned(),
            ));
        }
        if let BitrateTarget::Kbps(major_kbps) = major.bitrate {
            if self.bitrate_kbps >= major_kbps {
                return Err(Error::ErrInvalidSimulcastConfig(format!(
                    "minor stream bitrate {} kbps not below major stream {} kbps",
                    self.bitrate_kbps, major_kbps
                )));
            }
        }

        Ok(())
    }
}
