
use crate::encoder::{EncoderLimits, VideoDimensions};

pub(crate) const DEFAULT_MAX_VIDEO_FILTERS: usize = 16;
pub(crate) const DEFAULT_MAX_RENDERERS: usize = 16;
pub(crate) const DEFAULT_MAX_RECEIVERS: usize = 8;
pub(crate) const DEFAULT_MAX_ENCODER_WIDTH: u32 = 3840;
pub(crate) const DEFAULT_MAX_ENCODER_HEIGHT: u32 = 2160;
pub(crate) const DEFAULT_MAX_FRAME_RATE: u32 = 60;

#[derive(Default, Debug, Clone)]
pub(crate) struct Capacity {
    pub(crate) video_filters: usize,
    pub(crate) renderers: usize,
    pub(crate) encoded_image_receivers: usize,
    pub(crate) media_packet_receivers: usize,
}

/// SettingEngine allows influencing behavior of the tracks an API creates
/// beyond what the track methods expose. A zero or unset value means "use
/// the default".
#[derive(Default, Debug, Clone)]
pub struct SettingEngine {
    pub(crate) capacity: Capacity,
    pub(crate) max_encoder_dimensions: Option<VideoDimensions>,
    pub(crate) max_frame_rate: u32,
}

impl SettingEngine {
    /// get_max_video_filters returns the configured filter chain capacity
    pub(crate) fn get_max_video_filters(&self) -> usize {
        if self.capacity.video_filters != 0 {
            self.capacity.video_filters
        } else {
            DEFAULT_MAX_VIDEO_FILTERS
        }
    }

    pub(crate) fn get_max_renderers(&self) -> usize {
        if self.capacity.renderers != 0 {
            self.capacity.renderers
        } else {
            DEFAULT_MAX_RENDERERS
        }
    }

    pub(crate) fn get_max_encoded_image_receivers(&self) -> usize {
        if self.capacity.encoded_image_receivers != 0 {
            self.capacity.encoded_image_receivers
        } else {
            DEFAULT_MAX_RECEIVERS
        }
    }

    pub(crate) fn get_max_media_packet_receivers(&self) -> usize {
        if self.capacity.media_packet_receivers != 0 {
            self.capacity.media_packet_receivers
        } else {
            DEFAULT_MAX_RECEIVERS
        }
    }

    /// get_encoder_limits returns the bounds encoder configurations are validated against
    pub(crate) fn get_encoder_limits(&self) -> EncoderLimits {
        EncoderLimits {
            max_dimensions: match self.max_encoder_dimensions {
                Some(dimensions) if dimensions.width != 0 && dimensions.height != 0 => dimensions,
                _ => VideoDimensions {
                    width: DEFAULT_MAX_ENCODER_WIDTH,
                    height: DEFAULT_MAX_ENCODER_HEIGHT,
                },
            },
            max_frame_rate: if self.max_frame_rate != 0 {
                self.max_frame_rate
            } else {
                DEFAULT_MAX_FRAME_RATE
            },
        }
    }

    /// set_max_video_filters caps how many filters a track accepts, internal
    /// filters included.
    pub fn set_max_video_filters(&mut self, max: usize) {
        self.capacity.video_filters = max;
    }

    pub fn set_max_renderers(&mut self, max: usize) {
        self.capacity.renderers = max;
    }

    pub fn set_max_encoded_image_receivers(&mut self, max: usize) {
        self.capacity.encoded_image_receivers = max;
    }

    pub fn set_max_media_packet_receivers(&mut self, max: usize) {
        self.capacity.media_packet_receivers = max;
    }

    /// set_max_encoder_dimensions bounds the resolution a local track may be
    /// configured with. The bound is orientation independent. A zero width
    /// or height restores the default.
    pub fn set_max_encoder_dimensions(&mut self, width: u32, height: u32) {
        self.max_encoder_dimensions = Some(VideoDimensions { width, height });
    }

    pub fn set_max_frame_rate(&mut self, max: u32) {
        self.max_frame_rate = max;
    }
}
