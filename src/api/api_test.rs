use super::*;
use crate::error::{Error, Result};
use crate::filter::{FilterVerdict, VideoFilter};
use crate::track::VideoTrack;
use crate::video_frame::VideoFrame;

struct PassFilter;

impl VideoFilter for PassFilter {
    fn process(&self, _frame: &mut VideoFrame) -> Result<FilterVerdict> {
        Ok(FilterVerdict::Pass)
    }
}

#[test]
fn test_new_api() -> Result<()> {
    let mut s = SettingEngine::default();
    s.set_max_video_filters(1);

    let api = APIBuilder::new().with_setting_engine(s).build();

    assert_eq!(
        api.setting_engine.get_max_video_filters(),
        1,
        "Failed to set settings engine"
    );

    let track = api.new_local_video_track("camera");
    track.add_video_filter(Arc::new(PassFilter))?;
    assert_eq!(
        track.add_video_filter(Arc::new(PassFilter)),
        Err(Error::ErrFilterCapacityExceeded(1))
    );

    Ok(())
}

#[test]
fn test_api_track_ids_are_unique() {
    let api = APIBuilder::new().build();

    let local = api.new_local_video_track("a");
    let remote = api.new_remote_video_track("a", None);

    assert_eq!(local.id(), remote.id());
    assert_ne!(local.tid(), remote.tid());
}
