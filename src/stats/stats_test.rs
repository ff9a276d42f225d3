use std::sync::Arc;
use std::thread;

use super::*;

#[test]
fn test_stats_cell_unavailable_until_first_update() {
    let cell: StatsCell<LocalVideoTrackStats> = StatsCell::default();
    assert_eq!(cell.snapshot(), None);

    cell.update(|s| s.frames_encoded += 1);
    assert_eq!(cell.snapshot().map(|s| s.frames_encoded), Some(1));
}

#[test]
fn test_stats_cell_seed_applies_to_first_update_only() {
    let cell: StatsCell<RemoteVideoTrackStats> = StatsCell::default();

    cell.update_seeded(|s| s.uid = 42, |s| s.total_decoded_frames = 1);
    cell.update_seeded(|s| s.uid = 7, |s| s.total_decoded_frames += 1);

    let stats = cell.snapshot().unwrap();
    assert_eq!(stats.uid, 42);
    assert_eq!(stats.total_decoded_frames, 2);
}

#[test]
fn test_stats_cell_initial_record() {
    let cell = StatsCell::with_initial(LocalVideoTrackStats {
        ssrc_major_stream: 1234,
        ..Default::default()
    });
    assert_eq!(cell.snapshot(), None);

    cell.update(|s| s.width = 640);
    let stats = cell.snapshot().unwrap();
    assert_eq!(stats.ssrc_major_stream, 1234);
    assert_eq!(stats.width, 640);
}

#[test]
fn test_stats_cell_snapshot_is_a_copy() {
    let cell: StatsCell<RemoteVideoTrackStats> = StatsCell::default();
    cell.update(|s| s.total_decoded_frames = 10);
    let snapshot = cell.snapshot().unwrap();

    cell.update(|s| s.total_decoded_frames = 11);
    assert_eq!(snapshot.total_decoded_frames, 10);
    assert_eq!(cell.snapshot().unwrap().total_decoded_frames, 11);
}

#[test]
fn test_stats_cell_reads_never_tear() {
    let cell: Arc<StatsCell<LocalVideoTrackStats>> = Arc::new(StatsCell::default());
    cell.update(|_| {});

    let writer = {
        let cell = Arc::clone(&cell);
        thread::spawn(move || {
            for _ in 0..10_000 {
                cell.update(|s| {
                    s.frames_encoded += 1;
                    s.bytes_major_stream = s.frames_encoded as u64 * 1200;
                    s.width = s.frames_encoded;
                });
            }
        })
    };

    let mut last = 0;
    while !writer.is_finished() {
        let s = cell.snapshot().unwrap();
        assert!(s.frames_encoded >= last);
        assert_eq!(s.bytes_major_stream, s.frames_encoded as u64 * 1200);
        assert_eq!(s.width, s.frames_encoded);
        last = s.frames_encoded;
    }
    writer.join().unwrap();

    assert_eq!(cell.snapshot().unwrap().frames_encoded, 10_000);
}

#[test]
fn test_local_stats_serialize_camel_case() {
    let stats = LocalVideoTrackStats {
        frames_encoded: 42,
        target_media_bitrate_bps: 800_000,
        ..Default::default()
    };
    let json = serde_json::to_value(&stats).unwrap();

    assert_eq!(json["framesEncoded"], 42);
    assert_eq!(json["targetMediaBitrateBps"], 800_000);
    assert_eq!(json["encoderType"], "H264");
    assert!(json["timestamp"].as_u64().unwrap() > 0);
}

#[test]
fn test_remote_stats_serialize_stream_type() {
    let stats = RemoteVideoTrackStats {
        stream_type: RemoteVideoStreamType::Low,
        total_decoded_frames: 7,
        ..Default::default()
    };
    let json = serde_json::to_value(&stats).unwrap();

    assert_eq!(json["streamType"], "Low");
    assert_eq!(json["totalDecodedFrames"], 7);
}
