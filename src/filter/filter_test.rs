use std::thread;

use bytes::Bytes;
use util::sync::Mutex;

use super::*;

struct RecordingFilter {
    id: u32,
    seen: Arc<Mutex<Vec<(i64, u32)>>>,
}

impl VideoFilter for RecordingFilter {
    fn process(&self, frame: &mut VideoFrame) -> Result<FilterVerdict> {
        self.seen.lock().push((frame.timestamp_us, self.id));
        Ok(FilterVerdict::Pass)
    }
}

struct DoubleWidthFilter;

impl VideoFilter for DoubleWidthFilter {
    fn process(&self, frame: &mut VideoFrame) -> Result<FilterVerdict> {
        frame.width *= 2;
        Ok(FilterVerdict::Pass)
    }
}

struct DropOddFilter;

impl VideoFilter for DropOddFilter {
    fn process(&self, frame: &mut VideoFrame) -> Result<FilterVerdict> {
        if frame.timestamp_us % 2 == 1 {
            Ok(FilterVerdict::Drop)
        } else {
            Ok(FilterVerdict::Pass)
        }
    }
}

/// Scribbles on the frame and then fails.
struct FaultyFilter;

impl VideoFilter for FaultyFilter {
    fn process(&self, frame: &mut VideoFrame) -> Result<FilterVerdict> {
        frame.width = 0;
        frame.data = Bytes::from_static(b"garbage");
        Err(Error::new("faulty filter".to_owned()))
    }

    fn name(&self) -> &str {
        "faulty"
    }
}

fn recording(
    id: u32,
    seen: &Arc<Mutex<Vec<(i64, u32)>>>,
) -> Arc<dyn VideoFilter + Send + Sync> {
    Arc::new(RecordingFilter {
        id,
        seen: Arc::clone(seen),
    })
}

fn frame_at(timestamp_us: i64) -> VideoFrame {
    VideoFrame {
        width: 640,
        height: 360,
        timestamp_us,
        ..Default::default()
    }
}

#[test]
fn test_filter_chain_add_twice() -> Result<()> {
    let chain = FilterChain::new(16);
    let f: Arc<dyn VideoFilter + Send + Sync> = Arc::new(DoubleWidthFilter);

    chain.add(Arc::clone(&f))?;
    assert_eq!(chain.add(Arc::clone(&f)), Err(Error::ErrFilterAlreadyAttached));
    assert_eq!(chain.len(), 1);
    assert!(chain.contains(&f));

    Ok(())
}

#[test]
fn test_filter_chain_remove_absent() -> Result<()> {
    let chain = FilterChain::new(16);
    let seen = Arc::new(Mutex::new(vec![]));
    let attached = recording(1, &seen);
    let stranger = recording(2, &seen);

    chain.add(Arc::clone(&attached))?;
    assert_eq!(chain.remove(&stranger), Err(Error::ErrFilterNotFound));
    assert_eq!(chain.remove(&stranger), Err(Error::ErrFilterNotFound));
    assert_eq!(chain.len(), 1);
    assert!(chain.contains(&attached));

    chain.remove(&attached)?;
    assert_eq!(chain.remove(&attached), Err(Error::ErrFilterNotFound));
    assert!(chain.is_empty());

    Ok(())
}

#[test]
fn test_filter_chain_order_after_remove() -> Result<()> {
    let chain = FilterChain::new(16);
    let seen = Arc::new(Mutex::new(vec![]));
    let (f1, f2, f3) = (recording(1, &seen), recording(2, &seen), recording(3, &seen));

    chain.add(Arc::clone(&f1))?;
    chain.add(Arc::clone(&f2))?;
    chain.add(Arc::clone(&f3))?;
    chain.remove(&f2)?;

    let out = chain.process(frame_at(7));
    assert!(out.frame.is_some());
    assert!(out.faults.is_empty());
    assert_eq!(*seen.lock(), vec![(7, 1), (7, 3)]);

    Ok(())
}

#[test]
fn test_filter_chain_capacity() -> Result<()> {
    let chain = FilterChain::new(2);
    let seen = Arc::new(Mutex::new(vec![]));

    chain.add(recording(1, &seen))?;
    chain.add(recording(2, &seen))?;
    assert_eq!(
        chain.add(recording(3, &seen)),
        Err(Error::ErrFilterCapacityExceeded(2))
    );
    assert_eq!(chain.len(), 2);

    Ok(())
}

#[test]
fn test_filter_chain_internal_removal_needs_handle() -> Result<()> {
    let chain = FilterChain::new(16);
    let internal: Arc<dyn VideoFilter + Send + Sync> = Arc::new(DoubleWidthFilter);

    let handle = chain.add_internal(Arc::clone(&internal))?;
    assert_eq!(chain.remove(&internal), Err(Error::ErrInternalFilter));
    assert!(chain.contains(&internal));

    chain.remove_internal(handle)?;
    assert!(chain.is_empty());

    Ok(())
}

#[test]
fn test_filter_chain_handle_from_other_chain() -> Result<()> {
    let a = FilterChain::new(16);
    let b = FilterChain::new(16);
    let filter: Arc<dyn VideoFilter + Send + Sync> = Arc::new(DoubleWidthFilter);

    let handle = a.add_internal(Arc::clone(&filter))?;
    b.add(Arc::clone(&filter))?;

    assert_eq!(b.remove_internal(handle), Err(Error::ErrFilterNotFound));
    assert!(a.contains(&filter));
    assert!(b.contains(&filter));

    Ok(())
}

#[test]
fn test_filter_chain_transform() -> Result<()> {
    let chain = FilterChain::new(16);
    chain.add(Arc::new(DoubleWidthFilter))?;

    let out = chain.process(frame_at(0));
    assert_eq!(out.frame.map(|f| f.width), Some(1280));

    Ok(())
}

#[test]
fn test_filter_chain_drop_stops_later_filters() -> Result<()> {
    let chain = FilterChain::new(16);
    let seen = Arc::new(Mutex::new(vec![]));
    chain.add(Arc::new(DropOddFilter))?;
    chain.add(recording(1, &seen))?;

    assert!(chain.process(frame_at(1)).frame.is_none());
    assert!(chain.process(frame_at(2)).frame.is_some());
    assert_eq!(*seen.lock(), vec![(2, 1)]);

    Ok(())
}

#[test]
fn test_filter_chain_faulty_filter_is_bypassed() -> Result<()> {
    let chain = FilterChain::new(16);
    let seen = Arc::new(Mutex::new(vec![]));
    chain.add(Arc::new(FaultyFilter))?;
    chain.add(Arc::new(DoubleWidthFilter))?;
    chain.add(recording(1, &seen))?;

    let out = chain.process(frame_at(3));
    let frame = out.frame.expect("frame should survive a faulty filter");
    assert_eq!(frame.width, 1280);
    assert!(frame.data.is_empty());
    assert_eq!(out.faults.len(), 1);
    assert_eq!(*seen.lock(), vec![(3, 1)]);

    Ok(())
}

#[test]
fn test_filter_chain_dispatch_sees_consistent_snapshot() -> Result<()> {
    let chain = Arc::new(FilterChain::new(16));
    let seen = Arc::new(Mutex::new(vec![]));
    let (f1, f2, f3) = (recording(1, &seen), recording(2, &seen), recording(3, &seen));
    chain.add(f1)?;
    chain.add(f3)?;

    let writer = {
        let chain = Arc::clone(&chain);
        thread::spawn(move || {
            for _ in 0..500 {
                chain.add(Arc::clone(&f2)).unwrap();
                chain.remove(&f2).unwrap();
            }
        })
    };

    for ts in 0..2000 {
        chain.process(frame_at(ts));
    }
    writer.join().unwrap();

    let seen = seen.lock();
    for ts in 0..2000 {
        let order: Vec<u32> = seen
            .iter()
            .filter(|(t, _)| *t == ts)
            .map(|(_, id)| *id)
            .collect();
        assert!(
            order == vec![1, 3] || order == vec![1, 3, 2],
            "frame {ts} saw a torn chain: {order:?}"
        );
    }

    Ok(())
}
