// End-to-end: captured byte stream -> acquisition thread -> store -> render tick
use approx::assert_relative_eq;
use heatmap_decoder::protocol::encode_frame;
use heatmap_decoder::{
    AcquisitionLoop, ExitReason, HeatmapConfig, HeatmapView, ReadingStore, ReplaySource,
};
use std::io::Write;
use std::sync::Arc;

fn capture_bytes() -> Vec<u8> {
    let mut bytes = vec![0x13, 0x37, 0x00];
    for (index, temperature) in [(0, 0.0), (1, 10.0), (2, 20.0), (3, 30.0)] {
        bytes.extend_from_slice(&encode_frame(index, temperature).unwrap());
        bytes.push(0xAA);
    }
    bytes
}

#[test]
fn replayed_capture_produces_heatmap() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&capture_bytes()).unwrap();
    file.flush().unwrap();

    let config = HeatmapConfig::new().with_grid_size(3).with_alpha(0.3);
    let store = Arc::new(ReadingStore::new(config.alpha).unwrap());

    let source = ReplaySource::open(file.path()).unwrap();
    let handle = AcquisitionLoop::new(source, Arc::clone(&store), 7)
        .spawn()
        .unwrap();
    let report = handle.join();

    assert_eq!(report.exit, ExitReason::SourceExhausted);
    assert_eq!(report.stats.frames_decoded, 4);
    assert_eq!(report.stats.bytes_discarded, 7);

    let mut view = HeatmapView::new(&config);
    let frame = view.tick(&store.snapshot(), chrono::Utc::now()).unwrap();
    let grid = frame.grid.expect("all sensors reported");
    assert_relative_eq!(grid[[1, 1]], 15.0, epsilon = 1e-12);
    assert_relative_eq!(grid[[0, 0]], 0.0, epsilon = 1e-12);
    assert_relative_eq!(grid[[2, 0]], 10.0, epsilon = 1e-12);
    assert_relative_eq!(grid[[2, 2]], 20.0, epsilon = 1e-12);
    assert_relative_eq!(grid[[0, 2]], 30.0, epsilon = 1e-12);

    let range = frame.range.unwrap();
    assert!(range.changed);
    assert_relative_eq!(range.range.vmin, -0.5, epsilon = 1e-12);
    assert_relative_eq!(range.range.vmax, 30.5, epsilon = 1e-12);
}

#[test]
fn partial_capture_is_not_ready() {
    let mut bytes = encode_frame(0, 21.0).unwrap().to_vec();
    bytes.extend_from_slice(&encode_frame(2, 22.0).unwrap());
    // Truncated final frame never completes
    bytes.extend_from_slice(&[0xF3, 0x10]);

    let store = Arc::new(ReadingStore::new(0.5).unwrap());
    let source = ReplaySource::new(std::io::Cursor::new(bytes), "partial");
    let report = AcquisitionLoop::new(source, Arc::clone(&store), 64)
        .run(&std::sync::atomic::AtomicBool::new(false));

    assert_eq!(report.exit, ExitReason::SourceExhausted);
    assert_eq!(report.stats.frames_decoded, 2);

    let snapshot = store.snapshot();
    assert!(!snapshot.is_ready());
    assert_eq!(snapshot.value(3), None);

    let mut view = HeatmapView::new(&HeatmapConfig::new());
    let frame = view.tick(&snapshot, chrono::Utc::now()).unwrap();
    assert!(frame.grid.is_none());
    assert_eq!(frame.labels[2].value, Some(22.0));
}
