//! Sample mode tests

use super::vis_days;
use crate::config::CodecConfig;
use crate::processor::BatchProcessor;
use crate::store::MemoryStore;
use tempfile::TempDir;

#[test]
fn test_sample_mode_writes_at_most_n_batches() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = MemoryStore::new();
    store.insert("VIS_VQ", vis_days(&[2, 2, 2, 2, 2]));

    let config = CodecConfig::new()
        .with_output_dir(temp_dir.path())
        .with_sample(3)
        .without_progress();
    let processor = BatchProcessor::new(config, Box::new(store.clone()));
    let stats = processor.generate(&["VIS".to_string()]);

    assert_eq!(stats.batches_written, 3);
    // Three full days and the record that opened the fourth
    assert_eq!(stats.records_read, 7);
    assert_eq!(store.closed_cursors(), 1);
}

#[test]
fn test_sample_mode_with_fewer_days() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = MemoryStore::new();
    store.insert("VIS_VQ", vis_days(&[1, 1]));

    let config = CodecConfig::new()
        .with_output_dir(temp_dir.path())
        .with_sample(3)
        .without_progress();
    let processor = BatchProcessor::new(config, Box::new(store));
    let stats = processor.generate(&["VIS".to_string()]);
    assert_eq!(stats.batches_written, 2);
    assert_eq!(stats.records_read, 2);
}
