// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dataset assembly over a directory of source tables.

use std::fmt::Write as _;
use std::path::Path;

use sipmpos_core::{EventSource, PixelGeometry, SipmDataset, SipmError};

fn write_table(dir: &Path, name: &str, events: &[(f32, f32, f32, f32)]) {
    // Each entry: (x, y, z, fill value for all 64 pixels).
    let mut contents = String::new();
    for (x, y, z, fill) in events {
        let counts = vec![fill.to_string(); 64].join(", ");
        writeln!(
            contents,
            r#"{{"x": {x}, "y": {y}, "z": {z}, "photon_counts": [{counts}]}}"#
        )
        .unwrap();
    }
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn concatenates_files_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "file-1.jsonl", &[(10.0, 0.0, 1.0, 2.0)]);
    write_table(
        dir.path(),
        "file-0.jsonl",
        &[(1.0, 2.0, 3.0, 1.0), (4.0, 5.0, 6.0, 1.0)],
    );

    let dataset = SipmDataset::from_dir(dir.path(), None).unwrap();
    assert_eq!(dataset.len(), 3);

    // file-0 events come first despite file-1 being written first.
    let (_, pos) = dataset.get(0).unwrap();
    assert_eq!(pos, [1.0, 2.0, 3.0]);
    let (_, pos) = dataset.get(2).unwrap();
    assert_eq!(pos, [10.0, 0.0, 1.0]);
}

#[test]
fn get_returns_single_channel_images() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "file-0.jsonl", &[(0.0, 0.0, 0.0, 7.0)]);

    let dataset = SipmDataset::from_dir(dir.path(), None).unwrap();
    let (image, _) = dataset.get(0).unwrap();
    assert_eq!(image.shape(), [1, 8, 8]);
    assert_eq!(image[[0, 4, 4]], 7.0);
}

#[test]
fn out_of_range_index_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "file-0.jsonl", &[(0.0, 0.0, 0.0, 1.0)]);

    let dataset = SipmDataset::from_dir(dir.path(), None).unwrap();
    match dataset.get(1) {
        Err(SipmError::IndexOutOfRange { index, len }) => {
            assert_eq!(index, 1);
            assert_eq!(len, 1);
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn max_files_caps_the_load() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "file-0.jsonl", &[(0.0, 0.0, 0.0, 1.0)]);
    write_table(dir.path(), "file-1.jsonl", &[(0.0, 0.0, 0.0, 1.0)]);

    let dataset = SipmDataset::from_dir(dir.path(), Some(1)).unwrap();
    assert_eq!(dataset.len(), 1);
}

#[test]
fn missing_directory_loads_zero_events() {
    let dataset = SipmDataset::from_dir(Path::new("/nonexistent/sipm-data"), None).unwrap();
    assert!(dataset.is_empty());
    assert!(matches!(
        dataset.ensure_nonempty(),
        Err(SipmError::EmptyDataset { .. })
    ));
}

#[test]
fn overlay_marker_swaps_axes_and_labels_depth() {
    let dir = tempfile::tempdir().unwrap();
    // x = 6 mm (one pitch), y = 0, z = 21.5 mm.
    write_table(dir.path(), "file-0.jsonl", &[(6.0, 0.0, 21.5, 1.0)]);

    let dataset = SipmDataset::from_dir(dir.path(), None).unwrap();
    let overlay = dataset
        .event_overlay(0, &PixelGeometry::default())
        .unwrap();

    // Horizontal marker tracks the y coordinate, vertical tracks x.
    assert!((overlay.x_pixel - 3.5).abs() < 1e-6);
    assert!((overlay.y_pixel - 4.5).abs() < 1e-6);
    assert_eq!(overlay.depth_mm, 21.5);
}
