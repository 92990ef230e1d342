// SPDX-License-Identifier: MIT OR Apache-2.0

//! Re-chunking utility behaviour.

use std::fmt::Write as _;
use std::path::Path;

use sipmpos_core::reformat::{read_image_chunk, reformat_dir, CHUNK_SIZE};
use sipmpos_core::SipmError;

fn write_events(dir: &Path, name: &str, count: usize, start: usize, header: Option<&str>) {
    let mut contents = String::new();
    if let Some(header) = header {
        writeln!(contents, "{header}").unwrap();
    }
    for i in 0..count {
        let id = start + i;
        // Cheap but distinguishable pixel pattern.
        let counts = vec![format!("{}", (id % 7) as f32); 64].join(",");
        writeln!(
            contents,
            r#"{{"x": {}.5, "y": 0.0, "z": 1.0, "photon_counts": [{counts}]}}"#,
            id
        )
        .unwrap();
    }
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn chunks_merge_across_files_with_monotone_event_ids() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    // 25 000 events split unevenly across three files.
    write_events(input.path(), "file-0.jsonl", 12_000, 0, None);
    write_events(input.path(), "file-1.jsonl", 8_000, 12_000, None);
    write_events(input.path(), "file-2.jsonl", 5_000, 20_000, None);

    let chunks = reformat_dir(input.path(), output.path()).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(
        chunks.iter().map(|c| c.len).collect::<Vec<_>>(),
        [10_000, 10_000, 5_000]
    );
    assert_eq!(
        chunks.iter().map(|c| c.first_event_id).collect::<Vec<_>>(),
        [0, 10_000, 20_000]
    );

    // Spot-check the CSV of the last chunk: ids continue from 20 000.
    let csv = std::fs::read_to_string(&chunks[2].metadata_csv).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), "event_id,initial_x,initial_y,initial_z");
    assert!(lines.next().unwrap().starts_with("20000,"));

    // Binary pair carries the matching tensor shape.
    let tensor = read_image_chunk(&chunks[2].images_bin).unwrap();
    assert_eq!(tensor.shape, [5_000, 8, 8]);
    assert_eq!(tensor.data.len(), 5_000 * 64);
}

#[test]
fn partial_single_chunk() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_events(input.path(), "file-0.jsonl", 3, 0, None);

    let chunks = reformat_dir(input.path(), output.path()).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].len, 3);
    assert!(chunks[0].len < CHUNK_SIZE);

    let csv = std::fs::read_to_string(&chunks[0].metadata_csv).unwrap();
    assert_eq!(csv.lines().count(), 4); // header + 3 events
}

#[test]
fn simulation_parameters_are_sorted_and_schema_free() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_events(
        input.path(),
        "file-0.jsonl",
        1,
        0,
        Some(r#"{"metadata": {"seed": "42", "crystal": "CsI", "schema": "x y z photon_counts"}}"#),
    );

    reformat_dir(input.path(), output.path()).unwrap();
    let text = std::fs::read_to_string(output.path().join("simulation_parameters.txt")).unwrap();
    assert_eq!(text, "crystal  => CsI\nseed  => 42\n");
}

#[test]
fn creates_missing_output_directory() {
    let input = tempfile::tempdir().unwrap();
    let output_root = tempfile::tempdir().unwrap();
    let output = output_root.path().join("nested").join("out");
    write_events(input.path(), "file-0.jsonl", 2, 0, None);

    let chunks = reformat_dir(input.path(), &output).unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(output.join("metadata_00.csv").exists());
    assert!(output.join("images_00.bin").exists());
}

#[test]
fn malformed_row_aborts_the_run() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(
        input.path().join("file-0.jsonl"),
        r#"{"x": 0.0, "y": 0.0, "z": 0.0, "photon_counts": [1.0, 2.0]}"#,
    )
    .unwrap();

    assert!(matches!(
        reformat_dir(input.path(), output.path()),
        Err(SipmError::MalformedInput { .. })
    ));
}

#[test]
fn empty_input_writes_nothing() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let chunks = reformat_dir(input.path(), output.path()).unwrap();
    assert!(chunks.is_empty());
    assert!(!output.path().join("simulation_parameters.txt").exists());
}
