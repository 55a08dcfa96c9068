use chrono::NaiveDateTime;
use serde_json::{json, Map, Value};

use camera_recordings::db::SyncDb;
use camera_recordings::fragment::{FragmentTimestamp, FragmentWindow, Inclusion};
use camera_recordings::models::{from_epoch, NewFile, NewFileMeta, NewRecording, Recording};
use camera_recordings::resolver::{resolve_fragments_at, resolve_window, Fragment};
use camera_recordings::store;
use camera_recordings::tier::{Placement, TierId};

const CAMERA: &str = "front_door";

/// Helper to create a test database
/// Returns (db, _guard) - keep _guard alive to prevent temp file deletion
fn create_test_database() -> (SyncDb, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = SyncDb::connect(&dir.path().join("test.sqlite")).unwrap();
    (db, dir)
}

fn at(secs: i64) -> NaiveDateTime {
    from_epoch(secs).unwrap()
}

fn meta_with_duration(duration: Option<f64>) -> Map<String, Value> {
    let value = match duration {
        Some(d) => json!({"m3u8": {"EXTINF": d}, "codec": "h264"}),
        None => json!({"codec": "h264"}),
    };
    match value {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn new_file(camera: &str, filename: &str) -> NewFile {
    let directory = format!("/mnt/hot/{}", camera);
    NewFile {
        tier_id: TierId(0),
        camera_identifier: camera.to_string(),
        category: "recorder".to_string(),
        path: format!("{}/{}", directory, filename),
        directory,
        filename: filename.to_string(),
        size: 4096,
    }
}

/// Helper to insert a fragment file with metadata, returns its path
fn insert_named_fragment(db: &SyncDb, camera: &str, filename: &str, duration: Option<f64>) -> String {
    let file = new_file(camera, filename);
    let meta = NewFileMeta::new(file.path.clone(), meta_with_duration(duration));
    db.block_on(store::insert_fragment(db.pool(), &file, &meta))
        .unwrap();
    file.path
}

fn insert_fragment(db: &SyncDb, camera: &str, start: i64, duration: Option<f64>) -> String {
    let filename = FragmentTimestamp::new(start).unwrap().fragment_filename(".m4s");
    insert_named_fragment(db, camera, &filename, duration)
}

/// Helper to insert a recording, finalized when `end` is given
fn insert_recording(db: &SyncDb, camera: &str, start: i64, end: Option<i64>) -> Recording {
    let new = NewRecording {
        camera_identifier: camera.to_string(),
        start_time: at(start),
        trigger_type: Some("object".to_string()),
        trigger_id: None,
        thumbnail_path: String::new(),
    };
    db.block_on(async {
        let id = store::insert_recording(db.pool(), &new).await.unwrap();
        match end {
            Some(end) => {
                let mut conn = db.pool().acquire().await.unwrap();
                store::finalize_recording(&mut conn, id, at(end)).await.unwrap()
            }
            None => store::get_recording(db.pool(), id).await.unwrap().unwrap(),
        }
    })
}

fn resolve(db: &SyncDb, recording: &Recording, lookback: u64, now: i64) -> Vec<Fragment> {
    db.block_on(resolve_fragments_at(db.pool(), recording, lookback, at(now)))
        .unwrap()
}

fn starts(fragments: &[Fragment]) -> Vec<i64> {
    fragments.iter().map(|f| f.start.secs()).collect()
}

#[test]
fn test_includes_fragment_covering_window_start() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 990, Some(20.0));
    for start in [1000, 1100, 1200, 1300, 1400] {
        insert_fragment(&db, CAMERA, start, Some(100.0));
    }
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    let fragments = resolve(&db, &recording, 0, 5000);

    assert_eq!(starts(&fragments), vec![990, 1000, 1100, 1200, 1300]);
    assert_eq!(fragments[0].inclusion, Inclusion::CoversStart);
    assert!(fragments[1..].iter().all(|f| f.inclusion == Inclusion::InWindow));
    assert_eq!(fragments[0].meta.duration, Some(20.0));
}

#[test]
fn test_excludes_fragment_ending_before_window() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 900, Some(50.0));
    insert_fragment(&db, CAMERA, 1000, Some(100.0));
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    assert_eq!(starts(&resolve(&db, &recording, 0, 5000)), vec![1000]);
}

#[test]
fn test_lookback_extends_window_start() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 900, Some(50.0));
    insert_fragment(&db, CAMERA, 1000, Some(100.0));
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    let fragments = resolve(&db, &recording, 100, 5000);
    assert_eq!(starts(&fragments), vec![900, 1000]);
    assert_eq!(fragments[0].inclusion, Inclusion::InWindow);
}

#[test]
fn test_open_recording_extends_to_now() {
    let (db, _guard) = create_test_database();
    for start in [1000, 1100, 1200, 1300] {
        insert_fragment(&db, CAMERA, start, Some(100.0));
    }
    let recording = insert_recording(&db, CAMERA, 1000, None);

    assert_eq!(starts(&resolve(&db, &recording, 0, 1250)), vec![1000, 1100, 1200]);
    assert_eq!(
        starts(&resolve(&db, &recording, 0, 9000)),
        vec![1000, 1100, 1200, 1300]
    );
}

#[test]
fn test_empty_window_is_not_an_error() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 5000, Some(10.0));
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    assert!(resolve(&db, &recording, 0, 9000).is_empty());
}

#[test]
fn test_filters_camera_category_and_extension() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 1000, Some(100.0));
    insert_fragment(&db, "garage", 1100, Some(100.0));

    let mut snapshot = new_file(CAMERA, "0000001100.jpg");
    snapshot.category = "snapshot".to_string();
    db.block_on(store::insert_file(db.pool(), &snapshot)).unwrap();

    let mut other_category = new_file(CAMERA, "0000001200.m4s");
    other_category.path = "/mnt/hot/front_door/objects/0000001200.m4s".to_string();
    other_category.category = "object_detector".to_string();
    db.block_on(store::insert_file(db.pool(), &other_category)).unwrap();

    insert_named_fragment(&db, CAMERA, "0000001250.mp4", Some(100.0));

    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));
    assert_eq!(starts(&resolve(&db, &recording, 0, 9000)), vec![1000]);
}

#[test]
fn test_output_sorted_regardless_of_insert_order() {
    let (db, _guard) = create_test_database();
    for start in [1200, 1000, 1300, 1100, 995] {
        insert_fragment(&db, CAMERA, start, Some(100.0));
    }
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    assert_eq!(
        starts(&resolve(&db, &recording, 0, 9000)),
        vec![995, 1000, 1100, 1200, 1300]
    );
}

#[test]
fn test_skips_undecodable_filename() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 1000, Some(100.0));
    // Sorts between the encoded bounds but is not a timestamp
    insert_named_fragment(&db, CAMERA, "00000010x0.m4s", Some(100.0));
    insert_fragment(&db, CAMERA, 1100, Some(100.0));
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    let fragments = resolve(&db, &recording, 0, 9000);
    assert_eq!(starts(&fragments), vec![1000, 1100]);
}

#[test]
fn test_skips_fragment_without_metadata_row() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 1000, Some(100.0));
    let orphan = new_file(CAMERA, "0000001100.m4s");
    db.block_on(store::insert_file(db.pool(), &orphan)).unwrap();
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    assert_eq!(starts(&resolve(&db, &recording, 0, 9000)), vec![1000]);
}

#[test]
fn test_pre_window_fragment_without_duration_is_ineligible() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 995, None);
    insert_fragment(&db, CAMERA, 1000, None);
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    let fragments = resolve(&db, &recording, 0, 9000);
    assert_eq!(starts(&fragments), vec![1000]);
    assert_eq!(fragments[0].meta.duration, None);
}

#[test]
fn test_reads_current_tier_placement() {
    let (db, _guard) = create_test_database();
    insert_fragment(&db, CAMERA, 1000, Some(100.0));
    let moved = insert_fragment(&db, CAMERA, 1100, Some(100.0));
    let recording = insert_recording(&db, CAMERA, 1000, Some(1300));

    let before = resolve(&db, &recording, 0, 9000);
    assert_eq!(before[1].file.tier_id, TierId(0));

    let placement = Placement::new(TierId(1), "/mnt/archive/front_door/0000001100.m4s").unwrap();
    db.block_on(store::update_file_placement(db.pool(), &moved, &placement))
        .unwrap();

    let after = resolve(&db, &recording, 0, 9000);
    assert_eq!(starts(&after), vec![1000, 1100]);
    assert_eq!(after[1].file.tier_id, TierId(1));
    assert_eq!(after[1].file.path, "/mnt/archive/front_door/0000001100.m4s");
    assert_eq!(after[1].file.directory, "/mnt/archive/front_door");
    // Metadata follows the path change
    assert_eq!(after[1].meta.path, after[1].file.path);
    assert_eq!(after[1].meta.duration, Some(100.0));
}

#[test]
fn test_matches_inclusion_rule_for_every_fragment() {
    let (db, _guard) = create_test_database();
    let mut inserted = Vec::new();
    for i in 0..40i64 {
        let start = 700 + i * 23;
        let duration = match i % 4 {
            0 => None,
            n => Some((i * 7 % 60) as f64 + n as f64 * 0.25),
        };
        insert_fragment(&db, CAMERA, start, duration);
        inserted.push((start, duration));
    }

    for (window_start, window_end) in [(1000, 1300), (700, 800), (1500, 1500), (1611, 2000)] {
        let window = FragmentWindow::new(
            FragmentTimestamp::new(window_start).unwrap(),
            FragmentTimestamp::new(window_end).unwrap(),
        );
        let resolved = db
            .block_on(resolve_window(db.pool(), CAMERA, &window))
            .unwrap();

        let expected: Vec<i64> = inserted
            .iter()
            .filter(|(t, d)| {
                (window_start <= *t && *t <= window_end)
                    || (*t < window_start
                        && d.map(|d| *t as f64 + d >= window_start as f64).unwrap_or(false))
            })
            .map(|(t, _)| *t)
            .collect();

        assert_eq!(
            starts(&resolved),
            expected,
            "window [{}, {}]",
            window_start,
            window_end
        );
    }
}
