//! Listing, latest lookups and deletion of recordings.
//!
//! A recording is addressed externally by camera, start date and
//! [`Recording::filename`]. Deleting a recording removes its fragments and
//! thumbnail along with the recording row in one transaction.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, error, info};
use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::constants::RECORDING_EXTENSION;
use crate::db::{begin_write, finish_transaction};
use crate::error::{Error, Result};
use crate::fragment::FragmentTimestamp;
use crate::models::{now, to_epoch, Recording};
use crate::queries::recordings::StartRange;
use crate::queries::{files, files_meta, recordings};
use crate::resolver::{resolve_fragments_at, Fragment};
use crate::store::get_recording;

/// Start-time range `[00:00, next day 00:00)` covering `date`
fn day_range(date: NaiveDate) -> StartRange {
    let from = to_epoch(date.and_time(NaiveTime::MIN));
    (from, from + 24 * 60 * 60)
}

/// Recordings of a camera, optionally limited to one calendar date, oldest first
pub async fn list_recordings<'e, E>(
    executor: E,
    camera_identifier: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<Recording>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = recordings::select_by_camera(camera_identifier, date.map(day_range));
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter().map(Recording::from_row).collect()
}

/// The recording with the latest start time, optionally within one date
pub async fn latest_recording<'e, E>(
    executor: E,
    camera_identifier: &str,
    date: Option<NaiveDate>,
) -> Result<Option<Recording>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = recordings::select_latest(camera_identifier, date.map(day_range));
    let row = sqlx::query(&sql).fetch_optional(executor).await?;
    row.map(|row| Recording::from_row(&row)).transpose()
}

/// For every date with at least one recording, the one that started last that day
pub async fn latest_recording_daily<'e, E>(
    executor: E,
    camera_identifier: &str,
) -> Result<BTreeMap<NaiveDate, Recording>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = recordings::select_by_camera_newest_first(camera_identifier, None);
    let rows = sqlx::query(&sql).fetch_all(executor).await?;

    let mut daily = BTreeMap::new();
    for row in &rows {
        let recording = Recording::from_row(row)?;
        // Rows arrive newest first, so the first one seen per date wins
        daily.entry(recording.date()).or_insert(recording);
    }
    Ok(daily)
}

/// [`list_recordings`] for every camera in `cameras`
pub async fn list_recordings_all(
    pool: &SqlitePool,
    cameras: &[String],
    date: Option<NaiveDate>,
) -> Result<BTreeMap<String, Vec<Recording>>> {
    let mut all = BTreeMap::new();
    for camera in cameras {
        all.insert(camera.clone(), list_recordings(pool, camera, date).await?);
    }
    Ok(all)
}

/// [`latest_recording`] for every camera in `cameras`
pub async fn latest_recording_all(
    pool: &SqlitePool,
    cameras: &[String],
    date: Option<NaiveDate>,
) -> Result<BTreeMap<String, Option<Recording>>> {
    let mut all = BTreeMap::new();
    for camera in cameras {
        all.insert(camera.clone(), latest_recording(pool, camera, date).await?);
    }
    Ok(all)
}

/// [`latest_recording_daily`] for every camera in `cameras`
pub async fn latest_recording_daily_all(
    pool: &SqlitePool,
    cameras: &[String],
) -> Result<BTreeMap<String, BTreeMap<NaiveDate, Recording>>> {
    let mut all = BTreeMap::new();
    for camera in cameras {
        all.insert(camera.clone(), latest_recording_daily(pool, camera).await?);
    }
    Ok(all)
}

/// Parse an external recording filename (`<encoded start>.mp4`) into its start.
pub fn parse_recording_filename(filename: &str) -> Result<FragmentTimestamp> {
    let stem = filename
        .strip_suffix(RECORDING_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "recording filename '{}' must end in .{}",
                filename, RECORDING_EXTENSION
            ))
        })?;
    if stem.len() != FragmentTimestamp::WIDTH {
        return Err(Error::InvalidArgument(format!(
            "recording filename '{}' must be a {}-digit timestamp",
            filename,
            FragmentTimestamp::WIDTH
        )));
    }
    Ok(FragmentTimestamp::decode(stem)?)
}

/// Which recordings of a camera a delete targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteScope {
    /// Every recording of the camera
    Camera,
    /// Recordings that started on one date
    Date(NaiveDate),
    /// Exactly one recording
    Recording { date: NaiveDate, filename: String },
}

impl DeleteScope {
    pub fn from_parts(date: Option<NaiveDate>, filename: Option<&str>) -> Result<Self> {
        match (date, filename) {
            (None, None) => Ok(Self::Camera),
            (Some(date), None) => Ok(Self::Date(date)),
            (Some(date), Some(filename)) => Ok(Self::Recording {
                date,
                filename: filename.to_string(),
            }),
            (None, Some(filename)) => Err(Error::InvalidArgument(format!(
                "filename '{}' given without a date",
                filename
            ))),
        }
    }
}

/// Outcome of deleting one recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingDeletion {
    pub recording_id: i64,
    /// File rows removed (fragments and thumbnail)
    pub files_removed: u64,
    /// Fragments left in place because another recording still resolves them
    pub fragments_shared: usize,
}

/// Outcome of a delete call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: Vec<RecordingDeletion>,
}

impl DeleteReport {
    pub fn files_removed(&self) -> u64 {
        self.deleted.iter().map(|d| d.files_removed).sum()
    }
}

async fn delete_targets(
    pool: &SqlitePool,
    camera_identifier: &str,
    scope: &DeleteScope,
) -> Result<Vec<Recording>> {
    match scope {
        DeleteScope::Camera => list_recordings(pool, camera_identifier, None).await,
        DeleteScope::Date(date) => list_recordings(pool, camera_identifier, Some(*date)).await,
        DeleteScope::Recording { date, filename } => {
            let start = parse_recording_filename(filename)?;
            let sql = recordings::select_by_camera_and_start(camera_identifier, start.secs());
            let rows = sqlx::query(&sql).fetch_all(pool).await?;
            let mut found = Vec::new();
            for row in &rows {
                let recording = Recording::from_row(row)?;
                if recording.date() == *date {
                    found.push(recording);
                }
            }
            if found.is_empty() {
                return Err(Error::NotFound(format!(
                    "recording {}/{}/{}",
                    camera_identifier, date, filename
                )));
            }
            Ok(found)
        }
    }
}

/// Delete the recordings selected by `scope` and their fragments.
///
/// Each recording is removed in its own transaction. The first failure stops
/// the operation; recordings already processed stay deleted in full. With a
/// camera or date scope, a target that disappeared before its transaction
/// began counts as already deleted.
pub async fn try_delete_recordings(
    pool: &SqlitePool,
    camera_identifier: &str,
    scope: &DeleteScope,
    lookback_secs: u64,
) -> Result<DeleteReport> {
    let targets = delete_targets(pool, camera_identifier, scope).await?;
    let explicit = matches!(scope, DeleteScope::Recording { .. });
    let mut report = DeleteReport::default();
    for recording in &targets {
        match delete_recording(pool, recording, lookback_secs).await {
            Ok(deletion) => report.deleted.push(deletion),
            // Removed by a concurrent delete since the targets were listed
            Err(Error::NotFound(_)) if !explicit => {
                debug!("Recording {} already deleted", recording.id);
            }
            Err(source) => {
                return Err(Error::DeleteFailure {
                    recording_id: recording.id,
                    source: Box::new(source),
                })
            }
        }
    }
    info!(
        "Deleted {} recordings ({} files) for camera '{}'",
        report.deleted.len(),
        report.files_removed(),
        camera_identifier
    );
    Ok(report)
}

/// Delete recordings of a camera scoped by date and filename.
/// Returns false, after logging the cause, when the delete did not complete.
pub async fn delete_recordings(
    pool: &SqlitePool,
    camera_identifier: &str,
    date: Option<NaiveDate>,
    filename: Option<&str>,
    lookback_secs: u64,
) -> bool {
    let result = match DeleteScope::from_parts(date, filename) {
        Ok(scope) => try_delete_recordings(pool, camera_identifier, &scope, lookback_secs).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(_) => true,
        Err(err) => {
            error!(
                "Failed to delete recording. Date={:?} filename={:?}: {}",
                date, filename, err
            );
            false
        }
    }
}

/// Delete one recording, its fragments and its thumbnail atomically.
pub async fn delete_recording(
    pool: &SqlitePool,
    recording: &Recording,
    lookback_secs: u64,
) -> Result<RecordingDeletion> {
    let mut tx = begin_write(pool).await?;
    let result = delete_recording_in(&mut *tx, recording.id, lookback_secs, now()).await;
    finish_transaction(tx, result).await
}

/// Body of [`delete_recording`], run on the caller's transaction.
pub async fn delete_recording_in(
    conn: &mut SqliteConnection,
    recording_id: i64,
    lookback_secs: u64,
    now: NaiveDateTime,
) -> Result<RecordingDeletion> {
    // Re-read inside the transaction; another caller may have removed it
    let recording = get_recording(&mut *conn, recording_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("recording {}", recording_id)))?;

    let fragments = resolve_fragments_at(&mut *conn, &recording, lookback_secs, now).await?;
    let shared = shared_fragment_paths(&mut *conn, &recording, &fragments, lookback_secs, now).await?;

    let mut paths: Vec<String> = fragments
        .iter()
        .map(|fragment| fragment.file.path.clone())
        .filter(|path| !shared.contains(path))
        .collect();
    if !recording.thumbnail_path.is_empty() {
        paths.push(recording.thumbnail_path.clone());
    }

    let mut files_removed = 0;
    if !paths.is_empty() {
        sqlx::query(&files_meta::delete_by_paths(&paths))
            .execute(&mut *conn)
            .await?;
        files_removed = sqlx::query(&files::delete_by_paths(&paths))
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    let removed = sqlx::query(&recordings::delete_by_id(recording.id))
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if removed == 0 {
        return Err(Error::NotFound(format!("recording {}", recording.id)));
    }

    debug!(
        "Deleted recording {} of '{}' with {} files, kept {} shared fragments",
        recording.id,
        recording.camera_identifier,
        files_removed,
        shared.len()
    );
    Ok(RecordingDeletion {
        recording_id: recording.id,
        files_removed,
        fragments_shared: shared.len(),
    })
}

/// Paths among `fragments` that another recording of the same camera still resolves.
async fn shared_fragment_paths(
    conn: &mut SqliteConnection,
    recording: &Recording,
    fragments: &[Fragment],
    lookback_secs: u64,
    now: NaiveDateTime,
) -> Result<HashSet<String>> {
    let Some(span_from) = fragments.iter().map(|f| f.start.secs()).min() else {
        return Ok(HashSet::new());
    };
    let span_to = fragments
        .iter()
        .map(|f| f.end_secs().map(|end| end.ceil() as i64).unwrap_or(f.start.secs()))
        .max()
        .unwrap_or(span_from);

    let lookback = i64::try_from(lookback_secs).unwrap_or(i64::MAX);
    let sql = recordings::select_siblings_overlapping(
        &recording.camera_identifier,
        recording.id,
        span_from,
        span_to,
        lookback,
    );
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    let ours: HashSet<&str> = fragments.iter().map(|f| f.file.path.as_str()).collect();
    let mut shared = HashSet::new();
    for row in &rows {
        let sibling = Recording::from_row(row)?;
        for fragment in resolve_fragments_at(&mut *conn, &sibling, lookback_secs, now).await? {
            if ours.contains(fragment.file.path.as_str()) {
                shared.insert(fragment.file.path);
            }
        }
    }
    Ok(shared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_filename_round_trips_start() {
        assert_eq!(
            parse_recording_filename("1700000000.mp4").unwrap(),
            FragmentTimestamp::new(1_700_000_000).unwrap()
        );
    }

    #[test]
    fn recording_filename_rejects_other_shapes() {
        assert!(parse_recording_filename("1700000000.m4s").is_err());
        assert!(parse_recording_filename("170000000.mp4").is_err());
        assert!(parse_recording_filename("17000000000.mp4").is_err());
        assert!(parse_recording_filename("abcdefghij.mp4").is_err());
        assert!(parse_recording_filename("1700000000mp4").is_err());
    }

    #[test]
    fn delete_scope_requires_date_with_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(DeleteScope::from_parts(None, None).unwrap(), DeleteScope::Camera);
        assert_eq!(DeleteScope::from_parts(Some(date), None).unwrap(), DeleteScope::Date(date));
        assert!(matches!(
            DeleteScope::from_parts(Some(date), Some("1709251200.mp4")).unwrap(),
            DeleteScope::Recording { .. }
        ));
        assert!(DeleteScope::from_parts(None, Some("1709251200.mp4")).is_err());
    }

    #[test]
    fn day_range_spans_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(day_range(date), (1_709_251_200, 1_709_337_600));
    }
}
