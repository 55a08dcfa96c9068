//! Read and write primitives over the entity relations.
//!
//! Single-statement operations accept any executor (pool, connection or
//! `&mut *tx`). Operations made of several statements take a connection so
//! the caller decides the transaction scope; [`insert_fragment`] opens its own.

use chrono::NaiveDateTime;
use log::debug;
use sqlx::sqlite::SqliteConnection;
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::db::{begin_write, finish_transaction};
use crate::error::{Error, Result};
use crate::models::{
    now, to_epoch, DetectedObject, File, FileMeta, MotionEvent, NewDetectedObject, NewFile,
    NewFileMeta, NewRecording, Recording,
};
use crate::queries::{files, files_meta, motion, objects, recordings};
use crate::tier::Placement;

/// Insert a file row, returning its id
pub async fn insert_file<'e, E>(executor: E, file: &NewFile) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = files::insert(file, to_epoch(now()));
    let result = sqlx::query(&sql).execute(executor).await?;
    Ok(result.last_insert_rowid())
}

/// Insert metadata for an existing file.
/// Fails with `IntegrityViolation` when no file row carries `meta.path`.
pub async fn insert_file_meta(conn: &mut SqliteConnection, meta: &NewFileMeta) -> Result<i64> {
    let exists = sqlx::query(&files::exists(&meta.path))
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(Error::IntegrityViolation(format!(
            "metadata for '{}' has no matching file",
            meta.path
        )));
    }

    let meta_json = serde_json::to_string(&meta.meta)?;
    let sql = files_meta::insert(&meta.path, meta.duration, &meta_json, to_epoch(now()));
    let result = sqlx::query(&sql).execute(&mut *conn).await?;
    Ok(result.last_insert_rowid())
}

/// Insert a file and its metadata together, as the capture pipeline writes a fragment
pub async fn insert_fragment(
    pool: &SqlitePool,
    file: &NewFile,
    meta: &NewFileMeta,
) -> Result<(i64, i64)> {
    if file.path != meta.path {
        return Err(Error::IntegrityViolation(format!(
            "file path '{}' does not match metadata path '{}'",
            file.path, meta.path
        )));
    }

    let mut tx = begin_write(pool).await?;
    let result = async {
        let file_id = insert_file(&mut *tx, file).await?;
        let meta_id = insert_file_meta(&mut *tx, meta).await?;
        Ok::<_, Error>((file_id, meta_id))
    }
    .await;
    finish_transaction(tx, result).await
}

pub async fn get_file<'e, E>(executor: E, path: &str) -> Result<Option<File>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&files::select_by_path(path))
        .fetch_optional(executor)
        .await?;
    row.map(|row| File::from_row(&row, 0)).transpose()
}

pub async fn get_file_meta<'e, E>(executor: E, path: &str) -> Result<Option<FileMeta>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&files_meta::select_by_path(path))
        .fetch_optional(executor)
        .await?;
    row.map(|row| FileMeta::from_row(&row, 0)).transpose()
}

/// Record that a file now lives at `placement`.
/// Used by the tier mover; the metadata row follows the path change through
/// the foreign key.
pub async fn update_file_placement<'e, E>(
    executor: E,
    old_path: &str,
    placement: &Placement,
) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = files::update_placement(old_path, placement, to_epoch(now()));
    let result = sqlx::query(&sql).execute(executor).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("file '{}'", old_path)));
    }
    debug!(
        "Moved '{}' to tier {} at '{}'",
        old_path, placement.tier_id, placement.path
    );
    Ok(())
}

/// Count file rows belonging to a camera
pub async fn count_files<'e, E>(executor: E, camera_identifier: &str) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(&files::count_for_camera(camera_identifier))
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Insert a new, still open recording, returning its id
pub async fn insert_recording<'e, E>(executor: E, recording: &NewRecording) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = recordings::insert(recording, to_epoch(recording.start_time), to_epoch(now()));
    let result = sqlx::query(&sql).execute(executor).await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_recording<'e, E>(executor: E, id: i64) -> Result<Option<Recording>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(&recordings::select_by_id(id))
        .fetch_optional(executor)
        .await?;
    row.map(|row| Recording::from_row(&row)).transpose()
}

/// Close a recording at `end_time`, which may not precede its start
pub async fn finalize_recording(
    conn: &mut SqliteConnection,
    id: i64,
    end_time: NaiveDateTime,
) -> Result<Recording> {
    let recording = get_recording(&mut *conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("recording {}", id)))?;
    if end_time < recording.start_time {
        return Err(Error::InvalidArgument(format!(
            "end time {} precedes start time {} of recording {}",
            end_time, recording.start_time, id
        )));
    }

    let sql = recordings::finalize(id, to_epoch(end_time), to_epoch(now()));
    sqlx::query(&sql).execute(&mut *conn).await?;

    get_recording(&mut *conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("recording {}", id)))
}

pub async fn insert_detected_object<'e, E>(executor: E, object: &NewDetectedObject) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = objects::insert(object, to_epoch(object.detected_at));
    let result = sqlx::query(&sql).execute(executor).await?;
    Ok(result.last_insert_rowid())
}

/// Objects detected by a camera within `[from, to]`
pub async fn list_detected_objects<'e, E>(
    executor: E,
    camera_identifier: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<DetectedObject>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = objects::select_by_camera_between(camera_identifier, to_epoch(from), to_epoch(to));
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter().map(DetectedObject::from_row).collect()
}

pub async fn insert_motion_event<'e, E>(
    executor: E,
    camera_identifier: &str,
    start_time: NaiveDateTime,
) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = motion::insert(camera_identifier, to_epoch(start_time), to_epoch(now()));
    let result = sqlx::query(&sql).execute(executor).await?;
    Ok(result.last_insert_rowid())
}

/// Motion events of a camera starting within `[from, to]`
pub async fn list_motion_events<'e, E>(
    executor: E,
    camera_identifier: &str,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<MotionEvent>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = motion::select_by_camera_between(camera_identifier, to_epoch(from), to_epoch(to));
    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter().map(MotionEvent::from_row).collect()
}
