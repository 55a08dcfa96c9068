use sea_query::{Expr, Order, Query, SelectStatement, SqliteQueryBuilder};

use crate::models::NewRecording;
use crate::schema::Recordings;

/// Column order decoded by `Recording::from_row`
pub const COLUMNS: [Recordings; 9] = [
    Recordings::Id,
    Recordings::CameraIdentifier,
    Recordings::StartTime,
    Recordings::EndTime,
    Recordings::TriggerType,
    Recordings::TriggerId,
    Recordings::ThumbnailPath,
    Recordings::CreatedAt,
    Recordings::UpdatedAt,
];

/// Half-open `[from, to)` range of start times, in epoch seconds
pub type StartRange = (i64, i64);

/// INSERT INTO recordings (camera_identifier, start_time, trigger_type, trigger_id, thumbnail_path, created_at)
/// VALUES (?, ?, ?, ?, ?, ?)
pub fn insert(recording: &NewRecording, start_time: i64, created_at: i64) -> String {
    Query::insert()
        .into_table(Recordings::Table)
        .columns([
            Recordings::CameraIdentifier,
            Recordings::StartTime,
            Recordings::TriggerType,
            Recordings::TriggerId,
            Recordings::ThumbnailPath,
            Recordings::CreatedAt,
        ])
        .values_panic([
            recording.camera_identifier.as_str().into(),
            start_time.into(),
            recording.trigger_type.clone().into(),
            recording.trigger_id.into(),
            recording.thumbnail_path.as_str().into(),
            created_at.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM recordings WHERE id = ?
pub fn select_by_id(id: i64) -> String {
    Query::select()
        .columns(COLUMNS)
        .from(Recordings::Table)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

fn select_for_camera(camera_identifier: &str, range: Option<StartRange>) -> SelectStatement {
    let mut query = Query::select();
    query
        .columns(COLUMNS)
        .from(Recordings::Table)
        .and_where(Expr::col(Recordings::CameraIdentifier).eq(camera_identifier));
    if let Some((from, to)) = range {
        query
            .and_where(Expr::col(Recordings::StartTime).gte(from))
            .and_where(Expr::col(Recordings::StartTime).lt(to));
    }
    query
}

/// SELECT <columns> FROM recordings WHERE camera_identifier = ? [AND start_time >= ? AND start_time < ?]
/// ORDER BY start_time ASC, id ASC
pub fn select_by_camera(camera_identifier: &str, range: Option<StartRange>) -> String {
    select_for_camera(camera_identifier, range)
        .order_by(Recordings::StartTime, Order::Asc)
        .order_by(Recordings::Id, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM recordings WHERE camera_identifier = ? [AND start_time in range]
/// ORDER BY start_time DESC, id DESC
pub fn select_by_camera_newest_first(camera_identifier: &str, range: Option<StartRange>) -> String {
    select_for_camera(camera_identifier, range)
        .order_by(Recordings::StartTime, Order::Desc)
        .order_by(Recordings::Id, Order::Desc)
        .to_string(SqliteQueryBuilder)
}

/// Same as [`select_by_camera_newest_first`] with LIMIT 1
pub fn select_latest(camera_identifier: &str, range: Option<StartRange>) -> String {
    select_for_camera(camera_identifier, range)
        .order_by(Recordings::StartTime, Order::Desc)
        .order_by(Recordings::Id, Order::Desc)
        .limit(1)
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM recordings WHERE camera_identifier = ? AND start_time = ?
pub fn select_by_camera_and_start(camera_identifier: &str, start_time: i64) -> String {
    select_for_camera(camera_identifier, None)
        .and_where(Expr::col(Recordings::StartTime).eq(start_time))
        .order_by(Recordings::Id, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// Recordings of a camera, other than `exclude_id`, that can reach fragments in
/// `[span_from, span_to]` once their start is pulled back by `lookback` seconds:
///
/// SELECT <columns> FROM recordings
/// WHERE camera_identifier = ? AND id != ? AND start_time <= ? + lookback
///   AND (end_time IS NULL OR end_time >= ?)
pub fn select_siblings_overlapping(
    camera_identifier: &str,
    exclude_id: i64,
    span_from: i64,
    span_to: i64,
    lookback: i64,
) -> String {
    select_for_camera(camera_identifier, None)
        .and_where(Expr::col(Recordings::Id).ne(exclude_id))
        .and_where(Expr::col(Recordings::StartTime).lte(span_to.saturating_add(lookback)))
        .and_where(
            Expr::col(Recordings::EndTime)
                .is_null()
                .or(Expr::col(Recordings::EndTime).gte(span_from)),
        )
        .order_by(Recordings::StartTime, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// UPDATE recordings SET end_time = ?, updated_at = ? WHERE id = ?
pub fn finalize(id: i64, end_time: i64, updated_at: i64) -> String {
    Query::update()
        .table(Recordings::Table)
        .value(Recordings::EndTime, end_time)
        .value(Recordings::UpdatedAt, updated_at)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM recordings WHERE id = ?
pub fn delete_by_id(id: i64) -> String {
    Query::delete()
        .from_table(Recordings::Table)
        .and_where(Expr::col(Recordings::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}
