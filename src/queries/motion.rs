use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::schema::Motion;

/// Column order decoded by `MotionEvent::from_row`
pub const COLUMNS: [Motion; 5] = [
    Motion::Id,
    Motion::CameraIdentifier,
    Motion::StartTime,
    Motion::CreatedAt,
    Motion::UpdatedAt,
];

/// INSERT INTO motion (camera_identifier, start_time, created_at) VALUES (?, ?, ?)
pub fn insert(camera_identifier: &str, start_time: i64, created_at: i64) -> String {
    Query::insert()
        .into_table(Motion::Table)
        .columns([Motion::CameraIdentifier, Motion::StartTime, Motion::CreatedAt])
        .values_panic([
            camera_identifier.into(),
            start_time.into(),
            created_at.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM motion WHERE camera_identifier = ? AND start_time BETWEEN ? AND ?
/// ORDER BY start_time ASC, id ASC
pub fn select_by_camera_between(camera_identifier: &str, from: i64, to: i64) -> String {
    Query::select()
        .columns(COLUMNS)
        .from(Motion::Table)
        .and_where(Expr::col(Motion::CameraIdentifier).eq(camera_identifier))
        .and_where(Expr::col(Motion::StartTime).between(from, to))
        .order_by(Motion::StartTime, Order::Asc)
        .order_by(Motion::Id, Order::Asc)
        .to_string(SqliteQueryBuilder)
}
