use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::models::NewDetectedObject;
use crate::schema::Objects;

/// Column order decoded by `DetectedObject::from_row`
pub const COLUMNS: [Objects; 13] = [
    Objects::Id,
    Objects::CameraIdentifier,
    Objects::Label,
    Objects::Confidence,
    Objects::Width,
    Objects::Height,
    Objects::X1,
    Objects::Y1,
    Objects::X2,
    Objects::Y2,
    Objects::Zone,
    Objects::CreatedAt,
    Objects::UpdatedAt,
];

/// INSERT INTO objects (camera_identifier, label, confidence, width, height, x1, y1, x2, y2, zone, created_at)
/// VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
pub fn insert(object: &NewDetectedObject, created_at: i64) -> String {
    Query::insert()
        .into_table(Objects::Table)
        .columns([
            Objects::CameraIdentifier,
            Objects::Label,
            Objects::Confidence,
            Objects::Width,
            Objects::Height,
            Objects::X1,
            Objects::Y1,
            Objects::X2,
            Objects::Y2,
            Objects::Zone,
            Objects::CreatedAt,
        ])
        .values_panic([
            object.camera_identifier.as_str().into(),
            object.label.as_str().into(),
            object.confidence.into(),
            object.width.into(),
            object.height.into(),
            object.x1.into(),
            object.y1.into(),
            object.x2.into(),
            object.y2.into(),
            object.zone.clone().into(),
            created_at.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM objects WHERE camera_identifier = ? AND created_at BETWEEN ? AND ?
/// ORDER BY created_at ASC, id ASC
pub fn select_by_camera_between(camera_identifier: &str, from: i64, to: i64) -> String {
    Query::select()
        .columns(COLUMNS)
        .from(Objects::Table)
        .and_where(Expr::col(Objects::CameraIdentifier).eq(camera_identifier))
        .and_where(Expr::col(Objects::CreatedAt).between(from, to))
        .order_by(Objects::CreatedAt, Order::Asc)
        .order_by(Objects::Id, Order::Asc)
        .to_string(SqliteQueryBuilder)
}
