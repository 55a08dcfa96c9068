use sea_query::{Expr, Query, SqliteQueryBuilder};

use crate::schema::FilesMeta;

use super::files::META_COLUMNS;

/// INSERT INTO files_meta (path, duration, meta, created_at) VALUES (?, ?, ?, ?)
pub fn insert(path: &str, duration: Option<f64>, meta_json: &str, created_at: i64) -> String {
    Query::insert()
        .into_table(FilesMeta::Table)
        .columns([
            FilesMeta::Path,
            FilesMeta::Duration,
            FilesMeta::Meta,
            FilesMeta::CreatedAt,
        ])
        .values_panic([
            path.into(),
            duration.into(),
            meta_json.into(),
            created_at.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM files_meta WHERE path = ?
pub fn select_by_path(path: &str) -> String {
    Query::select()
        .columns(META_COLUMNS)
        .from(FilesMeta::Table)
        .and_where(Expr::col(FilesMeta::Path).eq(path))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM files_meta WHERE path IN (...)
pub fn delete_by_paths(paths: &[String]) -> String {
    Query::delete()
        .from_table(FilesMeta::Table)
        .and_where(Expr::col(FilesMeta::Path).is_in(paths.iter().map(String::as_str)))
        .to_string(SqliteQueryBuilder)
}
