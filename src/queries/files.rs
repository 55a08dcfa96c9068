use sea_query::{Cond, Expr, Func, Order, Query, SelectStatement, SqliteQueryBuilder};

use crate::constants::{FRAGMENT_EXTENSION, RECORDER_CATEGORY};
use crate::fragment::{FragmentTimestamp, FragmentWindow};
use crate::models::NewFile;
use crate::schema::{Files, FilesMeta};
use crate::tier::Placement;

/// Column order decoded by `File::from_row`
pub const COLUMNS: [Files; 10] = [
    Files::Id,
    Files::TierId,
    Files::CameraIdentifier,
    Files::Category,
    Files::Path,
    Files::Directory,
    Files::Filename,
    Files::Size,
    Files::CreatedAt,
    Files::UpdatedAt,
];

/// Column order decoded by `FileMeta::from_row`
pub const META_COLUMNS: [FilesMeta; 6] = [
    FilesMeta::Id,
    FilesMeta::Path,
    FilesMeta::Duration,
    FilesMeta::Meta,
    FilesMeta::CreatedAt,
    FilesMeta::UpdatedAt,
];

/// INSERT INTO files (tier_id, camera_identifier, category, path, directory, filename, size, created_at)
/// VALUES (?, ?, ?, ?, ?, ?, ?, ?)
pub fn insert(file: &NewFile, created_at: i64) -> String {
    Query::insert()
        .into_table(Files::Table)
        .columns([
            Files::TierId,
            Files::CameraIdentifier,
            Files::Category,
            Files::Path,
            Files::Directory,
            Files::Filename,
            Files::Size,
            Files::CreatedAt,
        ])
        .values_panic([
            file.tier_id.0.into(),
            file.camera_identifier.as_str().into(),
            file.category.as_str().into(),
            file.path.as_str().into(),
            file.directory.as_str().into(),
            file.filename.as_str().into(),
            file.size.into(),
            created_at.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <columns> FROM files WHERE path = ?
pub fn select_by_path(path: &str) -> String {
    Query::select()
        .columns(COLUMNS)
        .from(Files::Table)
        .and_where(Expr::col(Files::Path).eq(path))
        .to_string(SqliteQueryBuilder)
}

/// SELECT 1 FROM files WHERE path = ?
pub fn exists(path: &str) -> String {
    Query::select()
        .expr(Expr::val(1))
        .from(Files::Table)
        .and_where(Expr::col(Files::Path).eq(path))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE files SET tier_id = ?, path = ?, directory = ?, filename = ?, updated_at = ? WHERE path = ?
pub fn update_placement(old_path: &str, placement: &Placement, updated_at: i64) -> String {
    Query::update()
        .table(Files::Table)
        .value(Files::TierId, placement.tier_id.0)
        .value(Files::Path, placement.path.as_str())
        .value(Files::Directory, placement.directory.as_str())
        .value(Files::Filename, placement.filename.as_str())
        .value(Files::UpdatedAt, updated_at)
        .and_where(Expr::col(Files::Path).eq(old_path))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM files WHERE path IN (...)
pub fn delete_by_paths(paths: &[String]) -> String {
    Query::delete()
        .from_table(Files::Table)
        .and_where(Expr::col(Files::Path).is_in(paths.iter().map(String::as_str)))
        .to_string(SqliteQueryBuilder)
}

/// SELECT COUNT(*) FROM files WHERE camera_identifier = ?
pub fn count_for_camera(camera_identifier: &str) -> String {
    Query::select()
        .expr(Func::count(Expr::col(Files::Id)))
        .from(Files::Table)
        .and_where(Expr::col(Files::CameraIdentifier).eq(camera_identifier))
        .to_string(SqliteQueryBuilder)
}

fn filename_prefix() -> String {
    format!(
        "substr(\"files\".\"filename\", 1, {})",
        FragmentTimestamp::WIDTH
    )
}

/// SELECT files.<columns>, files_meta.<columns>
/// FROM files LEFT JOIN files_meta ON files.path = files_meta.path
/// WHERE files.camera_identifier = ? AND files.category = 'recorder' AND files.path LIKE '%.m4s'
///   AND (substr(files.filename, 1, 10) BETWEEN <start> AND <end>
///        OR (substr(files.filename, 1, 10) < <start>
///            AND CAST(substr(files.filename, 1, 10) AS INTEGER) + files_meta.duration >= <start>))
/// ORDER BY files.filename ASC
///
/// Bounds are compared in their fixed-width encoded form.
pub fn select_fragments_in_window(camera_identifier: &str, window: &FragmentWindow) -> String {
    fragments_statement(camera_identifier, window).to_string(SqliteQueryBuilder)
}

fn fragments_statement(camera_identifier: &str, window: &FragmentWindow) -> SelectStatement {
    let start_key = window.start.encode();
    let end_key = window.end.encode();

    let starts_inside = Expr::expr(Expr::cust(filename_prefix())).between(start_key.clone(), end_key);
    let covers_start = Cond::all()
        .add(Expr::expr(Expr::cust(filename_prefix())).lt(start_key))
        .add(Expr::cust(format!(
            "CAST({} AS INTEGER) + \"files_meta\".\"duration\" >= {}",
            filename_prefix(),
            window.start.secs()
        )));

    Query::select()
        .columns(COLUMNS.map(|column| (Files::Table, column)))
        .columns(META_COLUMNS.map(|column| (FilesMeta::Table, column)))
        .from(Files::Table)
        .left_join(
            FilesMeta::Table,
            Expr::col((Files::Table, Files::Path)).equals((FilesMeta::Table, FilesMeta::Path)),
        )
        .cond_where(
            Cond::all()
                .add(Expr::col((Files::Table, Files::CameraIdentifier)).eq(camera_identifier))
                .add(Expr::col((Files::Table, Files::Category)).eq(RECORDER_CATEGORY))
                .add(Expr::col((Files::Table, Files::Path)).like(format!("%{}", FRAGMENT_EXTENSION)))
                .add(Cond::any().add(starts_inside).add(covers_start)),
        )
        .order_by((Files::Table, Files::Filename), Order::Asc)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_query_compares_encoded_bounds() {
        let window = FragmentWindow::new(
            FragmentTimestamp::new(1000).unwrap(),
            FragmentTimestamp::new(1300).unwrap(),
        );
        let sql = select_fragments_in_window("front", &window);
        assert!(sql.contains("BETWEEN '0000001000' AND '0000001300'"), "{}", sql);
        assert!(sql.contains("\"files_meta\".\"duration\" >= 1000"), "{}", sql);
        assert!(sql.contains("LEFT JOIN \"files_meta\""), "{}", sql);
        assert!(sql.contains("ORDER BY \"files\".\"filename\" ASC"), "{}", sql);
    }
}
