use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, SqliteQueryBuilder, Table};

use crate::schema::{Files, FilesMeta, Metadata, Motion, Objects, Recordings};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS files (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     tier_id INTEGER NOT NULL,
///     camera_identifier TEXT NOT NULL,
///     category TEXT NOT NULL,
///     path TEXT NOT NULL UNIQUE,
///     directory TEXT NOT NULL,
///     filename TEXT NOT NULL,
///     size INTEGER NOT NULL,
///     created_at INTEGER NOT NULL,
///     updated_at INTEGER
/// )
pub fn create_files_table() -> String {
    Table::create()
        .table(Files::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Files::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Files::TierId).big_integer().not_null())
        .col(ColumnDef::new(Files::CameraIdentifier).string().not_null())
        .col(ColumnDef::new(Files::Category).string().not_null())
        .col(ColumnDef::new(Files::Path).string().not_null().unique_key())
        .col(ColumnDef::new(Files::Directory).string().not_null())
        .col(ColumnDef::new(Files::Filename).string().not_null())
        .col(ColumnDef::new(Files::Size).big_integer().not_null())
        .col(ColumnDef::new(Files::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Files::UpdatedAt).big_integer().null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS files_meta (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     path TEXT NOT NULL UNIQUE REFERENCES files(path) ON DELETE CASCADE ON UPDATE CASCADE,
///     duration REAL,
///     meta TEXT NOT NULL,
///     created_at INTEGER NOT NULL,
///     updated_at INTEGER
/// )
pub fn create_files_meta_table() -> String {
    Table::create()
        .table(FilesMeta::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(FilesMeta::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(FilesMeta::Path).string().not_null().unique_key())
        .col(ColumnDef::new(FilesMeta::Duration).double().null())
        .col(ColumnDef::new(FilesMeta::Meta).text().not_null())
        .col(ColumnDef::new(FilesMeta::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(FilesMeta::UpdatedAt).big_integer().null())
        .foreign_key(
            ForeignKey::create()
                .from(FilesMeta::Table, FilesMeta::Path)
                .to(Files::Table, Files::Path)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS recordings (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     camera_identifier TEXT NOT NULL,
///     start_time INTEGER NOT NULL,
///     end_time INTEGER,
///     trigger_type TEXT,
///     trigger_id INTEGER,
///     thumbnail_path TEXT NOT NULL,
///     created_at INTEGER NOT NULL,
///     updated_at INTEGER
/// )
pub fn create_recordings_table() -> String {
    Table::create()
        .table(Recordings::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Recordings::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Recordings::CameraIdentifier).string().not_null())
        .col(ColumnDef::new(Recordings::StartTime).big_integer().not_null())
        .col(ColumnDef::new(Recordings::EndTime).big_integer().null())
        .col(ColumnDef::new(Recordings::TriggerType).string().null())
        .col(ColumnDef::new(Recordings::TriggerId).big_integer().null())
        .col(ColumnDef::new(Recordings::ThumbnailPath).string().not_null())
        .col(ColumnDef::new(Recordings::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Recordings::UpdatedAt).big_integer().null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS objects (...)
pub fn create_objects_table() -> String {
    Table::create()
        .table(Objects::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Objects::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Objects::CameraIdentifier).string().not_null())
        .col(ColumnDef::new(Objects::Label).string().not_null())
        .col(ColumnDef::new(Objects::Confidence).double().not_null())
        .col(ColumnDef::new(Objects::Width).double().not_null())
        .col(ColumnDef::new(Objects::Height).double().not_null())
        .col(ColumnDef::new(Objects::X1).double().not_null())
        .col(ColumnDef::new(Objects::Y1).double().not_null())
        .col(ColumnDef::new(Objects::X2).double().not_null())
        .col(ColumnDef::new(Objects::Y2).double().not_null())
        .col(ColumnDef::new(Objects::Zone).string().null())
        .col(ColumnDef::new(Objects::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Objects::UpdatedAt).big_integer().null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS motion (...)
pub fn create_motion_table() -> String {
    Table::create()
        .table(Motion::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Motion::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Motion::CameraIdentifier).string().not_null())
        .col(ColumnDef::new(Motion::StartTime).big_integer().not_null())
        .col(ColumnDef::new(Motion::CreatedAt).big_integer().not_null())
        .col(ColumnDef::new(Motion::UpdatedAt).big_integer().null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_files_fragments ON files(camera_identifier, category, filename)
pub fn create_files_fragments_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_files_fragments")
        .table(Files::Table)
        .col(Files::CameraIdentifier)
        .col(Files::Category)
        .col(Files::Filename)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_recordings_camera_start ON recordings(camera_identifier, start_time)
pub fn create_recordings_camera_start_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_recordings_camera_start")
        .table(Recordings::Table)
        .col(Recordings::CameraIdentifier)
        .col(Recordings::StartTime)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_objects_camera_created ON objects(camera_identifier, created_at)
pub fn create_objects_camera_created_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_objects_camera_created")
        .table(Objects::Table)
        .col(Objects::CameraIdentifier)
        .col(Objects::CreatedAt)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_motion_camera_start ON motion(camera_identifier, start_time)
pub fn create_motion_camera_start_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_motion_camera_start")
        .table(Motion::Table)
        .col(Motion::CameraIdentifier)
        .col(Motion::StartTime)
        .to_string(SqliteQueryBuilder)
}

/// All statements, in creation order
pub fn schema() -> Vec<String> {
    vec![
        create_metadata_table(),
        create_files_table(),
        create_files_meta_table(),
        create_recordings_table(),
        create_objects_table(),
        create_motion_table(),
        create_files_fragments_index(),
        create_recordings_camera_start_index(),
        create_objects_camera_created_index(),
        create_motion_camera_start_index(),
    ]
}
