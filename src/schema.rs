use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Files table - every file written by a camera subsystem, on any tier
#[derive(Iden)]
pub enum Files {
    Table,
    Id,
    TierId,
    CameraIdentifier,
    Category,
    Path,
    Directory,
    Filename,
    Size,
    CreatedAt,
    UpdatedAt,
}

/// Files meta table - per-file metadata, linked to files by path
#[derive(Iden)]
pub enum FilesMeta {
    Table,
    Id,
    Path,
    Duration,
    Meta,
    CreatedAt,
    UpdatedAt,
}

/// Recordings table - logical capture intervals
#[derive(Iden)]
pub enum Recordings {
    Table,
    Id,
    CameraIdentifier,
    StartTime,
    EndTime,
    TriggerType,
    TriggerId,
    ThumbnailPath,
    CreatedAt,
    UpdatedAt,
}

/// Objects table - detected objects
#[derive(Iden)]
pub enum Objects {
    Table,
    Id,
    CameraIdentifier,
    Label,
    Confidence,
    Width,
    Height,
    X1,
    Y1,
    X2,
    Y2,
    Zone,
    CreatedAt,
    UpdatedAt,
}

/// Motion table - motion events
#[derive(Iden)]
pub enum Motion {
    Table,
    Id,
    CameraIdentifier,
    StartTime,
    CreatedAt,
    UpdatedAt,
}
