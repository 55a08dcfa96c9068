//! Records held by the entity store.
//!
//! Times are naive wall-clock values, persisted as INTEGER seconds via
//! [`to_epoch`] / [`from_epoch`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::constants::{DURATION_META_PATH, RECORDING_EXTENSION};
use crate::error::{Error, Result};
use crate::fragment::FragmentTimestamp;
use crate::tier::TierId;

pub fn to_epoch(time: NaiveDateTime) -> i64 {
    time.and_utc().timestamp()
}

pub fn from_epoch(secs: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| Error::DataIntegrity {
            path: String::new(),
            reason: format!("timestamp {} out of range", secs),
        })
}

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn optional_time(secs: Option<i64>) -> Result<Option<NaiveDateTime>> {
    secs.map(from_epoch).transpose()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct File {
    pub id: i64,
    pub tier_id: TierId,
    pub camera_identifier: String,
    pub category: String,
    pub path: String,
    pub directory: String,
    pub filename: String,
    pub size: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl File {
    /// Number of columns read by [`File::from_row`]
    pub const COLUMNS: usize = 10;

    /// Decode from `row` starting at column `offset`, in `queries::files::COLUMNS` order.
    pub(crate) fn from_row(row: &SqliteRow, offset: usize) -> Result<Self> {
        Ok(Self {
            id: row.try_get(offset)?,
            tier_id: TierId(row.try_get(offset + 1)?),
            camera_identifier: row.try_get(offset + 2)?,
            category: row.try_get(offset + 3)?,
            path: row.try_get(offset + 4)?,
            directory: row.try_get(offset + 5)?,
            filename: row.try_get(offset + 6)?,
            size: row.try_get(offset + 7)?,
            created_at: from_epoch(row.try_get(offset + 8)?)?,
            updated_at: optional_time(row.try_get(offset + 9)?)?,
        })
    }
}

/// New file row as written by the capture pipeline
#[derive(Debug, Clone)]
pub struct NewFile {
    pub tier_id: TierId,
    pub camera_identifier: String,
    pub category: String,
    pub path: String,
    pub directory: String,
    pub filename: String,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMeta {
    pub id: i64,
    pub path: String,
    /// Fragment play length in seconds
    pub duration: Option<f64>,
    /// Everything else the producer attached
    pub meta: Map<String, Value>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl FileMeta {
    pub const COLUMNS: usize = 6;

    pub(crate) fn from_row(row: &SqliteRow, offset: usize) -> Result<Self> {
        let path: String = row.try_get(offset + 1)?;
        let raw: String = row.try_get(offset + 3)?;
        let meta = match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::DataIntegrity {
                    path,
                    reason: format!("metadata is not an object: {}", other),
                })
            }
        };
        Ok(Self {
            id: row.try_get(offset)?,
            path,
            duration: row.try_get(offset + 2)?,
            meta,
            created_at: from_epoch(row.try_get(offset + 4)?)?,
            updated_at: optional_time(row.try_get(offset + 5)?)?,
        })
    }
}

/// New metadata row; `duration` is lifted out of the nested mapping.
#[derive(Debug, Clone)]
pub struct NewFileMeta {
    pub path: String,
    pub duration: Option<f64>,
    pub meta: Map<String, Value>,
}

impl NewFileMeta {
    pub fn new(path: impl Into<String>, meta: Map<String, Value>) -> Self {
        let duration = duration_from_meta(&meta);
        Self {
            path: path.into(),
            duration,
            meta,
        }
    }
}

/// Read the fragment duration at `m3u8.EXTINF`, as a number or numeric string.
pub fn duration_from_meta(meta: &Map<String, Value>) -> Option<f64> {
    let (first, rest) = DURATION_META_PATH.split_first()?;
    let mut value = meta.get(*first)?;
    for key in rest {
        value = value.get(key)?;
    }
    let duration = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    duration.filter(|d| d.is_finite() && *d >= 0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recording {
    pub id: i64,
    pub camera_identifier: String,
    pub start_time: NaiveDateTime,
    /// `None` while the recording is still ongoing
    pub end_time: Option<NaiveDateTime>,
    pub trigger_type: Option<String>,
    pub trigger_id: Option<i64>,
    pub thumbnail_path: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Recording {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get(0)?,
            camera_identifier: row.try_get(1)?,
            start_time: from_epoch(row.try_get(2)?)?,
            end_time: optional_time(row.try_get(3)?)?,
            trigger_type: row.try_get(4)?,
            trigger_id: row.try_get(5)?,
            thumbnail_path: row.try_get(6)?,
            created_at: from_epoch(row.try_get(7)?)?,
            updated_at: optional_time(row.try_get(8)?)?,
        })
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Calendar date the recording started on.
    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// External name of the recording: `<encoded start>.mp4`.
    pub fn filename(&self) -> String {
        format!(
            "{}.{}",
            FragmentTimestamp::saturating(to_epoch(self.start_time)).encode(),
            RECORDING_EXTENSION
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewRecording {
    pub camera_identifier: String,
    pub start_time: NaiveDateTime,
    pub trigger_type: Option<String>,
    pub trigger_id: Option<i64>,
    pub thumbnail_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedObject {
    pub id: i64,
    pub camera_identifier: String,
    pub label: String,
    pub confidence: f64,
    pub width: f64,
    pub height: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub zone: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl DetectedObject {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get(0)?,
            camera_identifier: row.try_get(1)?,
            label: row.try_get(2)?,
            confidence: row.try_get(3)?,
            width: row.try_get(4)?,
            height: row.try_get(5)?,
            x1: row.try_get(6)?,
            y1: row.try_get(7)?,
            x2: row.try_get(8)?,
            y2: row.try_get(9)?,
            zone: row.try_get(10)?,
            created_at: from_epoch(row.try_get(11)?)?,
            updated_at: optional_time(row.try_get(12)?)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDetectedObject {
    pub camera_identifier: String,
    pub label: String,
    pub confidence: f64,
    pub width: f64,
    pub height: f64,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub zone: Option<String>,
    pub detected_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionEvent {
    pub id: i64,
    pub camera_identifier: String,
    pub start_time: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl MotionEvent {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: row.try_get(0)?,
            camera_identifier: row.try_get(1)?,
            start_time: from_epoch(row.try_get(2)?)?,
            created_at: from_epoch(row.try_get(3)?)?,
            updated_at: optional_time(row.try_get(4)?)?,
        })
    }
}
