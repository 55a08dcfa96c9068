//! Resolves the fragments that make up a recording.
//!
//! The store query narrows candidates using the encoded filename prefix; every
//! returned row is then decoded and checked again with
//! [`FragmentWindow::admits`], which is the authoritative inclusion rule.
//! Rows that break the naming or metadata contract are logged and skipped so a
//! single bad fragment cannot hide the rest of the window.

use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use crate::constants::FRAGMENT_EXTENSION;
use crate::error::{Error, Result};
use crate::fragment::{FragmentTimestamp, FragmentWindow, Inclusion};
use crate::models::{now, File, FileMeta, Recording};
use crate::queries::files;

/// A recorder fragment together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub file: File,
    pub meta: FileMeta,
    #[serde(skip)]
    pub start: FragmentTimestamp,
    #[serde(skip)]
    pub inclusion: Inclusion,
}

impl Fragment {
    /// Epoch second at which the fragment stops playing, when its length is known.
    pub fn end_secs(&self) -> Option<f64> {
        self.meta
            .duration
            .map(|duration| self.start.secs() as f64 + duration)
    }
}

/// Fragments of `recording`, with its start pulled back by `lookback_secs`.
/// Open recordings extend to the current time.
pub async fn resolve_fragments<'e, E>(
    executor: E,
    recording: &Recording,
    lookback_secs: u64,
) -> Result<Vec<Fragment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    resolve_fragments_at(executor, recording, lookback_secs, now()).await
}

/// Same as [`resolve_fragments`] with an explicit "now" for open recordings.
pub async fn resolve_fragments_at<'e, E>(
    executor: E,
    recording: &Recording,
    lookback_secs: u64,
    now: NaiveDateTime,
) -> Result<Vec<Fragment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let window = FragmentWindow::for_interval(
        recording.start_time,
        recording.end_time,
        lookback_secs,
        now,
    );
    resolve_window(executor, &recording.camera_identifier, &window).await
}

/// Fragments of a camera belonging to `window`, ascending by start time.
pub async fn resolve_window<'e, E>(
    executor: E,
    camera_identifier: &str,
    window: &FragmentWindow,
) -> Result<Vec<Fragment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = files::select_fragments_in_window(camera_identifier, window);
    let rows = sqlx::query(&sql).fetch_all(executor).await?;

    let mut fragments = Vec::with_capacity(rows.len());
    for row in &rows {
        match fragment_from_row(row, window) {
            Ok(Some(fragment)) => fragments.push(fragment),
            Ok(None) => {}
            Err(Error::DataIntegrity { path, reason }) => {
                warn!("Skipping fragment '{}': {}", path, reason);
            }
            Err(err) => return Err(err),
        }
    }

    fragments.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.file.filename.cmp(&b.file.filename))
    });
    debug!(
        "Resolved {} fragments for camera '{}' in [{}, {}]",
        fragments.len(),
        camera_identifier,
        window.start,
        window.end
    );
    Ok(fragments)
}

fn fragment_from_row(row: &SqliteRow, window: &FragmentWindow) -> Result<Option<Fragment>> {
    let file = File::from_row(row, 0)?;
    if !file.path.ends_with(FRAGMENT_EXTENSION) {
        return Ok(None);
    }

    let start = FragmentTimestamp::decode(&file.filename).map_err(|e| Error::DataIntegrity {
        path: file.path.clone(),
        reason: e.to_string(),
    })?;

    let meta_id: Option<i64> = row.try_get(File::COLUMNS)?;
    if meta_id.is_none() {
        return Err(Error::DataIntegrity {
            path: file.path,
            reason: "no metadata row".to_string(),
        });
    }
    let meta = match FileMeta::from_row(row, File::COLUMNS) {
        Ok(meta) => meta,
        Err(Error::Json(e)) => {
            return Err(Error::DataIntegrity {
                path: file.path,
                reason: format!("unreadable metadata: {}", e),
            })
        }
        Err(err) => return Err(err),
    };

    Ok(window.admits(start, meta.duration).map(|inclusion| Fragment {
        file,
        meta,
        start,
        inclusion,
    }))
}
