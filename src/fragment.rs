//! Fragment start-time encoding and the time-window inclusion rule.
//!
//! Recorder fragments are named `<start><rest>` where `<start>` is the unix
//! second the fragment begins at, written as exactly [`FragmentTimestamp::WIDTH`]
//! zero-padded decimal digits (e.g. `1700000000.m4s`). Because every encoded
//! value has the same width, lexicographic order of the prefix equals numeric
//! order, which is what lets the store range-filter and sort on the filename.

use std::fmt;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::models::to_epoch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentNameError {
    #[error("'{0}' is shorter than the {width}-digit timestamp prefix", width = FragmentTimestamp::WIDTH)]
    TooShort(String),
    #[error("'{0}' does not start with a decimal timestamp")]
    NotDigits(String),
    #[error("{0} is outside the encodable timestamp range")]
    OutOfRange(i64),
}

/// Start time of a fragment, in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FragmentTimestamp(i64);

impl FragmentTimestamp {
    /// Number of decimal digits in the filename prefix
    pub const WIDTH: usize = 10;
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 9_999_999_999;

    pub fn new(secs: i64) -> Result<Self, FragmentNameError> {
        if (Self::MIN..=Self::MAX).contains(&secs) {
            Ok(Self(secs))
        } else {
            Err(FragmentNameError::OutOfRange(secs))
        }
    }

    /// Clamp an arbitrary second count into the encodable range.
    pub fn saturating(secs: i64) -> Self {
        Self(secs.clamp(Self::MIN, Self::MAX))
    }

    pub fn secs(self) -> i64 {
        self.0
    }

    /// Zero-padded fixed-width decimal form.
    pub fn encode(self) -> String {
        format!("{:0width$}", self.0, width = Self::WIDTH)
    }

    /// Read the timestamp prefix of a fragment filename.
    pub fn decode(filename: &str) -> Result<Self, FragmentNameError> {
        let prefix = filename
            .get(..Self::WIDTH)
            .ok_or_else(|| FragmentNameError::TooShort(filename.to_string()))?;
        if !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FragmentNameError::NotDigits(filename.to_string()));
        }
        let secs: i64 = prefix
            .parse()
            .map_err(|_| FragmentNameError::NotDigits(filename.to_string()))?;
        Self::new(secs)
    }

    /// Filename for a fragment starting at this timestamp.
    pub fn fragment_filename(self, extension: &str) -> String {
        format!("{}{}", self.encode(), extension)
    }
}

impl fmt::Display for FragmentTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Why a fragment belongs to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Starts inside `[start, end]`
    InWindow,
    /// Starts before the window but is still playing at its start
    CoversStart,
}

/// Inclusive time window a recording's fragments are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentWindow {
    pub start: FragmentTimestamp,
    pub end: FragmentTimestamp,
}

impl FragmentWindow {
    pub fn new(start: FragmentTimestamp, end: FragmentTimestamp) -> Self {
        Self { start, end }
    }

    /// `[start_time - lookback, end_time or now]`, at whole-second resolution.
    ///
    /// Sub-second parts of the bounds are dropped (floored), matching the
    /// INTEGER seconds recordings are stored with. A recording starting at
    /// 1000.7 s therefore resolves against a window starting at 1000.
    pub fn for_interval(
        start_time: NaiveDateTime,
        end_time: Option<NaiveDateTime>,
        lookback_secs: u64,
        now: NaiveDateTime,
    ) -> Self {
        let lookback = i64::try_from(lookback_secs).unwrap_or(i64::MAX);
        let start = to_epoch(start_time).saturating_sub(lookback);
        let end = to_epoch(end_time.unwrap_or(now));
        Self {
            start: FragmentTimestamp::saturating(start),
            end: FragmentTimestamp::saturating(end),
        }
    }

    /// Decide whether a fragment starting at `t` and playing for `duration`
    /// seconds belongs to this window.
    pub fn admits(&self, t: FragmentTimestamp, duration: Option<f64>) -> Option<Inclusion> {
        if self.start <= t && t <= self.end {
            return Some(Inclusion::InWindow);
        }
        if t < self.start {
            let duration = duration.filter(|d| d.is_finite())?;
            if t.secs() as f64 + duration >= self.start.secs() as f64 {
                return Some(Inclusion::CoversStart);
            }
        }
        None
    }
}
