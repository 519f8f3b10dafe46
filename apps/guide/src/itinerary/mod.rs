//! Itinerary Builder: lays selected places out back to back from 09:00.
//!
//! Stop *i* starts at day start plus the durations of stops `0..i`. There are
//! no gaps and no overlaps; a zero-minute stop shares its start with the next.
//! The builder is pure: the day start is always passed in.

pub mod share;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Plans start at 09:00 local time.
pub const DAY_START_HOUR: u32 = 9;
/// Visit length used when the user left the duration blank or typed garbage.
pub const DEFAULT_VISIT_MINUTES: u32 = 60;
/// Longest single visit a plan accepts.
pub const MAX_VISIT_MINUTES: u32 = 24 * 60;

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// A visit length in whole minutes, parsed leniently from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisitMinutes(pub u32);

impl Default for VisitMinutes {
    fn default() -> Self {
        VisitMinutes(DEFAULT_VISIT_MINUTES)
    }
}

impl VisitMinutes {
    /// Parses the raw text of a duration field. Anything that is not a
    /// non-negative whole number falls back to the default.
    pub fn parse(raw: &str) -> Self {
        raw.trim()
            .parse::<u32>()
            .map(VisitMinutes)
            .unwrap_or_default()
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|m| u32::try_from(m).ok())
                .map(VisitMinutes)
                .unwrap_or_default(),
            Value::String(s) => VisitMinutes::parse(s),
            _ => VisitMinutes::default(),
        }
    }
}

impl<'de> Deserialize<'de> for VisitMinutes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(VisitMinutes::from_json(&value))
    }
}

/// A place picked in the plan composer, with the time the user wants there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPlace {
    pub place_id: Uuid,
    #[serde(default)]
    pub duration: VisitMinutes,
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledStop {
    pub place_id: Uuid,
    pub order: i32,
    pub scheduled_for: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl ScheduledStop {
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        offset_by(self.scheduled_for, i64::from(self.duration_minutes))
    }
}

fn offset_by(start: DateTime<Utc>, minutes: i64) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::try_minutes(minutes)?)
}

/// 09:00:00.000 on `date` in the given offset.
pub fn day_start(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let nine = NaiveTime::from_hms_opt(DAY_START_HOUR, 0, 0)?;
    offset
        .from_local_datetime(&date.and_time(nine))
        .single()
}

/// Lays `selection` out contiguously from `start`. Empty input yields an
/// empty schedule; callers reject an empty selection before getting here.
///
/// `None` when the schedule runs past the last representable timestamp.
pub fn build_itinerary<Tz: TimeZone>(
    selection: &[SelectedPlace],
    start: &DateTime<Tz>,
) -> Option<Vec<ScheduledStop>> {
    let start = start.with_timezone(&Utc);
    let mut elapsed: i64 = 0;
    let mut stops = Vec::with_capacity(selection.len());

    for (index, selected) in selection.iter().enumerate() {
        let minutes = selected.duration.0;
        stops.push(ScheduledStop {
            place_id: selected.place_id,
            order: i32::try_from(index).ok()?,
            scheduled_for: offset_by(start, elapsed)?,
            duration_minutes: minutes,
        });
        elapsed = elapsed.checked_add(i64::from(minutes))?;
    }

    // The last stop has to finish too.
    offset_by(start, elapsed)?;
    Some(stops)
}

/// When the last stop finishes.
pub fn itinerary_end(stops: &[ScheduledStop]) -> Option<DateTime<Utc>> {
    stops.last().and_then(ScheduledStop::ends_at)
}
