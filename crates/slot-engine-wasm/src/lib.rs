//! WASM bindings for slot-engine.
//!
//! Exposes slot computation, local-time conversion, working-window
//! resolution and conflict detection to the booking web app via
//! `wasm-bindgen`. All complex types are passed as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::availability::{AvailabilityOptions, SlotOutput};
use slot_engine::conflict::Conflict;
use slot_engine::{DstPolicy, Schedule, TimeRange};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RangeDto {
    start: String,
    end: String,
}

impl From<&TimeRange> for RangeDto {
    fn from(r: &TimeRange) -> Self {
        Self {
            start: r.start.to_rfc3339(),
            end: r.end.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct SlotDto {
    start: String,
    end: String,
    duration_minutes: i64,
}

#[derive(Serialize)]
struct ConflictDto {
    candidate: RangeDto,
    existing: RangeDto,
    overlap_minutes: i64,
}

impl From<&Conflict> for ConflictDto {
    fn from(c: &Conflict) -> Self {
        Self {
            candidate: RangeDto::from(&c.candidate),
            existing: RangeDto::from(&c.existing),
            overlap_minutes: c.overlap_minutes,
        }
    }
}

/// Input format for ranges passed from JavaScript.
#[derive(Deserialize)]
struct RangeInput {
    start: String,
    end: String,
}

/// `availableSlotsForWindow` request document.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotRequest {
    working_start: String,
    working_end: String,
    #[serde(default)]
    bookings: Vec<RangeInput>,
    options: AvailabilityOptions,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (`2024-01-15T09:00:00Z`, `...+02:00`) and naive
/// `2024-01-15T09:00:00`, which is read as UTC. Reference-axis values from the
/// web app arrive in the naive form.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| js_error(format!("Invalid datetime '{}': {}", s, e)))
}

fn parse_range(input: &RangeInput) -> Result<TimeRange, JsValue> {
    Ok(TimeRange {
        start: parse_datetime(&input.start)?,
        end: parse_datetime(&input.end)?,
    })
}

fn parse_ranges_json(json: &str) -> Result<Vec<TimeRange>, JsValue> {
    let inputs: Vec<RangeInput> = serde_json::from_str(json)
        .map_err(|e| js_error(format!("Invalid ranges JSON: {}", e)))?;
    inputs.iter().map(parse_range).collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error(format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Compute the bookable slots inside one working window.
///
/// `request_json` is an object:
///
/// ```json
/// {
///   "workingStart": "2024-01-15T09:00:00",
///   "workingEnd": "2024-01-15T17:00:00",
///   "bookings": [{"start": "2024-01-15T10:00:00", "end": "2024-01-15T11:00:00"}],
///   "options": {"slotLengthMinutes": 30, "alignToMinutes": 15, "format": "ranges"}
/// }
/// ```
///
/// With `format: "ranges"` (default) the result is an array of
/// `{start, end, duration_minutes}`; with `"iso_pairs"` it is an array of
/// `"<start>|<end>"` strings.
#[wasm_bindgen(js_name = "availableSlotsForWindow")]
pub fn available_slots_for_window(request_json: &str) -> Result<String, JsValue> {
    let request: SlotRequest = serde_json::from_str(request_json)
        .map_err(|e| js_error(format!("Invalid slot request JSON: {}", e)))?;
    let working_start = parse_datetime(&request.working_start)?;
    let working_end = parse_datetime(&request.working_end)?;
    let bookings = request
        .bookings
        .iter()
        .map(parse_range)
        .collect::<Result<Vec<_>, _>>()?;

    let output = slot_engine::available_slots_for_window(
        working_start,
        working_end,
        &bookings,
        &request.options,
    )
    .map_err(js_error)?;

    match output {
        SlotOutput::Ranges(slots) => {
            let dtos: Vec<SlotDto> = slots
                .iter()
                .map(|s| SlotDto {
                    start: s.start.to_rfc3339(),
                    end: s.end.to_rfc3339(),
                    duration_minutes: s.duration_minutes(),
                })
                .collect();
            to_json(&dtos)
        }
        SlotOutput::IsoPairs(pairs) => to_json(&pairs),
    }
}

/// Convert a provider-local wall-clock time to a UTC instant (RFC 3339).
///
/// `exact` selects the zone-database conversion; by default the
/// single-step offset estimate used for stored bookings is applied.
#[wasm_bindgen(js_name = "localTimeToUTC")]
pub fn local_time_to_utc(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    timezone: &str,
    exact: Option<bool>,
) -> Result<String, JsValue> {
    let policy = if exact.unwrap_or(false) {
        DstPolicy::ZoneDatabase
    } else {
        DstPolicy::Approximate
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| js_error(format!("Invalid date: {:04}-{:02}-{:02}", year, month, day)))?;
    let instant = policy
        .to_utc(date, hour, minute, timezone)
        .map_err(js_error)?;
    Ok(instant.to_rfc3339())
}

/// Resolve a schedule document into the working windows of `date`
/// (`YYYY-MM-DD`).
///
/// Returns `{date, windows: [{start: "HH:MM", end: "HH:MM"}], source}`.
#[wasm_bindgen(js_name = "resolveWorkingWindows")]
pub fn resolve_working_windows(schedule_json: &str, date: &str) -> Result<String, JsValue> {
    let schedule: Schedule = serde_json::from_str(schedule_json)
        .map_err(|e| js_error(format!("Invalid schedule JSON: {}", e)))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| js_error(format!("Invalid date '{}': {}", date, e)))?;
    to_json(&schedule.working_windows(date))
}

/// Find every existing range that overlaps a candidate.
///
/// `candidate_json` is a single `{start, end}` object and `existing_json` an
/// array of them. Returns an array of `{candidate, existing, overlap_minutes}`.
/// Ranges that merely touch are not conflicts.
#[wasm_bindgen(js_name = "findConflicts")]
pub fn find_conflicts(candidate_json: &str, existing_json: &str) -> Result<String, JsValue> {
    let candidate: RangeInput = serde_json::from_str(candidate_json)
        .map_err(|e| js_error(format!("Invalid candidate JSON: {}", e)))?;
    let candidate = parse_range(&candidate)?;
    let existing = parse_ranges_json(existing_json)?;

    let dtos: Vec<ConflictDto> = slot_engine::find_conflicts(&candidate, &existing)
        .iter()
        .map(ConflictDto::from)
        .collect();
    to_json(&dtos)
}
