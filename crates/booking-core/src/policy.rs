//! Business-level booking configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::{AvailabilityOptions, DstPolicy, MAX_OPTION_MINUTES};

use crate::error::{BookingError, Result};

/// Widest conflict search on either side of a date.
pub const MAX_SEARCH_BAND_DAYS: i64 = 366;

/// Tunables shared by every staff member of a business.
///
/// Every field has a default, so `{}` is a valid policy document.
///
/// ```json
/// {
///   "slotStepMinutes": 15,
///   "bufferBeforeMinutes": 5,
///   "bufferAfterMinutes": 10,
///   "alignToMinutes": 15,
///   "minLeadMinutes": 60,
///   "searchBandDays": 1,
///   "dstPolicy": "zone_database"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingPolicy {
    /// Distance between candidate starts; the service duration when unset.
    pub slot_step_minutes: Option<i64>,
    pub buffer_before_minutes: i64,
    pub buffer_after_minutes: i64,
    pub align_to_minutes: Option<i64>,
    /// Minimum notice between "now" and an offered start.
    pub min_lead_minutes: i64,
    /// Days on either side of the requested date searched for conflicts.
    pub search_band_days: i64,
    pub dst_policy: DstPolicy,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            slot_step_minutes: None,
            buffer_before_minutes: 0,
            buffer_after_minutes: 0,
            align_to_minutes: None,
            min_lead_minutes: 0,
            search_band_days: 1,
            dst_policy: DstPolicy::default(),
        }
    }
}

impl BookingPolicy {
    /// Parse and validate a JSON policy document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let policy: BookingPolicy = serde_json::from_str(json)
            .map_err(|e| BookingError::Configuration(format!("invalid booking policy: {e}")))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(step) = self.slot_step_minutes {
            if step <= 0 {
                return Err(BookingError::Configuration(format!(
                    "slotStepMinutes must be positive, got {step}"
                )));
            }
        }
        if self.buffer_before_minutes < 0 || self.buffer_after_minutes < 0 {
            return Err(BookingError::Configuration(
                "buffers must not be negative".to_string(),
            ));
        }
        if self.min_lead_minutes < 0 {
            return Err(BookingError::Configuration(format!(
                "minLeadMinutes must not be negative, got {}",
                self.min_lead_minutes
            )));
        }
        if !(1..=MAX_SEARCH_BAND_DAYS).contains(&self.search_band_days) {
            return Err(BookingError::Configuration(format!(
                "searchBandDays must be between 1 and {MAX_SEARCH_BAND_DAYS}, got {}",
                self.search_band_days
            )));
        }
        let bounded = [
            ("slotStepMinutes", self.slot_step_minutes),
            ("bufferBeforeMinutes", Some(self.buffer_before_minutes)),
            ("bufferAfterMinutes", Some(self.buffer_after_minutes)),
            ("alignToMinutes", self.align_to_minutes),
            ("minLeadMinutes", Some(self.min_lead_minutes)),
        ];
        for (field, value) in bounded {
            if let Some(minutes) = value.filter(|m| *m > MAX_OPTION_MINUTES) {
                return Err(BookingError::Configuration(format!(
                    "{field} must be at most {MAX_OPTION_MINUTES}, got {minutes}"
                )));
            }
        }
        Ok(())
    }

    /// Engine options for a service of `slot_length_minutes`, optionally
    /// bounded below by `earliest_start` on the reference axis.
    pub fn availability_options(
        &self,
        slot_length_minutes: i64,
        earliest_start: Option<DateTime<Utc>>,
    ) -> AvailabilityOptions {
        AvailabilityOptions {
            slot_length_minutes,
            slot_step_minutes: self.slot_step_minutes,
            buffer_before_minutes: self.buffer_before_minutes,
            buffer_after_minutes: self.buffer_after_minutes,
            earliest_start,
            align_to_minutes: self.align_to_minutes,
            format: Default::default(),
        }
    }
}
