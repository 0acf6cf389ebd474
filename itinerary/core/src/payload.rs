//! Itinerary payload validation
//!
//! The trailer is untrusted model output. Validation happens in three steps:
//!
//! 1. Parse as JSON. Failure rejects the payload ([`PayloadError::Malformed`]).
//! 2. Check the top-level shape: `title`, `destination` and `duration` must be
//!    strings and `locations` must be an array. Failure rejects the payload
//!    ([`PayloadError::SchemaViolation`]).
//! 3. Check each location. Entries without a usable name or with
//!    out-of-range coordinates are dropped and reported, never fatal.
//!
//! The narrative is independent of all of this: a rejected payload never
//! invalidates text already shown to the user.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::category::LocationCategory;

/// Valid latitude range in degrees
pub const LAT_RANGE: std::ops::RangeInclusive<f64> = -90.0..=90.0;

/// Valid longitude range in degrees
pub const LNG_RANGE: std::ops::RangeInclusive<f64> = -180.0..=180.0;

// ============================================================================
// Data Model
// ============================================================================

/// A validated trip with its waypoints
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItineraryPayload {
    /// Trip title
    pub title: String,
    /// Main destination
    pub destination: String,
    /// Human-readable duration (e.g. "3 days")
    pub duration: String,
    /// Waypoints that passed validation, in model order
    pub locations: Vec<Location>,
}

/// One point of interest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Place name, never empty
    pub name: String,
    /// Latitude in degrees, within [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180]
    pub lng: f64,
    /// Day of the trip, starting at 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw `type` label as produced by the model
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Location {
    /// Create a location with only the mandatory fields
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            day: None,
            description: None,
            kind: None,
        }
    }

    /// Set the day
    #[must_use]
    pub fn with_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the raw type label
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Marker category for the raw type label
    #[must_use]
    pub fn category(&self) -> LocationCategory {
        LocationCategory::from_optional(self.kind.as_deref())
    }
}

// ============================================================================
// Errors and Warnings
// ============================================================================

/// Payload-level failures. The narrative stays valid in every case.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PayloadError {
    /// The trailer is not valid JSON
    #[error("Malformed payload: {reason}")]
    Malformed {
        /// The sanitized trailer text, for diagnostics
        raw: String,
        /// Parser error description
        reason: String,
    },

    /// Valid JSON, but not an itinerary
    #[error("Schema violation at `{field}`: {reason}")]
    SchemaViolation {
        /// Offending field (`$` for the root)
        field: String,
        /// What was wrong with it
        reason: String,
    },
}

impl PayloadError {
    fn schema(field: &str, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Raw trailer text, if this is a parse failure
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Malformed { raw, .. } => Some(raw),
            Self::SchemaViolation { .. } => None,
        }
    }
}

/// Why a single location was dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// The entry is not a JSON object
    NotAnObject,
    /// `name` is missing, not a string, or blank
    MissingName,
    /// `lat` is missing or not a number
    MissingLatitude,
    /// `lng` is missing or not a number
    MissingLongitude,
    /// `lat` is outside [-90, 90]
    LatitudeOutOfRange,
    /// `lng` is outside [-180, 180]
    LongitudeOutOfRange,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotAnObject => "not an object",
            Self::MissingName => "missing or empty name",
            Self::MissingLatitude => "missing or non-numeric lat",
            Self::MissingLongitude => "missing or non-numeric lng",
            Self::LatitudeOutOfRange => "lat out of range",
            Self::LongitudeOutOfRange => "lng out of range",
        };
        f.write_str(text)
    }
}

/// A location entry that failed validation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedLocation {
    /// Position in the model's `locations` array
    pub index: usize,
    /// Why it was dropped
    pub reason: RejectionReason,
}

/// Non-fatal warning: some locations were dropped
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{dropped} location(s) dropped during validation")]
pub struct LocationValidationWarning {
    /// Number of dropped entries
    pub dropped: usize,
}

/// An accepted payload together with the entries that were filtered out
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedItinerary {
    /// The accepted payload
    pub payload: ItineraryPayload,
    /// Entries removed from `locations`
    pub dropped: Vec<DroppedLocation>,
}

impl ValidatedItinerary {
    /// Warning to surface alongside the payload, if anything was dropped
    #[must_use]
    pub fn warning(&self) -> Option<LocationValidationWarning> {
        if self.dropped.is_empty() {
            None
        } else {
            Some(LocationValidationWarning {
                dropped: self.dropped.len(),
            })
        }
    }

    /// Whether every location was accepted
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Validate a sanitized trailer
///
/// # Errors
///
/// [`PayloadError::Malformed`] if `candidate` is not JSON,
/// [`PayloadError::SchemaViolation`] if the top-level shape is wrong.
pub fn validate(candidate: &str) -> Result<ValidatedItinerary, PayloadError> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| {
        warn!(error = %e, bytes = candidate.len(), "Trailer is not valid JSON");
        PayloadError::Malformed {
            raw: candidate.to_string(),
            reason: e.to_string(),
        }
    })?;

    validate_value(&value)
}

/// Validate an already-parsed trailer
///
/// # Errors
///
/// [`PayloadError::SchemaViolation`] if the top-level shape is wrong.
pub fn validate_value(value: &Value) -> Result<ValidatedItinerary, PayloadError> {
    let root = value
        .as_object()
        .ok_or_else(|| PayloadError::schema("$", "expected an object"))?;

    let title = required_string(root, "title")?;
    let destination = required_string(root, "destination")?;
    let duration = required_string(root, "duration")?;
    let entries = match root.get("locations") {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(PayloadError::schema("locations", "expected an array")),
        None => return Err(PayloadError::schema("locations", "missing")),
    };

    let mut locations = Vec::with_capacity(entries.len());
    let mut dropped = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match parse_location(entry) {
            Ok(location) => locations.push(location),
            Err(reason) => {
                debug!(index, %reason, "Dropping location");
                dropped.push(DroppedLocation { index, reason });
            }
        }
    }

    if !dropped.is_empty() {
        warn!(
            dropped = dropped.len(),
            kept = locations.len(),
            "Some locations failed validation"
        );
    }

    Ok(ValidatedItinerary {
        payload: ItineraryPayload {
            title,
            destination,
            duration,
            locations,
        },
        dropped,
    })
}

fn required_string(root: &Map<String, Value>, field: &str) -> Result<String, PayloadError> {
    match root.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(PayloadError::schema(field, "expected a string")),
        None => Err(PayloadError::schema(field, "missing")),
    }
}

fn parse_location(entry: &Value) -> Result<Location, RejectionReason> {
    let obj = entry.as_object().ok_or(RejectionReason::NotAnObject)?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or(RejectionReason::MissingName)?;

    let lat = coordinate(obj, "lat").ok_or(RejectionReason::MissingLatitude)?;
    if !LAT_RANGE.contains(&lat) {
        return Err(RejectionReason::LatitudeOutOfRange);
    }
    let lng = coordinate(obj, "lng").ok_or(RejectionReason::MissingLongitude)?;
    if !LNG_RANGE.contains(&lng) {
        return Err(RejectionReason::LongitudeOutOfRange);
    }

    // Optional fields degrade to absent rather than rejecting the entry
    let day = obj
        .get("day")
        .and_then(Value::as_u64)
        .filter(|d| *d > 0)
        .and_then(|d| u32::try_from(d).ok());
    let description = optional_string(obj, "description");
    let kind = optional_string(obj, "type");

    Ok(Location {
        name: name.to_string(),
        lat,
        lng,
        day,
        description,
        kind,
    })
}

/// `None` unless the field is a JSON number. Numbers that overflow `f64`
/// (`1e400`) come back as NaN so the range checks reject them.
fn coordinate(obj: &Map<String, Value>, field: &str) -> Option<f64> {
    match obj.get(field)? {
        Value::Number(n) => Some(n.as_f64().unwrap_or(f64::NAN)),
        _ => None,
    }
}

fn optional_string(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}
