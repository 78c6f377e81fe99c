//! Visitor record model

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Display format of arrival and departure timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One visit to the site, from sign-in to (optional) sign-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VisitorRecord {
    /// Server time of the sign-in
    pub arrival: NaiveDateTime,
    /// Server time of the sign-out, written once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Hand-drawn signature as a `data:<mime>;base64,<payload>` URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl VisitorRecord {
    /// Build a new open record from a submitted form
    pub fn from_submission(form: SubmitVisitor, arrival: NaiveDateTime) -> Self {
        Self {
            arrival,
            departure: None,
            first_name: non_blank(form.first_name),
            last_name: non_blank(form.last_name),
            company: non_blank(form.company),
            reason: non_blank(form.reason),
            host: non_blank(form.host),
            phone: non_blank(form.phone),
            signature: non_blank(form.signature),
        }
    }

    /// Whether the visitor has not signed out yet
    pub fn is_open(&self) -> bool {
        self.departure.is_none()
    }

    /// Record the departure time. Fails if the record is already closed or
    /// if `at` is not after the arrival.
    pub fn check_out(&mut self, at: NaiveDateTime) -> AppResult<()> {
        if let Some(departure) = self.departure {
            return Err(AppError::Validation(format!(
                "Visitor already left at {}",
                departure.format(TIMESTAMP_FORMAT)
            )));
        }
        if at <= self.arrival {
            return Err(AppError::Validation(
                "Departure must be later than arrival".to_string(),
            ));
        }
        self.departure = Some(at);
        Ok(())
    }

    pub fn arrival_display(&self) -> String {
        self.arrival.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn departure_display(&self) -> String {
        self.departure
            .map(|d| d.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Sign-in form body (`application/x-www-form-urlencoded`)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubmitVisitor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub reason: Option<String>,
    pub host: Option<String>,
    pub phone: Option<String>,
    /// Signature canvas exported as a data URL
    pub signature: Option<String>,
}

/// Sign-out form body: the arrival timestamp identifies the record
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExitVisitor {
    /// ISO-8601 arrival timestamp of the open record
    #[schema(example = "2024-06-10T09:00:00")]
    pub arrival: String,
}

impl ExitVisitor {
    pub fn parse_arrival(&self) -> AppResult<NaiveDateTime> {
        self.arrival
            .trim()
            .parse::<NaiveDateTime>()
            .map_err(|_| {
                AppError::BadRequest(format!("Invalid arrival timestamp: {}", self.arrival))
            })
    }
}

/// Visitor entry as exposed by the JSON API (signature omitted)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitorSummary {
    pub arrival: NaiveDateTime,
    pub departure: Option<NaiveDateTime>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub reason: Option<String>,
    pub host: Option<String>,
    pub phone: Option<String>,
    /// Whether a signature was captured
    pub signed: bool,
}

impl From<VisitorRecord> for VisitorSummary {
    fn from(record: VisitorRecord) -> Self {
        Self {
            signed: record.signature.is_some(),
            arrival: record.arrival,
            departure: record.departure,
            first_name: record.first_name,
            last_name: record.last_name,
            company: record.company,
            reason: record.reason,
            host: record.host,
            phone: record.phone,
        }
    }
}

/// Query parameters for week-scoped endpoints
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct WeekQuery {
    /// Any date of the requested week (YYYY-MM-DD), defaults to today
    pub week: Option<String>,
    /// Only list visitors who have not signed out
    #[serde(default)]
    pub open_only: bool,
}

impl WeekQuery {
    /// Parse the requested week anchor, if any
    pub fn anchor(&self) -> AppResult<Option<NaiveDate>> {
        self.week
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| AppError::BadRequest(format!("Invalid week date: {}", s)))
            })
            .transpose()
    }
}
