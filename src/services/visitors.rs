//! Visitor sign-in and sign-out service

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    error::AppResult,
    models::visitor::{SubmitVisitor, VisitorRecord, VisitorSummary},
    report::WeekWindow,
    repository::RecordStore,
};

#[derive(Clone)]
pub struct VisitorsService {
    store: Arc<dyn RecordStore>,
}

impl VisitorsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Register a visitor arriving at `arrival`
    pub async fn sign_in(
        &self,
        form: SubmitVisitor,
        arrival: NaiveDateTime,
    ) -> AppResult<VisitorRecord> {
        let record = VisitorRecord::from_submission(form, arrival);
        self.store.append(record.clone()).await?;
        tracing::info!(
            arrival = %record.arrival,
            signed = record.signature.is_some(),
            "Visitor signed in"
        );
        Ok(record)
    }

    /// Close the open record that arrived at `arrival`. Returns `false`
    /// when nothing matched, e.g. the visitor already left.
    pub async fn sign_out(&self, arrival: NaiveDateTime, at: NaiveDateTime) -> AppResult<bool> {
        let matched = self.store.mark_departure(arrival, at).await?;
        if matched {
            tracing::info!(arrival = %arrival, departure = %at, "Visitor signed out");
        } else {
            tracing::debug!(arrival = %arrival, "No open visit to close");
        }
        Ok(matched)
    }

    /// Visitors of the week containing `day`, oldest first
    pub async fn list_week(&self, day: NaiveDate, open_only: bool) -> AppResult<Vec<VisitorSummary>> {
        let window = WeekWindow::containing(day)?;
        let records = window.select(self.store.load_all().await?);
        Ok(records
            .into_iter()
            .filter(|r| !open_only || r.is_open())
            .map(VisitorSummary::from)
            .collect())
    }
}
