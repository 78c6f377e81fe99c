//! Business logic services

pub mod reports;
pub mod visitors;

use std::sync::Arc;

use crate::{config::ReportConfig, repository::RecordStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub visitors: visitors::VisitorsService,
    pub reports: reports::ReportsService,
}

impl Services {
    /// Create all services over the given record store
    pub fn new(store: Arc<dyn RecordStore>, report_config: &ReportConfig) -> Self {
        Self {
            visitors: visitors::VisitorsService::new(store.clone()),
            reports: reports::ReportsService::new(store, report_config),
        }
    }
}
