//! Weekly report service

use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    config::ReportConfig,
    error::{AppError, AppResult},
    report::{ReportRenderer, TableLayout, WeekWindow},
    repository::RecordStore,
};

/// A rendered weekly register, ready to be downloaded
#[derive(Debug, Clone)]
pub struct WeeklyExport {
    pub window: WeekWindow,
    pub rows: usize,
    pub pdf: Vec<u8>,
}

#[derive(Clone)]
pub struct ReportsService {
    store: Arc<dyn RecordStore>,
    renderer: ReportRenderer,
}

impl ReportsService {
    pub fn new(store: Arc<dyn RecordStore>, config: &ReportConfig) -> Self {
        let layout = if config.show_departure {
            TableLayout::with_departure()
        } else {
            TableLayout::standard()
        };
        Self {
            store,
            renderer: ReportRenderer::new(layout),
        }
    }

    /// Render the register of the week containing `day`.
    ///
    /// The window always comes from `day`, so an empty week still gets its
    /// title. Signature decoding and layout run on the blocking pool.
    pub async fn export_week(&self, day: NaiveDate) -> AppResult<WeeklyExport> {
        let window = WeekWindow::containing(day)?;
        let records = window.select(self.store.load_all().await?);
        let rows = records.len();

        let renderer = self.renderer.clone();
        let pdf = tokio::task::spawn_blocking(move || renderer.render(&window, &records))
            .await
            .map_err(|e| AppError::Report(format!("Render task failed: {}", e)))??;

        tracing::info!(
            week_start = %window.start.date(),
            rows,
            bytes = pdf.len(),
            "Exported weekly register"
        );

        Ok(WeeklyExport { window, rows, pdf })
    }
}
