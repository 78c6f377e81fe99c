//! Weekly register report: week selection, table layout, signature
//! embedding and PDF output

pub mod layout;
pub mod pdf;
pub mod signature;
pub mod window;

pub use layout::TableLayout;
pub use pdf::ReportRenderer;
pub use window::WeekWindow;

/// MIME type of the rendered report
pub const PDF_CONTENT_TYPE: &str = "application/pdf";
