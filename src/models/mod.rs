//! Data models for the register

pub mod visitor;

pub use visitor::{ExitVisitor, SubmitVisitor, VisitorRecord, VisitorSummary, WeekQuery};
