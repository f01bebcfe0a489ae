// 経費レポート機能モジュール

pub mod models;
pub mod store;

pub use models::{ExpenseReport, ReportStatus, StatusCounts};
pub use store::ReportStore;
