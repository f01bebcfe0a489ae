// 機能モジュール

pub mod analytics;
pub mod auth;
pub mod receipts;
pub mod reports;
