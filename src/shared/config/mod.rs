// 設定モジュール

pub mod environment;

pub use environment::{initialize_logging, ApiConfig};
