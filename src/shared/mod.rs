// 共有モジュール（設定・エラー型）

pub mod config;
pub mod errors;
