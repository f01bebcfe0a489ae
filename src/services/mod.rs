// 外部サービス連携モジュール

pub mod api_client;

pub use api_client::ApiClient;
