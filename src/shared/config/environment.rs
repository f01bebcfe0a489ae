// 環境変数ベースの設定管理

use crate::shared::errors::{AppError, AppResult};
use std::collections::HashMap;
use url::Url;

/// デフォルトのゲートウェイURL（開発環境向け）
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// デフォルトのアップロードプリセット
const DEFAULT_UPLOAD_PRESET: &str = "receipts";

/// リモートゲートウェイ接続設定
///
/// レシートゲートウェイと画像アップロードゲートウェイのエンドポイントを保持する。
/// `.env`ファイルまたは環境変数から読み込む。
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// レシートゲートウェイのベースURL
    pub base_url: String,
    /// 画像アップロードゲートウェイのURL
    pub upload_url: String,
    /// アップロードプリセット（固定トークン）
    pub upload_preset: String,
}

impl ApiConfig {
    /// 環境変数から設定を読み込む
    ///
    /// # 環境変数
    /// * `API_BASE_URL` - レシートゲートウェイのベースURL
    /// * `UPLOAD_URL` - 画像アップロードゲートウェイのURL
    /// * `UPLOAD_PRESET` - アップロードプリセット
    ///
    /// # 戻り値
    /// 検証済みの設定、または失敗時はAppError
    pub fn from_env() -> AppResult<Self> {
        // .envファイルがあれば読み込む（なければ環境変数のみ）
        if dotenv::dotenv().is_err() {
            log::debug!(".envファイルが見つかりません。環境変数を直接使用します");
        }

        let config = Self {
            base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            upload_url: std::env::var("UPLOAD_URL").unwrap_or_default(),
            upload_preset: std::env::var("UPLOAD_PRESET")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_PRESET.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// 指定値から設定を構築する（テスト・DI用）
    pub fn new(base_url: &str, upload_url: &str, upload_preset: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            upload_url: upload_url.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }

    /// 設定値を検証する
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はAppError
    pub fn validate(&self) -> AppResult<()> {
        if self.base_url.is_empty() {
            return Err(AppError::configuration(
                "API_BASE_URLが設定されていません",
            ));
        }

        validate_http_url("API_BASE_URL", &self.base_url)?;

        // アップロードURLは画像機能を使わない構成では空でもよい
        if !self.upload_url.is_empty() {
            validate_http_url("UPLOAD_URL", &self.upload_url)?;
        }

        if self.upload_preset.is_empty() {
            return Err(AppError::configuration(
                "UPLOAD_PRESETが設定されていません",
            ));
        }

        Ok(())
    }

    /// 設定のデバッグ情報を取得（秘匿値は含まない）
    ///
    /// # 戻り値
    /// キーと値のマップ（ログ出力用）
    pub fn get_debug_info(&self) -> HashMap<String, String> {
        let mut info = HashMap::new();
        info.insert("base_url".to_string(), self.base_url.clone());
        info.insert("upload_url".to_string(), self.upload_url.clone());
        info.insert(
            "upload_preset_set".to_string(),
            (!self.upload_preset.is_empty()).to_string(),
        );
        info
    }
}

/// http(s)のURLであることを検証する
fn validate_http_url(name: &str, value: &str) -> AppResult<()> {
    let parsed = Url::parse(value).map_err(|e| {
        AppError::configuration(format!("{name}の形式が不正です: {value}: {e}"))
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::configuration(format!(
            "{name}はhttp(s)である必要があります: {value}"
        )));
    }

    Ok(())
}

/// ログシステムを初期化する
///
/// `LOG_LEVEL`環境変数でレベルを制御する（デフォルト: info）。
/// 複数回呼ばれても2回目以降は無視される。
pub fn initialize_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env = env_logger::Env::default().default_filter_or(log_level);
    let _ = env_logger::Builder::from_env(env).try_init();
}
