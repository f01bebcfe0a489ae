// リモートゲートウェイへのHTTPクライアント

use crate::features::auth::models::{
    CreateUserRequest, CreateUserResponse, LoginRequest, LoginResponse,
};
use crate::features::auth::service::AuthGateway;
use crate::features::auth::SessionUser;
use crate::features::receipts::gateway::ReceiptGateway;
use crate::features::receipts::models::{
    DeleteReceiptRequest, DeleteReceiptResponse, ExtractionResult, ProcessImageRequest,
    ProcessImageResponse, SearchReceiptRecord, SearchReceiptsRequest, SearchReceiptsResponse,
    StoreReceiptRequest, StoreReceiptResponse, UpdateReceiptRequest, UpdateReceiptResponse,
};
use crate::shared::config::ApiConfig;
use crate::shared::errors::{AppError, AppResult};
use log::{debug, error, info};
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// レシートゲートウェイと画像アップロードゲートウェイへのクライアント
///
/// すべてのエンドポイントはJSONボディのPOST/PUT/DELETE。トランスポート層の
/// 失敗（接続不可、非2xx、不正なJSON）はNetworkエラーへ正規化し、
/// ゲートウェイが`success: false`で報告した失敗は操作ごとのバリアントに
/// メッセージ付きで写す。
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// クライアントを作成する
    ///
    /// # 引数
    /// * `config` - 接続先設定
    pub fn new(config: ApiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// エンドポイントの完全なURLを組み立てる
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// JSONリクエストを送り、レスポンスをデシリアライズする
    ///
    /// 非2xxステータスと不正なJSONボディはNetworkエラーとして扱う。
    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.endpoint(path);
        debug!("{method} {url}");

        let response = self.http.request(method, &url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!("HTTPエラー: url={url}, status={status}");
            return Err(AppError::network(format!(
                "HTTPエラー: status={}",
                status.as_u16()
            )));
        }

        Ok(response.json::<T>().await?)
    }

    /// 拡張子からContent-Typeを推定する
    ///
    /// # 引数
    /// * `path` - ファイルパス
    ///
    /// # 戻り値
    /// Content-Type文字列
    pub fn get_content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("heic") => "image/heic",
            Some("pdf") => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

/// success:false応答のメッセージを取り出す
fn gateway_message(error_message: Option<String>, fallback: &str) -> String {
    match error_message {
        Some(message) if !message.is_empty() => message,
        _ => fallback.to_string(),
    }
}

impl AuthGateway for ApiClient {
    async fn create_user(&self, request: CreateUserRequest) -> AppResult<SessionUser> {
        let url = self.endpoint("/users/create");
        debug!("POST {url}");

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();

        // 登録拒否（メール重複など）は4xxで返る
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Registration(gateway_message(
                Some(body),
                "ユーザー登録に失敗しました",
            )));
        }
        if !status.is_success() {
            return Err(AppError::network(format!(
                "HTTPエラー: status={}",
                status.as_u16()
            )));
        }

        let created = response.json::<CreateUserResponse>().await?;
        info!("ユーザーを登録しました: user_id={}", created.id);
        Ok(created.into())
    }

    async fn login(&self, request: LoginRequest) -> AppResult<SessionUser> {
        let url = self.endpoint("/users/login");
        debug!("POST {url}");

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();

        // 認証拒否は4xxで返る
        if status.is_client_error() {
            return Err(AppError::authentication(
                "ユーザー名またはパスワードが正しくありません",
            ));
        }
        if !status.is_success() {
            return Err(AppError::network(format!(
                "HTTPエラー: status={}",
                status.as_u16()
            )));
        }

        let login = response.json::<LoginResponse>().await?;
        Ok(login.user.into())
    }
}

impl ReceiptGateway for ApiClient {
    async fn store_receipt(&self, request: StoreReceiptRequest) -> AppResult<String> {
        let response: StoreReceiptResponse = self
            .send_json(reqwest::Method::POST, "/store-receipt", &request)
            .await?;

        if !response.success {
            return Err(AppError::Store(gateway_message(
                response.error_message,
                "レシートの保存に失敗しました",
            )));
        }

        response
            .receipt_id
            .ok_or_else(|| AppError::Store("応答にreceipt_idが含まれていません".to_string()))
    }

    async fn update_receipt(&self, id: &str, request: UpdateReceiptRequest) -> AppResult<()> {
        let response: UpdateReceiptResponse = self
            .send_json(reqwest::Method::PUT, &format!("/receipt/{id}"), &request)
            .await?;

        if !response.success {
            return Err(AppError::Update(gateway_message(
                response.error_message,
                "レシートの更新に失敗しました",
            )));
        }
        Ok(())
    }

    async fn delete_receipt(&self, id: &str, user_id: Option<&str>) -> AppResult<()> {
        let request = DeleteReceiptRequest {
            user_id: user_id.map(|u| u.to_string()),
        };
        let response: DeleteReceiptResponse = self
            .send_json(reqwest::Method::DELETE, &format!("/receipt/{id}"), &request)
            .await?;

        if !response.success {
            return Err(AppError::Delete(gateway_message(
                response.error_message,
                "レシートの削除に失敗しました",
            )));
        }
        Ok(())
    }

    async fn search_receipts(
        &self,
        request: SearchReceiptsRequest,
    ) -> AppResult<Vec<SearchReceiptRecord>> {
        let response: SearchReceiptsResponse = self
            .send_json(reqwest::Method::POST, "/search-receipts", &request)
            .await?;

        if !response.success {
            return Err(AppError::Search(gateway_message(
                response.error_message,
                "レシートの検索に失敗しました",
            )));
        }

        debug!("検索結果: count={}", response.count);
        Ok(response.receipts)
    }

    async fn upload_image(&self, local_path: &Path) -> AppResult<String> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            AppError::Upload(format!(
                "画像ファイルを読み込めません: {}: {e}",
                local_path.display()
            ))
        })?;

        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("receipt.jpg")
            .to_string();
        let content_type = Self::get_content_type(local_path);

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(content_type)
            .map_err(|e| AppError::Upload(format!("Content-Typeが不正です: {e}")))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.config.upload_preset.clone());

        info!("画像をアップロードします: {}", local_path.display());
        let response = self
            .http
            .post(&self.config.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("アップロード通信エラー: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upload(format!(
                "アップロード先がエラーを返しました: status={}",
                status.as_u16()
            )));
        }

        // secure_urlを含まない応答はすべて失敗として扱う
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("アップロード応答の解析に失敗: {e}")))?;
        body.get("secure_url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Upload("応答にsecure_urlが含まれていません".to_string()))
    }

    async fn process_image(&self, image_url: &str) -> AppResult<ExtractionResult> {
        let request = ProcessImageRequest {
            image_url: image_url.to_string(),
        };
        let response: ProcessImageResponse = self
            .send_json(reqwest::Method::POST, "/process-image", &request)
            .await?;

        if !response.success {
            return Err(AppError::Processing(gateway_message(
                response.error_message,
                "画像の解析に失敗しました",
            )));
        }

        Ok(ExtractionResult::from_response(
            response,
            image_url.to_string(),
        ))
    }
}
