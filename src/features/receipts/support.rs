// テスト用のゲートウェイモック

use super::gateway::ReceiptGateway;
use super::models::{
    ExtractedReceiptData, ExtractionResult, SearchReceiptRecord, SearchReceiptsRequest,
    StoreReceiptRequest, UpdateReceiptRequest,
};
use crate::features::auth::models::{CreateUserRequest, LoginRequest, SessionUser};
use crate::features::auth::service::AuthGateway;
use crate::shared::errors::{AppError, AppResult};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// モックが記録するゲートウェイ呼び出し
#[derive(Debug, Clone)]
pub enum GatewayCall {
    CreateUser(Box<CreateUserRequest>),
    Login(Box<LoginRequest>),
    Store(Box<StoreReceiptRequest>),
    Update {
        id: String,
        request: Box<UpdateReceiptRequest>,
    },
    Delete {
        id: String,
        user_id: Option<String>,
    },
    Search(SearchReceiptsRequest),
    Upload(PathBuf),
    Process(String),
}

/// プログラム可能なレシートゲートウェイのモック
///
/// 各操作のキューに応答を積んでおくと順に消費する。キューが空の場合は
/// 成功デフォルトを返す。すべての呼び出しを発生順に記録する。
#[derive(Default)]
pub struct MockGateway {
    pub store_results: Mutex<VecDeque<Result<String, String>>>,
    pub update_results: Mutex<VecDeque<Result<(), String>>>,
    pub delete_results: Mutex<VecDeque<Result<(), String>>>,
    pub search_results: Mutex<VecDeque<Result<Vec<SearchReceiptRecord>, String>>>,
    pub upload_results: Mutex<VecDeque<Result<String, String>>>,
    pub process_results: Mutex<VecDeque<Result<ExtractionResult, String>>>,
    pub login_results: Mutex<VecDeque<Result<SessionUser, String>>>,
    pub calls: Mutex<Vec<GatewayCall>>,
    store_counter: Mutex<u64>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録された呼び出しのスナップショットを取得
    pub fn recorded_calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 記録された呼び出しの総数を取得
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 成功するセッションユーザーのサンプルを作成
    pub fn sample_user(id: &str, role: Option<&str>) -> SessionUser {
        SessionUser {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            role: role.map(|r| r.to_string()),
            is_active: Some(true),
            last_login: None,
        }
    }

    /// 成功する抽出結果のサンプルを作成
    pub fn sample_extraction(merchant: &str, total: f64) -> ExtractionResult {
        ExtractionResult {
            image_url: "https://img.example.com/sample.jpg".to_string(),
            average_confidence: 0.9,
            processing_time_seconds: 1.5,
            ocr_confidence_scores: vec![0.9],
            raw_ocr_text: vec![merchant.to_uppercase()],
            receipt_data: ExtractedReceiptData {
                merchant_name: merchant.to_string(),
                merchant_name_confidence: Some(0.9),
                total_amount: total,
                total_amount_confidence: Some(0.85),
                transaction_date: "2024-05-01".to_string(),
                transaction_date_confidence: Some(0.8),
                ..Default::default()
            },
        }
    }
}

impl AuthGateway for MockGateway {
    async fn create_user(&self, request: CreateUserRequest) -> AppResult<SessionUser> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::CreateUser(Box::new(request.clone())));

        let mut user = Self::sample_user("new-user", None);
        user.name = request.username;
        user.email = request.email;
        Ok(user)
    }

    async fn login(&self, request: LoginRequest) -> AppResult<SessionUser> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Login(Box::new(request)));

        match self.login_results.lock().unwrap().pop_front() {
            Some(Ok(user)) => Ok(user),
            Some(Err(message)) => Err(AppError::Authentication(message)),
            None => Ok(Self::sample_user("u1", None)),
        }
    }
}

impl ReceiptGateway for MockGateway {
    async fn store_receipt(&self, request: StoreReceiptRequest) -> AppResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Store(Box::new(request)));

        match self.store_results.lock().unwrap().pop_front() {
            Some(Ok(id)) => Ok(id),
            Some(Err(message)) => Err(AppError::Store(message)),
            None => {
                let mut counter = self.store_counter.lock().unwrap();
                *counter += 1;
                Ok(format!("r{counter}"))
            }
        }
    }

    async fn update_receipt(&self, id: &str, request: UpdateReceiptRequest) -> AppResult<()> {
        self.calls.lock().unwrap().push(GatewayCall::Update {
            id: id.to_string(),
            request: Box::new(request),
        });

        match self.update_results.lock().unwrap().pop_front() {
            Some(Ok(())) | None => Ok(()),
            Some(Err(message)) => Err(AppError::Update(message)),
        }
    }

    async fn delete_receipt(&self, id: &str, user_id: Option<&str>) -> AppResult<()> {
        self.calls.lock().unwrap().push(GatewayCall::Delete {
            id: id.to_string(),
            user_id: user_id.map(|u| u.to_string()),
        });

        match self.delete_results.lock().unwrap().pop_front() {
            Some(Ok(())) | None => Ok(()),
            Some(Err(message)) => Err(AppError::Delete(message)),
        }
    }

    async fn search_receipts(
        &self,
        request: SearchReceiptsRequest,
    ) -> AppResult<Vec<SearchReceiptRecord>> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Search(request));

        match self.search_results.lock().unwrap().pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(message)) => Err(AppError::Search(message)),
            None => Ok(vec![]),
        }
    }

    async fn upload_image(&self, local_path: &Path) -> AppResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Upload(local_path.to_path_buf()));

        match self.upload_results.lock().unwrap().pop_front() {
            Some(Ok(url)) => Ok(url),
            Some(Err(message)) => Err(AppError::Upload(message)),
            None => Ok(format!(
                "https://img.example.com/{}",
                local_path.file_name().and_then(|n| n.to_str()).unwrap_or("upload.jpg")
            )),
        }
    }

    async fn process_image(&self, image_ref: &str) -> AppResult<ExtractionResult> {
        self.calls
            .lock()
            .unwrap()
            .push(GatewayCall::Process(image_ref.to_string()));

        match self.process_results.lock().unwrap().pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(AppError::Processing(message)),
            None => Ok(Self::sample_extraction("Mock Mart", 9.99)),
        }
    }
}
