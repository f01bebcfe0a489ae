//! レシート管理アプリのクライアント同期レイヤー
//!
//! ローカルのレシートキャッシュをリモートのシステム・オブ・レコードと
//! 同期するライブラリ。ゲートウェイが承認した状態だけをキャッシュに
//! 反映し、画像は「アップロード→抽出」の2段階パイプラインで処理する。

pub mod features;
pub mod services;
pub mod shared;

pub use features::auth::{AuthGateway, AuthService, SessionStore, SessionUser};
pub use features::receipts::{
    ImagePipeline, LoadOutcome, Receipt, ReceiptGateway, ReceiptStore,
};
pub use features::reports::ReportStore;
pub use services::ApiClient;
pub use shared::config::{initialize_logging, ApiConfig};
pub use shared::errors::{AppError, AppResult, ErrorSeverity};

use features::receipts::BatchProcessor;
use std::sync::Arc;

/// アプリ全体のサービス束
///
/// ひとつのゲートウェイクライアントを認証・レシート・バッチ処理で
/// 共有し、ログイン状態の変化をレシートキャッシュへ伝える。
pub struct AppServices<G = ApiClient> {
    /// 認証サービス
    pub auth: AuthService<G>,
    /// レシートキャッシュ
    pub receipts: ReceiptStore<G>,
    /// 単一画像のアップロード→抽出パイプライン
    pub pipeline: ImagePipeline<G>,
    /// バッチプロセッサ
    pub batch: BatchProcessor<G>,
    /// 経費レポートストア
    pub reports: ReportStore,
}

impl AppServices<ApiClient> {
    /// 環境変数の設定でサービス束を初期化する
    ///
    /// # 戻り値
    /// サービス束、または設定エラー
    pub fn init() -> AppResult<Self> {
        initialize_logging();

        let config = ApiConfig::from_env()?;
        log::info!("設定を読み込みました: {:?}", config.get_debug_info());

        let session_store = SessionStore::in_default_location()?;
        Ok(Self::with_gateway(
            Arc::new(ApiClient::new(config)),
            session_store,
        ))
    }
}

impl<G: AuthGateway + ReceiptGateway> AppServices<G> {
    /// ゲートウェイとセッションストアを指定してサービス束を構築する
    ///
    /// # 引数
    /// * `gateway` - 共有ゲートウェイクライアント
    /// * `session_store` - セッション永続化ストア
    pub fn with_gateway(gateway: Arc<G>, session_store: SessionStore) -> Self {
        Self {
            auth: AuthService::new(Arc::clone(&gateway), session_store),
            receipts: ReceiptStore::new(Arc::clone(&gateway)),
            pipeline: ImagePipeline::new(Arc::clone(&gateway)),
            batch: BatchProcessor::new(gateway),
            reports: ReportStore::new(),
        }
    }

    /// 起動時の復元処理
    ///
    /// 保存済みセッションがあればレシートキャッシュに引き継ぎ、
    /// 一覧の読み込みまで行う。読み込み失敗は起動をブロックしない。
    ///
    /// # 戻り値
    /// レシート読み込みの結果
    pub async fn start(&self) -> AppResult<LoadOutcome> {
        if let Some(user) = self.auth.restore_session()? {
            self.receipts.set_session(user);
            Ok(self.receipts.load_receipts().await)
        } else {
            Ok(LoadOutcome::NotLoggedIn)
        }
    }

    /// ログインしてレシートキャッシュを再構築する
    ///
    /// # 引数
    /// * `username` - ユーザー名
    /// * `password` - パスワード
    ///
    /// # 戻り値
    /// ログインしたユーザーと読み込み結果
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(SessionUser, LoadOutcome)> {
        let user = self.auth.login(username, password).await?;
        self.receipts.set_session(user.clone());
        let outcome = self.receipts.load_receipts().await;
        Ok((user, outcome))
    }

    /// ユーザーを登録し、ログイン状態でキャッシュを初期化する
    pub async fn register(
        &self,
        username: &str,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<SessionUser> {
        let user = self.auth.register(username, full_name, email, password).await?;
        self.receipts.set_session(user.clone());
        // 新規ユーザーのレシートは空のはずだが、一覧は同じ経路で揃える
        self.receipts.load_receipts().await;
        Ok(user)
    }

    /// ログアウトしてキャッシュを破棄する
    pub fn logout(&self) -> AppResult<()> {
        self.auth.logout()?;
        self.receipts.clear_session();
        Ok(())
    }
}
