// 認証サービス（ログイン・登録・ログアウト）

use super::models::{CreateUserRequest, LoginRequest, SessionUser};
use super::session::SessionStore;
use crate::shared::errors::AppResult;
use std::sync::{Arc, Mutex};

/// 認証ゲートウェイの操作セット
///
/// 本番実装は`ApiClient`。テストではモックを注入する。
pub trait AuthGateway {
    /// ユーザーを登録する
    async fn create_user(&self, request: CreateUserRequest) -> AppResult<SessionUser>;

    /// ログインする
    async fn login(&self, request: LoginRequest) -> AppResult<SessionUser>;
}

/// セッション状態を所有する認証サービス
///
/// ログイン・登録成功時にユーザーをローカルへ永続化し、
/// ログアウト時に破棄する。レシート操作はこのサービスが保持する
/// ユーザーの有無でゲートされる。
pub struct AuthService<G> {
    gateway: Arc<G>,
    store: SessionStore,
    current: Mutex<Option<SessionUser>>,
}

impl<G: AuthGateway> AuthService<G> {
    /// 認証サービスを作成する
    ///
    /// # 引数
    /// * `gateway` - 認証ゲートウェイ
    /// * `store` - セッション永続化ストア
    pub fn new(gateway: Arc<G>, store: SessionStore) -> Self {
        Self {
            gateway,
            store,
            current: Mutex::new(None),
        }
    }

    /// 起動時に保存済みセッションを復元する
    ///
    /// # 戻り値
    /// 復元されたユーザー（存在する場合）
    pub fn restore_session(&self) -> AppResult<Option<SessionUser>> {
        let restored = self.store.load()?;
        if let Some(user) = &restored {
            log::info!("保存済みセッションから復元しました: user_id={}", user.id);
        }
        *self.current.lock().unwrap() = restored.clone();
        Ok(restored)
    }

    /// ログインする
    ///
    /// # 引数
    /// * `username` - ユーザー名
    /// * `password` - パスワード
    ///
    /// # 戻り値
    /// ログインしたユーザー、または認証エラー
    pub async fn login(&self, username: &str, password: &str) -> AppResult<SessionUser> {
        let user = self
            .gateway
            .login(LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.store.save(&user)?;
        *self.current.lock().unwrap() = Some(user.clone());

        log::info!("ログインしました: user_id={}", user.id);
        Ok(user)
    }

    /// ユーザーを登録し、そのままログイン状態にする
    ///
    /// パスワードポリシーの検証はUI層の責務（このレイヤーでは行わない）。
    ///
    /// # 戻り値
    /// 登録されたユーザー、または登録エラー
    pub async fn register(
        &self,
        username: &str,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<SessionUser> {
        let user = self
            .gateway
            .create_user(CreateUserRequest {
                username: username.to_string(),
                full_name: full_name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.store.save(&user)?;
        *self.current.lock().unwrap() = Some(user.clone());

        log::info!("ユーザー登録が完了しました: user_id={}", user.id);
        Ok(user)
    }

    /// ログアウトする
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はAppError
    pub fn logout(&self) -> AppResult<()> {
        self.store.clear()?;
        *self.current.lock().unwrap() = None;
        log::info!("ログアウトしました");
        Ok(())
    }

    /// 現在のログイン中ユーザーを取得する
    pub fn current_user(&self) -> Option<SessionUser> {
        self.current.lock().unwrap().clone()
    }
}
