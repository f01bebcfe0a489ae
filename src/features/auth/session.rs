// セッションのローカル永続化

use super::models::SessionUser;
use crate::shared::errors::{AppError, AppResult};
use std::path::PathBuf;

/// セッションファイルの固定キー（ファイル名）
const SESSION_FILE_NAME: &str = "session_user.json";

/// ログイン中ユーザーをローカルディスクに保存・復元するストア
///
/// アプリ再起動をまたいで持続するクライアント側状態はこのファイル一つだけ。
/// レシートキャッシュ自体は永続化されず、セッション開始時に
/// ゲートウェイから再構築される。
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    /// 保存先ディレクトリを指定してストアを作成する
    ///
    /// # 引数
    /// * `data_dir` - セッションファイルの保存先ディレクトリ
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// プラットフォーム標準のデータディレクトリにストアを作成する
    ///
    /// # 戻り値
    /// ストア、またはデータディレクトリを特定できない場合はAppError
    pub fn in_default_location() -> AppResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| AppError::session("データディレクトリを特定できません"))?;
        Ok(Self::new(base.join("receipt-sync")))
    }

    /// セッションファイルのパスを取得
    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE_NAME)
    }

    /// ログイン中ユーザーを保存する
    ///
    /// # 引数
    /// * `user` - 保存するユーザー
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はAppError
    pub fn save(&self, user: &SessionUser) -> AppResult<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                AppError::session(format!("セッションディレクトリ作成失敗: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(user)?;
        std::fs::write(self.session_path(), json)
            .map_err(|e| AppError::session(format!("セッションファイル書き込み失敗: {e}")))?;

        log::info!("セッションを保存しました: user_id={}", user.id);
        Ok(())
    }

    /// 保存されたユーザーを復元する
    ///
    /// ファイルが存在しない場合はOk(None)。壊れたファイルは警告を出して
    /// 未ログイン扱いにする（起動をブロックしない）。
    ///
    /// # 戻り値
    /// 復元されたユーザー（存在する場合）
    pub fn load(&self) -> AppResult<Option<SessionUser>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| AppError::session(format!("セッションファイル読み込み失敗: {e}")))?;

        match serde_json::from_str::<SessionUser>(&raw) {
            Ok(user) => {
                log::debug!("セッションを復元しました: user_id={}", user.id);
                Ok(Some(user))
            }
            Err(e) => {
                log::warn!("セッションファイルの解析に失敗しました。未ログイン扱いにします: {e}");
                Ok(None)
            }
        }
    }

    /// 保存されたセッションを破棄する（ログアウト時）
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はAppError
    pub fn clear(&self) -> AppResult<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| AppError::session(format!("セッションファイル削除失敗: {e}")))?;
            log::info!("セッションを破棄しました");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_user() -> SessionUser {
        SessionUser {
            id: "u1".to_string(),
            name: "Taro".to_string(),
            email: "taro@example.com".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            role: None,
            is_active: Some(true),
            last_login: None,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());

        assert_eq!(store.load().unwrap(), None);

        let user = test_user();
        store.save(&user).unwrap();

        let restored = store.load().unwrap().unwrap();
        assert_eq!(restored, user);
    }

    #[test]
    fn test_clear_removes_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());

        store.save(&test_user()).unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);

        // 二重クリアはエラーにならない
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_session_file_is_treated_as_logged_out() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path().to_path_buf());

        std::fs::create_dir_all(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join(SESSION_FILE_NAME), "not json").unwrap();

        // 壊れたファイルはエラーではなく未ログイン扱い
        assert_eq!(store.load().unwrap(), None);
    }
}
