use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
///
/// 発生源ごとにバリアントを分ける。ゲートウェイが `success: false` で
/// 返したメッセージは、対応する操作バリアントにそのまま保持する。
#[derive(Debug, Error)]
pub enum AppError {
    /// ログイン認証がゲートウェイに拒否された場合のエラー
    #[error("認証エラー: {0}")]
    Authentication(String),

    /// ユーザー登録がゲートウェイに拒否された場合のエラー（メール重複など）
    #[error("登録エラー: {0}")]
    Registration(String),

    /// ログインしていない状態でレシート操作を行った場合のエラー
    ///
    /// ネットワーク呼び出しの前に即座に失敗する。
    #[error("ログインが必要です")]
    AuthenticationRequired,

    /// レシート保存でゲートウェイが失敗を報告した場合のエラー
    #[error("保存エラー: {0}")]
    Store(String),

    /// レシート更新でゲートウェイが失敗を報告した場合のエラー
    #[error("更新エラー: {0}")]
    Update(String),

    /// レシート削除でゲートウェイが失敗を報告した場合のエラー
    #[error("削除エラー: {0}")]
    Delete(String),

    /// レシート検索でゲートウェイが失敗を報告した場合のエラー
    #[error("検索エラー: {0}")]
    Search(String),

    /// 画像アップロードに失敗した場合のエラー
    #[error("アップロードエラー: {0}")]
    Upload(String),

    /// 画像解析（OCR抽出）でゲートウェイが失敗を報告した場合のエラー
    #[error("画像解析エラー: {0}")]
    Processing(String),

    /// トランスポート層のエラー（接続不可、非2xx、不正なJSONなど）
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// セッション保存・復元関連のエラー
    #[error("セッションエラー: {0}")]
    Session(String),

    /// レポート承認フローの権限エラー
    #[error("権限エラー: {0}")]
    Permission(String),

    /// 経費レポートの状態遷移エラー（下書き以外の提出など）
    #[error("レポートエラー: {0}")]
    Report(String),

    /// I/O関連のエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析エラー
    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー操作で解決できるエラーなど）
    Low,
    /// 中重要度（外部サービス一時的エラーなど）
    Medium,
    /// 高重要度（設定エラーなど）
    High,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            AppError::Authentication(msg) => msg.clone(),
            AppError::Registration(msg) => msg.clone(),
            AppError::AuthenticationRequired => "ログインが必要です".to_string(),
            AppError::Store(msg)
            | AppError::Update(msg)
            | AppError::Delete(msg)
            | AppError::Search(msg)
            | AppError::Processing(msg) => msg.clone(),
            AppError::Upload(_) => "画像のアップロードに失敗しました".to_string(),
            AppError::Network(_) => "ネットワークエラーが発生しました".to_string(),
            AppError::Configuration(_) => "設定エラーが発生しました".to_string(),
            AppError::Session(_) => "セッションの保存・復元でエラーが発生しました".to_string(),
            AppError::Permission(msg) => msg.clone(),
            AppError::Report(msg) => msg.clone(),
            AppError::Io(_) => "ファイル操作でエラーが発生しました".to_string(),
            AppError::Json(_) => "データ形式の解析でエラーが発生しました".to_string(),
        }
    }

    /// エラーの詳細情報を取得
    ///
    /// # 戻り値
    /// エラーの詳細情報（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Authentication(_)
            | AppError::Registration(_)
            | AppError::AuthenticationRequired
            | AppError::Permission(_)
            | AppError::Report(_) => ErrorSeverity::Low,
            AppError::Store(_)
            | AppError::Update(_)
            | AppError::Delete(_)
            | AppError::Search(_)
            | AppError::Upload(_)
            | AppError::Processing(_)
            | AppError::Network(_)
            | AppError::Io(_)
            | AppError::Json(_) => ErrorSeverity::Medium,
            AppError::Configuration(_) | AppError::Session(_) => ErrorSeverity::High,
        }
    }

    /// 認証エラーを作成するヘルパー関数
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        AppError::Authentication(message.into())
    }

    /// ネットワークエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - トランスポート層のエラーメッセージ
    ///
    /// # 戻り値
    /// ネットワークエラー
    pub fn network<S: Into<String>>(message: S) -> Self {
        AppError::Network(message.into())
    }

    /// 設定エラーを作成するヘルパー関数
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    /// セッションエラーを作成するヘルパー関数
    pub fn session<S: Into<String>>(message: S) -> Self {
        AppError::Session(message.into())
    }
}

/// AppErrorからStringへの変換（UI層での表示のため）
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message()
    }
}

/// reqwest::ErrorからAppErrorへの変換
///
/// 接続失敗・タイムアウト・ボディ解析失敗はすべてトランスポートエラーに正規化する。
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Network(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;
