// リモートレシートゲートウェイの抽象化

use super::models::{
    ExtractionResult, SearchReceiptRecord, SearchReceiptsRequest, StoreReceiptRequest,
    UpdateReceiptRequest,
};
use crate::shared::errors::AppResult;
use std::path::Path;

/// リモートレシートゲートウェイと画像アップロードゲートウェイの操作セット
///
/// キャッシュ・画像パイプライン・バッチ処理はこのトレイト越しにのみ
/// ネットワークへ到達する。本番実装は`ApiClient`、テストではモックを注入する。
/// 各操作は1往復のネットワーク呼び出しで、リトライは行わない。
pub trait ReceiptGateway {
    /// レシートを保存し、サーバー発行のIDを返す
    async fn store_receipt(&self, request: StoreReceiptRequest) -> AppResult<String>;

    /// レシートを部分更新する（省略フィールドはサーバー側で未変更）
    async fn update_receipt(
        &self,
        id: &str,
        request: UpdateReceiptRequest,
    ) -> AppResult<()>;

    /// レシートを削除する
    async fn delete_receipt(&self, id: &str, user_id: Option<&str>) -> AppResult<()>;

    /// レシートを検索する（並び順はゲートウェイが決める）
    async fn search_receipts(
        &self,
        request: SearchReceiptsRequest,
    ) -> AppResult<Vec<SearchReceiptRecord>>;

    /// ローカル画像をアップロードし、公開URLを返す
    async fn upload_image(&self, local_path: &Path) -> AppResult<String>;

    /// 画像からレシート情報を抽出する
    ///
    /// `image_url`はゲートウェイから到達可能なURLであること。ローカル参照
    /// からURLへの解決はこのトレイトではなく`ImagePipeline`が担う。
    async fn process_image(&self, image_url: &str) -> AppResult<ExtractionResult>;
}
