// 画像パイプライン（アップロード→抽出の2段階フロー)

use super::gateway::ReceiptGateway;
use super::models::ExtractionResult;
use crate::shared::errors::AppResult;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// レシート画像の2段階処理パイプライン
///
/// 抽出処理は到達可能なURLしか受け付けないため、ローカル画像は
/// 必ず先にアップロードする。2段階を分離しているのは、抽出が失敗しても
/// アップロード済みURLは有効なまま残り、ユーザーが画像付きで手動保存
/// できるようにするため。
pub struct ImagePipeline<G> {
    gateway: Arc<G>,
}

impl<G: ReceiptGateway> ImagePipeline<G> {
    /// パイプラインを作成する
    ///
    /// # 引数
    /// * `gateway` - レシートゲートウェイ
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// 第1段階: ローカル画像をアップロードして公開URLを得る
    ///
    /// # 引数
    /// * `local_path` - ローカル画像のパス
    ///
    /// # 戻り値
    /// アップロード先の公開URL、または失敗時はUploadエラー
    pub async fn upload(&self, local_path: &Path) -> AppResult<String> {
        info!("画像アップロード開始: {}", local_path.display());
        let url = self.gateway.upload_image(local_path).await?;
        info!("画像アップロード完了: {url}");
        Ok(url)
    }

    /// 第2段階: アップロード済みURLに対して抽出を実行する
    ///
    /// # 引数
    /// * `image_url` - 第1段階で得た公開URL
    ///
    /// # 戻り値
    /// 抽出結果、または失敗時はProcessingエラー
    pub async fn extract(&self, image_url: &str) -> AppResult<ExtractionResult> {
        debug!("画像抽出開始: {image_url}");
        let result = self.gateway.process_image(image_url).await?;
        info!(
            "画像抽出完了: merchant={}, confidence={:.2}",
            result.receipt_data.merchant_name, result.average_confidence
        );
        Ok(result)
    }

    /// 画像参照から抽出まで通しで実行する
    ///
    /// ローカルパスを渡された場合は暗黙にアップロードを挟む。
    /// リモートURLの場合はアップロードをスキップして抽出だけ行う。
    /// 第1段階の失敗はUploadエラーとして止まり、抽出は試みない。
    ///
    /// # 引数
    /// * `image_ref` - リモートURLまたはローカル画像パス
    ///
    /// # 戻り値
    /// 抽出結果（`image_url`に解決済みのリモートURLが入る）
    pub async fn process(&self, image_ref: &str) -> AppResult<ExtractionResult> {
        let url = if image_ref.starts_with("http") {
            image_ref.to_string()
        } else {
            self.upload(Path::new(image_ref)).await?
        };

        self.extract(&url).await
    }
}
