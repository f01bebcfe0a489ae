// バッチ処理ループ（選択済み画像の逐次抽出）

use super::gateway::ReceiptGateway;
use super::models::{parse_transaction_date, DraftItem, ExtractionResult, ReceiptDraft};
use super::pipeline::ImagePipeline;
use super::store::ReceiptStore;
use crate::features::receipts::categories::DEFAULT_CATEGORIES;
use crate::shared::errors::AppResult;
use chrono::Utc;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// バッチアイテムの処理状態
#[derive(Debug, Clone)]
pub enum BatchStatus {
    /// 未処理
    Pending,
    /// 抽出中
    Processing,
    /// 抽出成功（結果を保持）
    Completed(Box<ExtractionResult>),
    /// 抽出失敗（メッセージを保持）
    Error(String),
}

/// バッチ処理対象の1画像
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// アイテムID
    pub id: String,
    /// 画像参照（ローカルパスまたはリモートURL）
    pub image_ref: String,
    /// 処理状態
    pub status: BatchStatus,
}

impl BatchItem {
    /// 選択された画像参照からアイテムを作成する
    pub fn new(image_ref: impl Into<String>) -> Self {
        Self {
            id: format!("batch-{}", Uuid::new_v4()),
            image_ref: image_ref.into(),
            status: BatchStatus::Pending,
        }
    }

    /// 抽出に成功したか
    pub fn is_completed(&self) -> bool {
        matches!(self.status, BatchStatus::Completed(_))
    }
}

/// バッチ進捗の通知（アイテム1件の試行が終わるたびに送られる）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 試行済みアイテム数（成否を問わない）
    pub attempted: usize,
    /// 総アイテム数
    pub total: usize,
}

impl BatchProgress {
    /// 進捗率（0.0〜1.0）
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.attempted as f64 / self.total as f64
        }
    }
}

/// バッチ処理の集計結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// 総アイテム数
    pub total: usize,
    /// 成功数
    pub succeeded: usize,
    /// 失敗数
    pub failed: usize,
}

/// 選択済み画像集合への逐次バッチ抽出
///
/// 並列化・途中キャンセル・失敗分の自動再試行は行わない。
/// 各アイテムの成否は独立で、1件の失敗が残りを止めることはない。
pub struct BatchProcessor<G> {
    pipeline: ImagePipeline<G>,
}

impl<G: ReceiptGateway> BatchProcessor<G> {
    /// バッチプロセッサを作成する
    ///
    /// # 引数
    /// * `gateway` - レシートゲートウェイ
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            pipeline: ImagePipeline::new(gateway),
        }
    }

    /// アイテム列を選択順に1件ずつ処理する
    ///
    /// 各アイテムをProcessingにしてから抽出を実行し、結果に応じて
    /// Completed/Errorへ遷移させる。成否にかかわらず1件終わるごとに
    /// 進捗を通知する。前のアイテムの試行が解決するまで次のアイテムの
    /// 抽出は始まらない。
    ///
    /// # 引数
    /// * `items` - 処理対象アイテム（状態が書き換えられて返る）
    /// * `progress_tx` - 進捗通知チャネル（不要ならNone）
    ///
    /// # 戻り値
    /// 状態更新済みのアイテム列と集計結果
    pub async fn run(
        &self,
        mut items: Vec<BatchItem>,
        progress_tx: Option<mpsc::UnboundedSender<BatchProgress>>,
    ) -> (Vec<BatchItem>, BatchSummary) {
        let total = items.len();
        let mut succeeded = 0;
        let mut failed = 0;

        info!("バッチ抽出開始: 総アイテム数={total}");

        for (index, item) in items.iter_mut().enumerate() {
            item.status = BatchStatus::Processing;

            match self.pipeline.process(&item.image_ref).await {
                Ok(result) => {
                    item.status = BatchStatus::Completed(Box::new(result));
                    succeeded += 1;
                }
                Err(e) => {
                    error!("バッチアイテム{index}の抽出に失敗しました: {e}");
                    item.status = BatchStatus::Error(e.user_message());
                    failed += 1;
                }
            }

            if let Some(tx) = &progress_tx {
                let _ = tx.send(BatchProgress {
                    attempted: index + 1,
                    total,
                });
            }
        }

        info!("バッチ抽出完了: 成功={succeeded}, 失敗={failed}");

        (
            items,
            BatchSummary {
                total,
                succeeded,
                failed,
            },
        )
    }
}

/// 抽出結果からレシート下書きを組み立てる
///
/// バッチ保存時のデフォルト値: 店名が空なら"Receipt"、カテゴリは
/// 先頭の既定カテゴリ、説明には取り込み元と信頼度を記録する。
pub fn draft_from_extraction(result: &ExtractionResult) -> (ReceiptDraft, Vec<DraftItem>) {
    let data = &result.receipt_data;
    let default_category = &DEFAULT_CATEGORIES[0];

    let draft = ReceiptDraft {
        merchant_name: if data.merchant_name.is_empty() {
            "Receipt".to_string()
        } else {
            data.merchant_name.clone()
        },
        amount: data.total_amount,
        date: parse_transaction_date(&data.transaction_date).unwrap_or_else(Utc::now),
        category: default_category.name.clone(),
        category_id: default_category.id.clone(),
        description: Some(format!(
            "Auto-imported receipt ({}% confidence)",
            (result.average_confidence * 100.0).round() as i64
        )),
        image_uri: Some(result.image_url.clone()),
    };

    let items = data
        .items
        .iter()
        .map(|item| DraftItem {
            name: item.name.clone(),
            quantity: Some(1.0),
            unit_price: Some(item.price),
            total_price: Some(item.price),
        })
        .collect();

    (draft, items)
}

/// 抽出済みアイテムをキャッシュへ1件ずつ保存する
///
/// 逐次かつ非トランザクショナル。途中で失敗した場合、それまでに
/// 保存されたアイテムはロールバックされずに残り、エラーが返る。
/// Completed以外のアイテムはスキップする。
///
/// # 引数
/// * `store` - レシートキャッシュ
/// * `items` - バッチ処理済みアイテム
///
/// # 戻り値
/// 保存された件数
pub async fn commit_completed<G: ReceiptGateway>(
    store: &ReceiptStore<G>,
    items: &[BatchItem],
) -> AppResult<usize> {
    let mut saved = 0;

    for item in items {
        let BatchStatus::Completed(result) = &item.status else {
            continue;
        };

        let (draft, draft_items) = draft_from_extraction(result);
        store
            .add_receipt(draft, draft_items, Some((**result).clone()))
            .await?;
        saved += 1;
    }

    info!("バッチ保存完了: 保存件数={saved}");
    Ok(saved)
}
