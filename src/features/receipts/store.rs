// レシートキャッシュ（セッション単位のインメモリミラー）

use super::gateway::ReceiptGateway;
use super::models::{
    format_transaction_date, parse_transaction_date, AppNotes, Category, DraftItem,
    ExtractionResult, Receipt, ReceiptData, ReceiptDraft, ReceiptItem, ReceiptPatch,
    SearchReceiptRecord, SearchReceiptsRequest, StoreReceiptRequest, UpdateReceiptData,
    UpdateReceiptRequest, WireItem, APP_NOTES_VERSION, DEFAULT_LOAD_LIMIT,
};
use crate::features::auth::models::SessionUser;
use crate::features::receipts::categories::DEFAULT_CATEGORIES;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

/// バックグラウンド読み込みの結果
///
/// 読み込み失敗はこのレイヤーで飲み込み、ブロッキングエラーとしては
/// 伝播しない。呼び出し側はEmpty/Failedを同一視してもよいが、
/// 区別は明示的に保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// 読み込み成功（件数付き）
    Loaded(usize),
    /// 読み込み成功、結果0件
    Empty,
    /// 読み込み失敗（キャッシュは空リストに置き換え済み）
    Failed,
    /// 未ログインのためスキップ
    NotLoggedIn,
}

/// ログイン中ユーザーのレシートをメモリ上に保持するキャッシュ
///
/// リモートゲートウェイが承認した状態のみを反映する（投機的な挿入は
/// 行わない）。リストの書き込みはこのコンポーネントだけが行い、
/// ディスクには保存しない。ログアウトで空になり、次のログインで
/// ゲートウェイから再構築される。
pub struct ReceiptStore<G> {
    gateway: Arc<G>,
    session: Mutex<Option<SessionUser>>,
    receipts: Mutex<Vec<Receipt>>,
}

impl<G: ReceiptGateway> ReceiptStore<G> {
    /// キャッシュを作成する
    ///
    /// # 引数
    /// * `gateway` - レシートゲートウェイ
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            session: Mutex::new(None),
            receipts: Mutex::new(Vec::new()),
        }
    }

    /// セッションユーザーを設定する（ログイン時）
    pub fn set_session(&self, user: SessionUser) {
        debug!("レシートキャッシュにセッションを設定: user_id={}", user.id);
        *self.session.lock().unwrap() = Some(user);
    }

    /// セッションを破棄し、キャッシュを空にする（ログアウト時）
    pub fn clear_session(&self) {
        *self.session.lock().unwrap() = None;
        self.receipts.lock().unwrap().clear();
        info!("レシートキャッシュをクリアしました");
    }

    /// 現在キャッシュされているレシートのスナップショットを取得
    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.lock().unwrap().clone()
    }

    /// カテゴリ定義を取得（固定セット）
    pub fn categories(&self) -> &'static [Category] {
        &DEFAULT_CATEGORIES
    }

    /// 現在のセッションユーザーIDを取得（未ログインはエラー）
    fn require_user_id(&self) -> AppResult<String> {
        self.session
            .lock()
            .unwrap()
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or(AppError::AuthenticationRequired)
    }

    /// ゲートウェイからレシート一覧を読み込み、キャッシュを丸ごと置き換える
    ///
    /// 失敗はここで飲み込み、空リストに置き換えて`Failed`を返す。
    /// バックグラウンド更新の失敗でユーザーをブロックしないための方針。
    ///
    /// # 戻り値
    /// 読み込み結果
    pub async fn load_receipts(&self) -> LoadOutcome {
        let user_id = match self.session.lock().unwrap().as_ref() {
            Some(user) => user.id.clone(),
            None => {
                debug!("未ログインのためレシート読み込みをスキップします");
                return LoadOutcome::NotLoggedIn;
            }
        };

        let request = SearchReceiptsRequest {
            limit: Some(DEFAULT_LOAD_LIMIT),
            user_id: Some(user_id),
            ..Default::default()
        };

        match self.gateway.search_receipts(request).await {
            Ok(records) => {
                let receipts: Vec<Receipt> =
                    records.into_iter().map(map_search_record).collect();
                let count = receipts.len();
                // 差分マージはせず、一覧全体をアトミックに置き換える
                *self.receipts.lock().unwrap() = receipts;

                info!("レシートを読み込みました: count={count}");
                if count == 0 {
                    LoadOutcome::Empty
                } else {
                    LoadOutcome::Loaded(count)
                }
            }
            Err(e) => {
                warn!("レシート読み込みに失敗しました（空リストで継続）: {e}");
                *self.receipts.lock().unwrap() = Vec::new();
                LoadOutcome::Failed
            }
        }
    }

    /// レシートを作成する
    ///
    /// ユーザー入力値は抽出結果より常に優先される。サーバーが作成を
    /// 承認してIDを返した後にのみ、ローカル下書きから構築したエントリを
    /// キャッシュへ追加する。失敗時はキャッシュを変更せずエラーを返す。
    ///
    /// # 引数
    /// * `draft` - ユーザー入力の下書き
    /// * `items` - 明細行（空の場合は抽出結果の明細を使う）
    /// * `extraction` - 画像抽出結果（ある場合）
    ///
    /// # 戻り値
    /// キャッシュに追加されたレシート
    pub async fn add_receipt(
        &self,
        draft: ReceiptDraft,
        items: Vec<DraftItem>,
        extraction: Option<ExtractionResult>,
    ) -> AppResult<Receipt> {
        let user_id = self.require_user_id()?;

        let request = build_store_request(&user_id, &draft, &items, extraction.as_ref());
        let receipt_id = self.gateway.store_receipt(request).await?;

        info!("レシートを保存しました: receipt_id={receipt_id}");

        let now = Utc::now();
        let wire_items = merge_items(&items, extraction.as_ref());
        let receipt = Receipt {
            id: receipt_id.clone(),
            merchant_name: draft.merchant_name,
            amount: draft.amount,
            date: draft.date,
            category: draft.category,
            category_id: draft.category_id,
            description: draft.description,
            image_uri: draft.image_uri,
            items: wire_items
                .iter()
                .enumerate()
                .map(|(index, item)| ReceiptItem {
                    item_id: index as i64,
                    receipt_id: receipt_id.clone(),
                    item_name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };

        let mut receipts = self.receipts.lock().unwrap();
        // 同一IDの重複は許さない
        if let Some(existing) = receipts.iter_mut().find(|r| r.id == receipt.id) {
            warn!("既存IDのレシートを置き換えます: id={}", receipt.id);
            *existing = receipt.clone();
        } else {
            receipts.push(receipt.clone());
        }

        Ok(receipt)
    }

    /// レシートを部分更新する
    ///
    /// パッチに含まれるフィールドのみをゲートウェイへ送り、成功後に
    /// キャッシュ内の該当エントリをフィールド単位で書き換える。
    /// パッチにないフィールドは既存値を維持し、`updated_at`を進める。
    ///
    /// # 引数
    /// * `id` - レシートID
    /// * `patch` - 部分更新パッチ
    pub async fn update_receipt(&self, id: &str, patch: ReceiptPatch) -> AppResult<()> {
        let user_id = self.require_user_id()?;

        let request = build_update_request(&user_id, &patch);
        self.gateway.update_receipt(id, request).await?;

        info!("レシートを更新しました: receipt_id={id}");

        let mut receipts = self.receipts.lock().unwrap();
        if let Some(receipt) = receipts.iter_mut().find(|r| r.id == id) {
            if let Some(merchant_name) = patch.merchant_name {
                receipt.merchant_name = merchant_name;
            }
            if let Some(amount) = patch.amount {
                receipt.amount = amount;
            }
            if let Some(date) = patch.date {
                receipt.date = date;
            }
            if let Some(category) = patch.category {
                receipt.category = category;
            }
            if let Some(category_id) = patch.category_id {
                receipt.category_id = category_id;
            }
            if let Some(description) = patch.description {
                receipt.description = Some(description);
            }
            if let Some(image_uri) = patch.image_uri {
                receipt.image_uri = Some(image_uri);
            }
            if let Some(items) = patch.items {
                receipt.items = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| ReceiptItem {
                        item_id: index as i64,
                        receipt_id: id.to_string(),
                        item_name: item.name.clone(),
                        quantity: item.quantity.unwrap_or(1.0),
                        unit_price: item.unit_price.unwrap_or(0.0),
                        total_price: item.total_price.unwrap_or(0.0),
                    })
                    .collect();
            }
            receipt.updated_at = Utc::now();
        } else {
            warn!("更新対象のレシートがキャッシュにありません: id={id}");
        }

        Ok(())
    }

    /// レシートを削除する
    ///
    /// ゲートウェイでの削除成功後にキャッシュから取り除く。
    /// 失敗時はキャッシュを変更しない。
    pub async fn delete_receipt(&self, id: &str) -> AppResult<()> {
        let user_id = self.require_user_id()?;

        self.gateway.delete_receipt(id, Some(&user_id)).await?;

        self.receipts.lock().unwrap().retain(|r| r.id != id);
        info!("レシートを削除しました: receipt_id={id}");
        Ok(())
    }

    /// レシートを検索する（読み取り専用、キャッシュは変更しない）
    ///
    /// レポート作成画面などが画面ローカルの選択用に使う。未ログイン時は
    /// 空の結果を返す。
    ///
    /// # 引数
    /// * `request` - 検索条件（user_idは現在のセッションで上書きされる)
    pub async fn search_receipts(
        &self,
        mut request: SearchReceiptsRequest,
    ) -> AppResult<Vec<Receipt>> {
        let user_id = match self.session.lock().unwrap().as_ref() {
            Some(user) => user.id.clone(),
            None => {
                debug!("未ログインのため検索結果は空です");
                return Ok(vec![]);
            }
        };

        request.user_id = Some(user_id);
        let records = self.gateway.search_receipts(request).await?;
        Ok(records.into_iter().map(map_search_record).collect())
    }

    /// キャッシュ済みレシートを日付範囲で絞り込む（両端含む）
    ///
    /// ネットワーク呼び出しは行わず、現在のキャッシュ順を保ったまま
    /// 同期的にフィルタする。
    pub fn get_receipts_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Receipt> {
        self.receipts
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect()
    }
}

// ========== ペイロード構築・マッピング ==========

/// 下書き明細と抽出結果からワイヤー明細を決める
///
/// ユーザー入力の明細があればそれを使い、なければ抽出結果の明細を使う。
fn merge_items(items: &[DraftItem], extraction: Option<&ExtractionResult>) -> Vec<WireItem> {
    if !items.is_empty() {
        return items
            .iter()
            .map(|item| WireItem {
                name: item.name.clone(),
                quantity: item.quantity.unwrap_or(1.0),
                unit_price: item.unit_price.unwrap_or(0.0),
                total_price: item.total_price.unwrap_or(0.0),
            })
            .collect();
    }

    extraction
        .map(|result| {
            result
                .receipt_data
                .items
                .iter()
                .map(|item| WireItem {
                    name: item.name.clone(),
                    quantity: 1.0,
                    unit_price: item.price,
                    total_price: item.price,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// 保存リクエストを構築する
///
/// 抽出結果のフィールドを下地にし、ユーザー入力値（下書き）を常に
/// 優先して重ねる。カテゴリなどのアプリ固有データはnotes欄へ
/// JSONとして退避する。
pub(crate) fn build_store_request(
    user_id: &str,
    draft: &ReceiptDraft,
    items: &[DraftItem],
    extraction: Option<&ExtractionResult>,
) -> StoreReceiptRequest {
    let extracted = extraction.map(|e| &e.receipt_data);

    // ユーザー値優先のマージ（空文字・0は未入力として抽出値へフォールバック）
    let merchant_name = if draft.merchant_name.is_empty() {
        extracted.map(|e| e.merchant_name.clone()).unwrap_or_default()
    } else {
        draft.merchant_name.clone()
    };
    let total_amount = if draft.amount > 0.0 {
        draft.amount
    } else {
        extracted.map(|e| e.total_amount).unwrap_or(0.0)
    };

    let receipt_data = ReceiptData {
        merchant_name,
        merchant_address: extracted.and_then(|e| e.merchant_address.clone()),
        merchant_phone: extracted.and_then(|e| e.merchant_phone.clone()),
        transaction_date: format_transaction_date(&draft.date),
        transaction_time: extracted.and_then(|e| e.transaction_time.clone()),
        transaction_id: extracted.and_then(|e| e.transaction_id.clone()),
        order_number: extracted.and_then(|e| e.order_number.clone()),
        items: merge_items(items, extraction),
        subtotal: extracted.and_then(|e| e.subtotal),
        tax_gst: extracted.and_then(|e| e.tax_gst),
        tax_qst: extracted.and_then(|e| e.tax_qst),
        total_tax: extracted.and_then(|e| e.total_tax),
        total_amount,
        payment_method: extracted.and_then(|e| e.payment_method.clone()),
        merchant_name_confidence: extracted.and_then(|e| e.merchant_name_confidence),
        transaction_date_confidence: extracted.and_then(|e| e.transaction_date_confidence),
        total_amount_confidence: extracted.and_then(|e| e.total_amount_confidence),
    };

    let app_notes = AppNotes {
        category: Some(draft.category.clone()),
        category_id: Some(draft.category_id.clone()),
        description: draft.description.clone(),
        app_version: APP_NOTES_VERSION.to_string(),
    };

    StoreReceiptRequest {
        user_id: Some(user_id.to_string()),
        receipt_data,
        ocr_confidence_scores: extraction
            .map(|e| e.ocr_confidence_scores.clone())
            .unwrap_or_default(),
        average_confidence: extraction.map(|e| e.average_confidence).unwrap_or(0.0),
        raw_ocr_text: extraction.map(|e| e.raw_ocr_text.clone()).unwrap_or_default(),
        processing_time_seconds: extraction
            .map(|e| e.processing_time_seconds)
            .unwrap_or(0.0),
        // リモートURLのみ送る（ローカル参照はサーバーから到達できない）
        image_url: draft
            .image_uri
            .as_ref()
            .filter(|uri| uri.starts_with("http"))
            .cloned(),
        notes: serde_json::to_string(&app_notes).ok(),
    }
}

/// 部分更新リクエストを構築する
///
/// 呼び出し側が指定したフィールドだけを含める。省略フィールドは
/// サーバー側で未変更のまま残る。
pub(crate) fn build_update_request(user_id: &str, patch: &ReceiptPatch) -> UpdateReceiptRequest {
    let receipt_data = UpdateReceiptData {
        merchant_name: patch.merchant_name.clone(),
        transaction_date: patch.date.as_ref().map(format_transaction_date),
        total_amount: patch.amount,
        items: patch.items.as_ref().map(|items| {
            items
                .iter()
                .map(|item| WireItem {
                    name: item.name.clone(),
                    quantity: item.quantity.unwrap_or(1.0),
                    unit_price: item.unit_price.unwrap_or(0.0),
                    total_price: item.total_price.unwrap_or(0.0),
                })
                .collect()
        }),
    }
    .into_option();

    // カテゴリ・説明の変更はnotes欄のアプリメタデータとして送る
    let notes = if patch.category.is_some()
        || patch.category_id.is_some()
        || patch.description.is_some()
    {
        let app_notes = AppNotes {
            category: patch.category.clone(),
            category_id: patch.category_id.clone(),
            description: patch.description.clone(),
            app_version: APP_NOTES_VERSION.to_string(),
        };
        serde_json::to_string(&app_notes).ok()
    } else {
        None
    };

    UpdateReceiptRequest {
        user_id: Some(user_id.to_string()),
        receipt_data,
        notes,
        image_url: patch
            .image_uri
            .as_ref()
            .filter(|uri| uri.starts_with("http"))
            .cloned(),
    }
}

impl UpdateReceiptData {
    /// 空でなければSomeに包む
    fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// 検索レコードをドメインのReceiptへ変換する
///
/// notes欄のアプリメタデータJSONを解析してカテゴリを復元する。
/// 解析できないnotesはそのまま説明文として扱い、カテゴリは空にする
/// （旧バージョンが書いたデータとの互換動作）。
pub(crate) fn map_search_record(record: SearchReceiptRecord) -> Receipt {
    let (category, category_id, description) = match record
        .notes
        .as_deref()
        .and_then(|notes| serde_json::from_str::<AppNotes>(notes).ok())
    {
        Some(app_notes) => (
            app_notes.category.unwrap_or_default(),
            app_notes.category_id.unwrap_or_default(),
            app_notes.description,
        ),
        None => (String::new(), String::new(), record.notes.clone()),
    };

    let created_at = parse_transaction_date(&record.created_at).unwrap_or_else(Utc::now);
    let date = parse_transaction_date(&record.transaction_date).unwrap_or(created_at);

    Receipt {
        id: record.receipt_id.clone(),
        merchant_name: record.merchant_name,
        amount: record.total_amount,
        date,
        category,
        category_id,
        description,
        image_uri: record.image_url,
        items: record
            .items
            .into_iter()
            .map(|item| ReceiptItem {
                item_id: item.item_id,
                receipt_id: record.receipt_id.clone(),
                item_name: item.item_name,
                // 欠損・不正なquantityは1として扱う
                quantity: item.quantity.unwrap_or(1.0),
                unit_price: item.unit_price,
                total_price: item.total_price,
            })
            .collect(),
        created_at,
        // ゲートウェイはupdated_atを返さないためcreated_atで代用する
        updated_at: created_at,
    }
}
