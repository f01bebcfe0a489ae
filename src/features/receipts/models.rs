// レシート機能のデータモデル（ドメイン型とワイヤー型）

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// notes欄に埋め込むアプリメタデータのバージョン
pub const APP_NOTES_VERSION: &str = "1.0";

/// 検索時のデフォルト取得件数
pub const DEFAULT_LOAD_LIMIT: i64 = 100;

// ========== ドメイン型（UI層が扱う形） ==========

/// レシート（中心エンティティ）
///
/// `id`はゲートウェイが発行する。サーバーが作成を承認するまで
/// キャッシュには現れない（楽観的挿入は行わない）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub merchant_name: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    /// カテゴリ表示名（クライアント定義、サーバーはnotes経由で保持）
    pub category: String,
    pub category_id: String,
    pub description: Option<String>,
    /// アップロード前はローカル参照、アップロード後はリモートURL
    pub image_uri: Option<String>,
    pub items: Vec<ReceiptItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// レシート明細行
///
/// `total_price`を表示計算の正とする。`quantity × unit_price`との
/// 整合性はクライアント側では検証しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub item_id: i64,
    /// 親レシートへの参照（所有権はReceipt側にある）
    pub receipt_id: String,
    pub item_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
}

/// 支出カテゴリ（クライアント定義の固定セット）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// 保存前のレシート下書き（id・タイムスタンプなし）
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDraft {
    pub merchant_name: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category: String,
    pub category_id: String,
    pub description: Option<String>,
    pub image_uri: Option<String>,
}

/// 下書き明細行（必須は名前のみ、数値は省略時デフォルト）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftItem {
    pub name: String,
    /// 省略時は1として扱う
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total_price: Option<f64>,
}

/// 部分更新パッチ（Someのフィールドのみ更新対象）
#[derive(Debug, Clone, Default)]
pub struct ReceiptPatch {
    pub merchant_name: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub category_id: Option<String>,
    pub description: Option<String>,
    pub image_uri: Option<String>,
    pub items: Option<Vec<DraftItem>>,
}

impl ReceiptPatch {
    /// パッチが空かどうかを判定
    pub fn is_empty(&self) -> bool {
        self.merchant_name.is_none()
            && self.amount.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.category_id.is_none()
            && self.description.is_none()
            && self.image_uri.is_none()
            && self.items.is_none()
    }
}

// ========== notes欄のアプリメタデータ ==========

/// notes欄にJSONとして埋め込むアプリ固有メタデータ
///
/// ゲートウェイはカテゴリを保持しないため、書き込み時にここへ退避し、
/// 読み込み時に解析して復元する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppNotes {
    pub category: Option<String>,
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "appVersion")]
    pub app_version: String,
}

// ========== ワイヤー型（ゲートウェイ契約） ==========

/// 保存・更新リクエストの明細行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireItem {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
}

/// 保存リクエストのreceipt_data部
///
/// 手入力時の信頼度フィールドはnullで送信する（ゲートウェイ契約）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptData {
    pub merchant_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_phone: Option<String>,
    pub transaction_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    pub items: Vec<WireItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_gst: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_qst: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tax: Option<f64>,
    pub total_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub merchant_name_confidence: Option<f64>,
    pub transaction_date_confidence: Option<f64>,
    pub total_amount_confidence: Option<f64>,
}

/// POST /store-receipt リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreReceiptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub receipt_data: ReceiptData,
    pub ocr_confidence_scores: Vec<f64>,
    pub average_confidence: f64,
    pub raw_ocr_text: Vec<String>,
    pub processing_time_seconds: f64,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// POST /store-receipt レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreReceiptResponse {
    pub success: bool,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// 更新リクエストのreceipt_data部（省略フィールドはサーバー側で未変更）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReceiptData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<WireItem>>,
}

impl UpdateReceiptData {
    /// すべてのフィールドが省略されているかを判定
    pub fn is_empty(&self) -> bool {
        self.merchant_name.is_none()
            && self.transaction_date.is_none()
            && self.total_amount.is_none()
            && self.items.is_none()
    }
}

/// PUT /receipt/{id} リクエスト
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReceiptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_data: Option<UpdateReceiptData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// PUT /receipt/{id} レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReceiptResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// DELETE /receipt/{id} リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReceiptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// DELETE /receipt/{id} レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteReceiptResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// POST /search-receipts リクエスト
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchReceiptsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// 検索結果の明細行レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItemRecord {
    #[serde(default)]
    pub item_id: i64,
    #[serde(default)]
    pub receipt_id: String,
    #[serde(default)]
    pub item_name: String,
    /// 欠損時は1として扱う
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: f64,
}

/// 検索結果のレシートレコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReceiptRecord {
    pub receipt_id: String,
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub transaction_date: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub items: Vec<SearchItemRecord>,
}

/// POST /search-receipts レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReceiptsResponse {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub receipts: Vec<SearchReceiptRecord>,
}

/// POST /process-image リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessImageRequest {
    pub image_url: String,
}

/// 抽出された明細行（信頼度付き）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedItem {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// 抽出されたレシートデータ（各フィールドに信頼度スコアが付く）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedReceiptData {
    #[serde(default)]
    pub merchant_name: String,
    #[serde(default)]
    pub merchant_name_confidence: Option<f64>,
    #[serde(default)]
    pub merchant_address: Option<String>,
    #[serde(default)]
    pub merchant_address_confidence: Option<f64>,
    #[serde(default)]
    pub merchant_phone: Option<String>,
    #[serde(default)]
    pub merchant_phone_confidence: Option<f64>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub total_amount_confidence: Option<f64>,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub subtotal_confidence: Option<f64>,
    #[serde(default)]
    pub tax_gst: Option<f64>,
    #[serde(default)]
    pub tax_gst_confidence: Option<f64>,
    #[serde(default)]
    pub tax_qst: Option<f64>,
    #[serde(default)]
    pub tax_qst_confidence: Option<f64>,
    #[serde(default)]
    pub total_tax: Option<f64>,
    #[serde(default)]
    pub total_tax_confidence: Option<f64>,
    #[serde(default)]
    pub transaction_date: String,
    #[serde(default)]
    pub transaction_date_confidence: Option<f64>,
    #[serde(default)]
    pub transaction_time: Option<String>,
    #[serde(default)]
    pub transaction_time_confidence: Option<f64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transaction_id_confidence: Option<f64>,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub order_number_confidence: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_method_confidence: Option<f64>,
    #[serde(default)]
    pub items: Vec<ExtractedItem>,
}

/// POST /process-image レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessImageResponse {
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub average_confidence: f64,
    #[serde(default)]
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub ocr_confidence_scores: Vec<f64>,
    #[serde(default)]
    pub raw_ocr_text: Vec<String>,
    #[serde(default)]
    pub receipt_data: ExtractedReceiptData,
}

/// 画像抽出結果（一時データ、キャッシュには保存しない）
///
/// 下書きのプリフィルにのみ使い、保存確定後は破棄する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// 解決済みのリモート画像URL
    pub image_url: String,
    pub average_confidence: f64,
    pub processing_time_seconds: f64,
    pub ocr_confidence_scores: Vec<f64>,
    pub raw_ocr_text: Vec<String>,
    pub receipt_data: ExtractedReceiptData,
}

impl ExtractionResult {
    /// ProcessImageResponseと解決済みURLから抽出結果を構築
    pub fn from_response(response: ProcessImageResponse, image_url: String) -> Self {
        Self {
            image_url,
            average_confidence: response.average_confidence,
            processing_time_seconds: response.processing_time_seconds,
            ocr_confidence_scores: response.ocr_confidence_scores,
            raw_ocr_text: response.raw_ocr_text,
            receipt_data: response.receipt_data,
        }
    }
}

// ========== 日付ヘルパー ==========

/// ゲートウェイの取引日文字列を解析する
///
/// RFC3339、`YYYY-MM-DD`、`YYYY-MM-DD HH:MM:SS`の順に試す。
///
/// # 引数
/// * `raw` - ゲートウェイから受け取った日付文字列
///
/// # 戻り値
/// 解析できた場合はUTC日時
pub fn parse_transaction_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }

    None
}

/// 取引日をワイヤー形式（RFC3339）に変換する
pub fn format_transaction_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339()
}
