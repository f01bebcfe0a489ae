// 経費レポートのデータモデル

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// レポートの状態
///
/// 遷移は Draft → Submitted → Approved | Rejected の一方向のみ。
/// 却下されたレポートは自動では下書きに戻らず、新しいレポートとして
/// 作り直す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// 下書き（提出前）
    Draft,
    /// 提出済み（レビュー待ち）
    Submitted,
    /// 承認済み
    Approved,
    /// 却下
    Rejected,
}

impl ReportStatus {
    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Draft => "Draft",
            ReportStatus::Submitted => "Submitted",
            ReportStatus::Approved => "Approved",
            ReportStatus::Rejected => "Rejected",
        }
    }
}

/// 経費レポート
///
/// レシートの集まりに題名を付けてレビューへ回す単位。レシート本体は
/// 持たず、IDで参照する。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    /// レポートID
    pub id: String,
    /// タイトル
    pub title: String,
    /// 状態
    pub status: ReportStatus,
    /// 合計金額
    pub total_amount: f64,
    /// 含まれるレシートのID
    pub receipt_ids: Vec<String>,
    /// 作成者のユーザーID
    pub owner_id: String,
    /// 作成日時
    pub created_at: DateTime<Utc>,
    /// 提出日時
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// レビュー日時（承認・却下）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// レビュー担当者名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    /// レビューコメント（却下の場合は理由）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comment: Option<String>,
}

impl ExpenseReport {
    /// レシート件数
    pub fn receipt_count(&self) -> usize {
        self.receipt_ids.len()
    }
}

/// 状態別のレポート件数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// 下書き
    pub draft: usize,
    /// 提出済み
    pub submitted: usize,
    /// 承認済み
    pub approved: usize,
    /// 却下
    pub rejected: usize,
}
