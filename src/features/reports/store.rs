// 経費レポートのインメモリストア（承認ワークフロー）

use super::models::{ExpenseReport, ReportStatus, StatusCounts};
use crate::features::auth::models::SessionUser;
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use log::info;
use std::sync::Mutex;
use uuid::Uuid;

/// 経費レポートのストア
///
/// レポートはまだリモートに対応エンドポイントがないため、
/// セッション中のみメモリに保持する。
#[derive(Default)]
pub struct ReportStore {
    reports: Mutex<Vec<ExpenseReport>>,
}

impl ReportStore {
    /// 空のストアを作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のレポート一覧のスナップショットを取得
    pub fn reports(&self) -> Vec<ExpenseReport> {
        self.reports.lock().unwrap().clone()
    }

    /// 下書きレポートを作成する
    ///
    /// # 引数
    /// * `owner` - 作成者
    /// * `title` - タイトル
    /// * `receipt_ids` - 含めるレシートのID
    /// * `total_amount` - 合計金額
    pub fn create_draft(
        &self,
        owner: &SessionUser,
        title: &str,
        receipt_ids: Vec<String>,
        total_amount: f64,
    ) -> ExpenseReport {
        let report = ExpenseReport {
            id: format!("report-{}", Uuid::new_v4()),
            title: title.to_string(),
            status: ReportStatus::Draft,
            total_amount,
            receipt_ids,
            owner_id: owner.id.clone(),
            created_at: Utc::now(),
            submitted_at: None,
            reviewed_at: None,
            reviewed_by: None,
            review_comment: None,
        };

        info!("レポート下書きを作成しました: id={}", report.id);
        self.reports.lock().unwrap().push(report.clone());
        report
    }

    /// 下書きレポートをレビューへ提出する
    ///
    /// 下書き以外の状態からの提出はエラー。
    ///
    /// # 引数
    /// * `id` - レポートID
    pub fn submit(&self, id: &str) -> AppResult<()> {
        let mut reports = self.reports.lock().unwrap();
        let report = find_report(&mut reports, id)?;

        if report.status != ReportStatus::Draft {
            return Err(AppError::Report(format!(
                "下書き状態のレポートのみ提出できます: 現在の状態={}",
                report.status.label()
            )));
        }

        report.status = ReportStatus::Submitted;
        report.submitted_at = Some(Utc::now());
        info!("レポートを提出しました: id={id}");
        Ok(())
    }

    /// 提出済みレポートを承認する
    ///
    /// レビュー権限のあるロール（manager/admin）のみが実行できる。
    ///
    /// # 引数
    /// * `id` - レポートID
    /// * `reviewer` - レビュー担当者
    /// * `comment` - コメント（任意）
    pub fn approve(
        &self,
        id: &str,
        reviewer: &SessionUser,
        comment: Option<&str>,
    ) -> AppResult<()> {
        self.review(id, reviewer, ReportStatus::Approved, comment)
    }

    /// 提出済みレポートを却下する
    ///
    /// 却下には理由が必須。
    ///
    /// # 引数
    /// * `id` - レポートID
    /// * `reviewer` - レビュー担当者
    /// * `reason` - 却下理由
    pub fn reject(&self, id: &str, reviewer: &SessionUser, reason: &str) -> AppResult<()> {
        if reason.trim().is_empty() {
            return Err(AppError::Report("却下には理由が必要です".to_string()));
        }
        self.review(id, reviewer, ReportStatus::Rejected, Some(reason))
    }

    fn review(
        &self,
        id: &str,
        reviewer: &SessionUser,
        verdict: ReportStatus,
        comment: Option<&str>,
    ) -> AppResult<()> {
        if !reviewer.can_review_reports() {
            return Err(AppError::Permission(
                "レポートのレビュー権限がありません".to_string(),
            ));
        }

        let mut reports = self.reports.lock().unwrap();
        let report = find_report(&mut reports, id)?;

        if report.status != ReportStatus::Submitted {
            return Err(AppError::Report(format!(
                "提出済みのレポートのみレビューできます: 現在の状態={}",
                report.status.label()
            )));
        }

        report.status = verdict;
        report.reviewed_at = Some(Utc::now());
        report.reviewed_by = Some(reviewer.name.clone());
        report.review_comment = comment.map(|c| c.to_string());

        info!("レポートをレビューしました: id={id}, 結果={}", verdict.label());
        Ok(())
    }

    /// 状態別の件数を集計する
    pub fn status_counts(&self) -> StatusCounts {
        let reports = self.reports.lock().unwrap();
        let mut counts = StatusCounts::default();
        for report in reports.iter() {
            match report.status {
                ReportStatus::Draft => counts.draft += 1,
                ReportStatus::Submitted => counts.submitted += 1,
                ReportStatus::Approved => counts.approved += 1,
                ReportStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    /// 指定した状態のレポートだけを取得する
    pub fn filter_by_status(&self, status: ReportStatus) -> Vec<ExpenseReport> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// 提出日時の新しい順に並べた一覧を取得する（未提出はcreated_atで比較）
    pub fn sorted_by_recency(&self) -> Vec<ExpenseReport> {
        let mut reports = self.reports();
        reports.sort_by_key(|r| std::cmp::Reverse(r.submitted_at.unwrap_or(r.created_at)));
        reports
    }
}

fn find_report<'a>(
    reports: &'a mut [ExpenseReport],
    id: &str,
) -> AppResult<&'a mut ExpenseReport> {
    reports
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| AppError::Report(format!("レポートが見つかりません: id={id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Option<&str>) -> SessionUser {
        SessionUser {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            role: role.map(|r| r.to_string()),
            is_active: Some(true),
            last_login: None,
        }
    }

    fn store_with_draft() -> (ReportStore, String) {
        let store = ReportStore::new();
        let report = store.create_draft(
            &user("u1", None),
            "Weekly Fuel & Meals",
            vec!["r1".to_string(), "r2".to_string()],
            892.3,
        );
        (store, report.id)
    }

    #[test]
    fn test_submit_then_approve() {
        let (store, id) = store_with_draft();
        let manager = user("m1", Some("manager"));

        store.submit(&id).unwrap();
        store.approve(&id, &manager, Some("Looks good")).unwrap();

        let report = &store.reports()[0];
        assert_eq!(report.status, ReportStatus::Approved);
        assert_eq!(report.reviewed_by.as_deref(), Some("User m1"));
        assert_eq!(report.review_comment.as_deref(), Some("Looks good"));
        assert!(report.submitted_at.is_some());
        assert!(report.reviewed_at.is_some());
    }

    #[test]
    fn test_reject_requires_reason() {
        let (store, id) = store_with_draft();
        let manager = user("m1", Some("admin"));
        store.submit(&id).unwrap();

        let result = store.reject(&id, &manager, "  ");
        assert!(matches!(result, Err(AppError::Report(_))));

        store
            .reject(&id, &manager, "Missing fuel receipts for Nov 8-9")
            .unwrap();
        let report = &store.reports()[0];
        assert_eq!(report.status, ReportStatus::Rejected);
        assert_eq!(
            report.review_comment.as_deref(),
            Some("Missing fuel receipts for Nov 8-9")
        );
    }

    #[test]
    fn test_review_requires_manager_role() {
        let (store, id) = store_with_draft();
        store.submit(&id).unwrap();

        // 一般ユーザーはレビューできない
        let result = store.approve(&id, &user("u2", Some("user")), None);
        assert!(matches!(result, Err(AppError::Permission(_))));

        let result = store.approve(&id, &user("u3", None), None);
        assert!(matches!(result, Err(AppError::Permission(_))));

        // 状態は変わらない
        assert_eq!(store.reports()[0].status, ReportStatus::Submitted);
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let (store, id) = store_with_draft();
        let manager = user("m1", Some("manager"));

        // 下書きは直接レビューできない
        let result = store.approve(&id, &manager, None);
        assert!(matches!(result, Err(AppError::Report(_))));

        store.submit(&id).unwrap();
        // 二重提出はエラー
        let result = store.submit(&id);
        assert!(matches!(result, Err(AppError::Report(_))));

        store.approve(&id, &manager, None).unwrap();
        // 承認済みを再レビューすることはできない
        let result = store.reject(&id, &manager, "too late");
        assert!(matches!(result, Err(AppError::Report(_))));
    }

    #[test]
    fn test_status_counts_and_filter() {
        let store = ReportStore::new();
        let owner = user("u1", None);
        let manager = user("m1", Some("manager"));

        let a = store.create_draft(&owner, "Trip A", vec![], 100.0);
        let b = store.create_draft(&owner, "Trip B", vec![], 200.0);
        store.create_draft(&owner, "Trip C", vec![], 300.0);

        store.submit(&a.id).unwrap();
        store.approve(&a.id, &manager, None).unwrap();
        store.submit(&b.id).unwrap();

        let counts = store.status_counts();
        assert_eq!(
            counts,
            StatusCounts {
                draft: 1,
                submitted: 1,
                approved: 1,
                rejected: 0
            }
        );

        let submitted = store.filter_by_status(ReportStatus::Submitted);
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].title, "Trip B");
    }

    #[test]
    fn test_sorted_by_recency_prefers_submission_time() {
        let store = ReportStore::new();
        let owner = user("u1", None);

        // Oldは先に作られたが後から提出された
        let old = store.create_draft(&owner, "Old", vec![], 10.0);
        let fresh = store.create_draft(&owner, "Fresh Draft", vec![], 20.0);
        store.submit(&old.id).unwrap();

        let sorted = store.sorted_by_recency();
        assert_eq!(sorted[0].title, "Old");
        assert_eq!(sorted[1].title, "Fresh Draft");
        assert_eq!(sorted[1].id, fresh.id);
    }

    #[test]
    fn test_missing_report_id() {
        let store = ReportStore::new();
        let result = store.submit("report-does-not-exist");
        assert!(matches!(result, Err(AppError::Report(_))));
    }
}
