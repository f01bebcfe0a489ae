// 支出分析（キャッシュ済みレシートに対する純粋な集計）

use crate::features::receipts::models::Receipt;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// カテゴリ別の集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// カテゴリ名
    pub category: String,
    /// 合計金額
    pub amount: f64,
    /// 全体に占める割合（0〜100）
    pub percentage: f64,
}

/// 月次バケット（推移グラフ用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// 月ラベル（"Jan"など）
    pub label: String,
    /// 年
    pub year: i32,
    /// 月（1〜12）
    pub month: u32,
    /// 合計金額
    pub amount: f64,
}

/// 特定の年月の集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// 合計金額
    pub total: f64,
    /// レシート件数
    pub count: usize,
}

/// 期間全体の分析サマリ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// 合計金額
    pub total_amount: f64,
    /// 平均金額（0件のときは0）
    pub average_amount: f64,
    /// レシート件数
    pub receipt_count: usize,
    /// カテゴリ別内訳（金額の降順）
    pub category_breakdown: Vec<CategoryTotal>,
}

/// 合計金額を計算する
pub fn total_amount(receipts: &[Receipt]) -> f64 {
    receipts.iter().map(|r| r.amount).sum()
}

/// 平均金額を計算する（0件のときは0）
pub fn average_amount(receipts: &[Receipt]) -> f64 {
    if receipts.is_empty() {
        0.0
    } else {
        total_amount(receipts) / receipts.len() as f64
    }
}

/// カテゴリ別内訳を計算する
///
/// 金額の降順に並べる。合計が0のときは割合をすべて0にする
/// （0除算を避ける）。カテゴリが空文字のレシートは"Other"に寄せる。
pub fn category_breakdown(receipts: &[Receipt]) -> Vec<CategoryTotal> {
    let total = total_amount(receipts);

    let mut by_category: HashMap<&str, f64> = HashMap::new();
    for receipt in receipts {
        let key = if receipt.category.is_empty() {
            "Other"
        } else {
            receipt.category.as_str()
        };
        *by_category.entry(key).or_insert(0.0) += receipt.amount;
    }

    let mut breakdown: Vec<CategoryTotal> = by_category
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount,
            percentage: if total > 0.0 {
                amount / total * 100.0
            } else {
                0.0
            },
        })
        .collect();

    breakdown.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(std::cmp::Ordering::Equal));
    breakdown
}

/// 期間全体の分析サマリを計算する
pub fn summarize(receipts: &[Receipt]) -> AnalyticsSummary {
    AnalyticsSummary {
        total_amount: total_amount(receipts),
        average_amount: average_amount(receipts),
        receipt_count: receipts.len(),
        category_breakdown: category_breakdown(receipts),
    }
}

/// 特定の年月の合計と件数を計算する
///
/// # 引数
/// * `receipts` - 対象レシート
/// * `year` - 年
/// * `month` - 月（1〜12）
pub fn month_summary(receipts: &[Receipt], year: i32, month: u32) -> MonthSummary {
    let in_month: Vec<&Receipt> = receipts
        .iter()
        .filter(|r| r.date.year() == year && r.date.month() == month)
        .collect();

    MonthSummary {
        total: in_month.iter().map(|r| r.amount).sum(),
        count: in_month.len(),
    }
}

/// 直近nヶ月の月次推移を計算する（基準月を含む、古い月が先頭）
///
/// # 引数
/// * `receipts` - 対象レシート
/// * `reference` - 基準日時（通常は現在時刻）
/// * `months` - バケット数
pub fn monthly_trend(
    receipts: &[Receipt],
    reference: DateTime<Utc>,
    months: usize,
) -> Vec<MonthBucket> {
    let mut buckets = Vec::with_capacity(months);

    // 基準月からmonths-1ヶ月さかのぼった月を先頭にする
    let mut year = reference.year();
    let mut month = reference.month();
    for _ in 1..months {
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }

    for _ in 0..months {
        let summary = month_summary(receipts, year, month);
        let label = Utc
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .unwrap()
            .format("%b")
            .to_string();

        buckets.push(MonthBucket {
            label,
            year,
            month,
            amount: summary.total,
        });

        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn receipt(category: &str, amount: f64, date: &str) -> Receipt {
        Receipt {
            id: uuid::Uuid::new_v4().to_string(),
            merchant_name: "Test".to_string(),
            amount,
            date: format!("{date}T12:00:00+00:00").parse().unwrap(),
            category: category.to_string(),
            category_id: "1".to_string(),
            description: None,
            image_uri: None,
            items: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_of_empty_list() {
        let summary = summarize(&[]);

        assert_eq!(summary.total_amount, 0.0);
        // 0件でも0除算にならない
        assert_eq!(summary.average_amount, 0.0);
        assert_eq!(summary.receipt_count, 0);
        assert!(summary.category_breakdown.is_empty());
    }

    #[test]
    fn test_category_breakdown_sorted_with_percentages() {
        let receipts = vec![
            receipt("Food & Dining", 30.0, "2024-05-01"),
            receipt("Transportation", 50.0, "2024-05-02"),
            receipt("Food & Dining", 20.0, "2024-05-03"),
        ];

        let breakdown = category_breakdown(&receipts);

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Transportation");
        assert_eq!(breakdown[0].amount, 50.0);
        assert_eq!(breakdown[0].percentage, 50.0);
        assert_eq!(breakdown[1].category, "Food & Dining");
        assert_eq!(breakdown[1].amount, 50.0);
    }

    #[test]
    fn test_uncategorized_receipts_fall_into_other() {
        let receipts = vec![
            receipt("", 10.0, "2024-05-01"),
            receipt("Other", 5.0, "2024-05-02"),
        ];

        let breakdown = category_breakdown(&receipts);

        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].category, "Other");
        assert_eq!(breakdown[0].amount, 15.0);
    }

    #[test]
    fn test_month_summary_filters_by_year_and_month() {
        let receipts = vec![
            receipt("Food & Dining", 10.0, "2024-05-01"),
            receipt("Food & Dining", 20.0, "2024-05-31"),
            receipt("Food & Dining", 99.0, "2024-06-01"),
            receipt("Food & Dining", 99.0, "2023-05-15"),
        ];

        let summary = month_summary(&receipts, 2024, 5);

        assert_eq!(summary.total, 30.0);
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn test_monthly_trend_spans_year_boundary() {
        let receipts = vec![
            receipt("Food & Dining", 10.0, "2023-12-15"),
            receipt("Food & Dining", 20.0, "2024-02-15"),
        ];
        let reference = Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap();

        let trend = monthly_trend(&receipts, reference, 6);

        assert_eq!(trend.len(), 6);
        // 2023-09から2024-02まで、古い月が先頭
        assert_eq!((trend[0].year, trend[0].month), (2023, 9));
        assert_eq!((trend[5].year, trend[5].month), (2024, 2));
        assert_eq!(trend[0].label, "Sep");
        assert_eq!(trend[3].amount, 10.0);
        assert_eq!(trend[5].amount, 20.0);
    }

    #[quickcheck]
    fn prop_breakdown_amounts_sum_to_total(amounts: Vec<u32>) -> bool {
        let receipts: Vec<Receipt> = amounts
            .iter()
            .enumerate()
            .map(|(i, cents)| {
                let category = ["Food & Dining", "Transportation", "Shopping"][i % 3];
                receipt(category, *cents as f64 / 100.0, "2024-05-01")
            })
            .collect();

        let total = total_amount(&receipts);
        let breakdown_sum: f64 = category_breakdown(&receipts).iter().map(|c| c.amount).sum();

        (total - breakdown_sum).abs() < 1e-6
    }

    #[quickcheck]
    fn prop_percentages_sum_to_hundred(amounts: Vec<u32>) -> bool {
        let receipts: Vec<Receipt> = amounts
            .iter()
            .enumerate()
            .map(|(i, cents)| {
                let category = ["Food & Dining", "Transportation"][i % 2];
                receipt(category, *cents as f64 / 100.0, "2024-05-01")
            })
            .collect();

        let breakdown = category_breakdown(&receipts);
        let percentage_sum: f64 = breakdown.iter().map(|c| c.percentage).sum();

        if total_amount(&receipts) > 0.0 {
            (percentage_sum - 100.0).abs() < 1e-6
        } else {
            percentage_sum == 0.0
        }
    }
}
