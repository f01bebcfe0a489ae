// 支出カテゴリの固定定義

use super::models::Category;
use once_cell::sync::Lazy;

/// クライアント定義の支出カテゴリ（9種、サーバーからは取得しない）
///
/// プロバイダー構築時に一度だけ初期化され、以後変更されない。
pub static DEFAULT_CATEGORIES: Lazy<Vec<Category>> = Lazy::new(|| {
    vec![
        category("1", "Food & Dining", "restaurant", "#ff6b6b"),
        category("2", "Transportation", "car", "#4ecdc4"),
        category("3", "Shopping", "bag", "#45b7d1"),
        category("4", "Entertainment", "game-controller", "#f9ca24"),
        category("5", "Health & Medical", "medical", "#6c5ce7"),
        category("6", "Utilities", "flash", "#a0e7e5"),
        category("7", "Travel", "airplane", "#ffa8a8"),
        category("8", "Education", "school", "#54a0ff"),
        category("9", "Other", "ellipsis-horizontal", "#778ca3"),
    ]
});

fn category(id: &str, name: &str, icon: &str, color: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
    }
}

/// IDからカテゴリを検索する
pub fn find_category_by_id(id: &str) -> Option<&'static Category> {
    DEFAULT_CATEGORIES.iter().find(|c| c.id == id)
}

/// 表示名からカテゴリを検索する
pub fn find_category_by_name(name: &str) -> Option<&'static Category> {
    DEFAULT_CATEGORIES.iter().find(|c| c.name == name)
}
