use serde::{Deserialize, Serialize};

/// Заголовки CSV-выгрузки категорий, в порядке колонок
pub const CSV_HEADERS: [&str; 13] = [
    "category_code",
    "industry_code",
    "industry_name",
    "category_1",
    "category_2",
    "category_3",
    "category_4",
    "category_5",
    "category_6",
    "category_7",
    "category_8",
    "product_type",
    "breadcrumb",
];

/// Ошибки одной строки импорта (номер строки считается с 1, без заголовка)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub messages: Vec<String>,
}

/// Результат импорта
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub created: usize,
    pub updated: usize,
    pub skipped_duplicates: usize,
    pub errors: Vec<RowError>,
}
