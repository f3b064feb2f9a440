use contracts::domain::a001_category::{
    CategoryLevels, CategoryRecord, ImportResult, RowError, CSV_HEADERS,
};
use contracts::domain::common::EntityMetadata;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use super::error::CategoryServiceError;
use super::repository::CategoryStore;
use super::service::{validation_errors, write_with_descendants};

/// Строка CSV после нормализации заголовков
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CsvCategoryRow {
    pub category_code: Option<String>,
    pub industry_code: Option<String>,
    pub industry_name: Option<String>,
    pub category_1: String,
    pub category_2: String,
    pub category_3: String,
    pub category_4: String,
    pub category_5: String,
    pub category_6: String,
    pub category_7: String,
    pub category_8: String,
    pub product_type: Option<String>,
}

impl From<CsvCategoryRow> for CategoryRecord {
    fn from(row: CsvCategoryRow) -> Self {
        let mut record = CategoryRecord::with_levels(CategoryLevels::new([
            row.category_1,
            row.category_2,
            row.category_3,
            row.category_4,
            row.category_5,
            row.category_6,
            row.category_7,
            row.category_8,
        ]));
        record.category_code = row.category_code.unwrap_or_default();
        record.industry_code = row.industry_code;
        record.industry_name = row.industry_name;
        record.product_type = row.product_type;
        record
    }
}

/// Приведение заголовка к каноническому имени колонки.
///
/// "Category 1", "category-1", "Level_1", "CATEGORY1" -> "category_1";
/// "Code" -> "category_code", "Industry" -> "industry_code".
pub fn normalize_header(header: &str) -> String {
    let normalized: String = header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    for prefix in ["category", "level"] {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            let digits = rest.trim_start_matches('_');
            if let Ok(n) = digits.parse::<usize>() {
                if (1..=8).contains(&n) {
                    return format!("category_{}", n);
                }
            }
        }
    }

    match normalized.as_str() {
        "code" => "category_code".to_string(),
        "industry" => "industry_code".to_string(),
        _ => normalized,
    }
}

/// Разбор CSV: каждая строка - либо запись, либо текст ошибки разбора
pub fn parse_csv(text: &str) -> anyhow::Result<Vec<Result<CategoryRecord, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: csv::StringRecord = reader.headers()?.iter().map(normalize_header).collect();
    reader.set_headers(headers);

    Ok(reader
        .deserialize::<CsvCategoryRow>()
        .map(|row| row.map(CategoryRecord::from).map_err(|e| e.to_string()))
        .collect())
}

/// Выгрузка в CSV с фиксированным набором колонок
pub fn export_csv(records: &[CategoryRecord]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(CSV_HEADERS)?;

    for record in records {
        let mut row: Vec<&str> = Vec::with_capacity(CSV_HEADERS.len());
        row.push(&record.category_code);
        row.push(record.industry_code.as_deref().unwrap_or_default());
        row.push(record.industry_name.as_deref().unwrap_or_default());
        row.extend(record.levels.iter());
        row.push(record.product_type.as_deref().unwrap_or_default());
        row.push(&record.breadcrumb);
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// Массовый импорт категорий из CSV.
///
/// Строки с разрывом уровней или без уровней попадают в ошибки; дубли по
/// (отрасль, путь) пропускаются; строка с кодом существующей записи её обновляет.
pub async fn import_csv(store: &dyn CategoryStore, text: &str) -> Result<ImportResult, CategoryServiceError> {
    let rows = parse_csv(text).map_err(|e| CategoryServiceError::validation(e.to_string()))?;

    let existing = store.list_categories(None).await?;
    let mut seen: HashSet<(String, String)> = existing.iter().map(|r| r.dedup_key()).collect();
    let mut by_code: HashMap<String, CategoryRecord> = existing
        .into_iter()
        .map(|r| (r.category_code.clone(), r))
        .collect();

    let mut result = ImportResult::default();

    for (i, row) in rows.into_iter().enumerate() {
        let row_number = i + 1;
        let mut record = match row {
            Ok(record) => record,
            Err(message) => {
                result.errors.push(RowError {
                    row: row_number,
                    messages: vec![message],
                });
                continue;
            }
        };

        let errors = validation_errors(&record);
        if !errors.is_empty() {
            result.errors.push(RowError {
                row: row_number,
                messages: errors,
            });
            continue;
        }
        record.refresh_breadcrumb();
        let key = record.dedup_key();

        if let Some(current) = by_code.get(&record.category_code).cloned() {
            let old_key = current.dedup_key();
            if old_key != key && seen.contains(&key) {
                result.skipped_duplicates += 1;
                continue;
            }
            record.metadata = current.metadata.clone();
            let cascaded = match write_with_descendants(store, &current, &mut record).await {
                Ok(cascaded) => cascaded,
                Err(CategoryServiceError::Hierarchy(e)) => {
                    result.errors.push(RowError {
                        row: row_number,
                        messages: vec![e.to_string()],
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            // Путь освободился: строка с прежним путём дублем уже не считается
            seen.remove(&old_key);
            seen.insert(key);
            for planned in &cascaded {
                if let Some(descendant) = by_code.get_mut(&planned.category_code) {
                    seen.remove(&descendant.dedup_key());
                    descendant.apply_hierarchy_update(&planned.update);
                    seen.insert(descendant.dedup_key());
                }
            }
            by_code.insert(record.category_code.clone(), record);
            result.updated += 1;
            continue;
        }

        if !seen.insert(key) {
            result.skipped_duplicates += 1;
            continue;
        }

        if !record.has_code() {
            record.category_code = CategoryRecord::generate_code();
        }
        record.metadata = EntityMetadata::created_now();
        let created = store.create_category(&record).await?;
        by_code.insert(created.category_code.clone(), created);
        result.created += 1;
    }

    tracing::info!(
        "CSV import: {} created, {} updated, {} duplicates, {} rows with errors",
        result.created,
        result.updated,
        result.skipped_duplicates,
        result.errors.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{category, MemoryCategoryStore};

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Category 1 "), "category_1");
        assert_eq!(normalize_header("category-2"), "category_2");
        assert_eq!(normalize_header("CATEGORY3"), "category_3");
        assert_eq!(normalize_header("Level_8"), "category_8");
        assert_eq!(normalize_header("level 9"), "level_9");
        assert_eq!(normalize_header("Code"), "category_code");
        assert_eq!(normalize_header("Industry"), "industry_code");
        assert_eq!(normalize_header("Product Type"), "product_type");
        assert_eq!(normalize_header("\u{feff}category_code"), "category_code");
    }

    #[test]
    fn test_parse_ignores_breadcrumb_column() {
        let text = "Code,Category 1,Category 2,Breadcrumb\nC1, Tools , Saws ,garbage\n";
        let rows = parse_csv(text).unwrap();
        let record = rows[0].as_ref().unwrap();
        assert_eq!(record.category_code, "C1");
        assert_eq!(record.levels.get(1), "Tools");
        assert_eq!(record.breadcrumb, "Tools > Saws");
    }

    #[test]
    fn test_export_then_parse() {
        let mut record = category("C1", &["Tools", "Saws"]);
        record.industry_code = Some("IND".into());
        let text = export_csv(&[record.clone()]).unwrap();
        assert!(text.starts_with("category_code,industry_code,industry_name,category_1"));

        let parsed = parse_csv(&text).unwrap();
        let back = parsed[0].as_ref().unwrap();
        assert_eq!(back.levels, record.levels);
        assert_eq!(back.industry_code.as_deref(), Some("IND"));
        assert_eq!(back.industry_name, None);
    }

    #[tokio::test]
    async fn test_import_rename_carries_children() {
        let store = MemoryCategoryStore::with_records(vec![
            category("T", &["Tools"]),
            category("H", &["Tools", "Hand"]),
            category("HAM", &["Tools", "Hand", "Hammers"]),
        ]);
        let text = "category_code,category_1\nT,Hardware\n";
        let result = import_csv(&store, text).await.unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(store.breadcrumb_of("T").unwrap(), "Hardware");
        assert_eq!(store.breadcrumb_of("H").unwrap(), "Hardware > Hand");
        assert_eq!(
            store.breadcrumb_of("HAM").unwrap(),
            "Hardware > Hand > Hammers"
        );
    }

    #[tokio::test]
    async fn test_import_frees_renamed_paths() {
        let store = MemoryCategoryStore::with_records(vec![
            category("T", &["Tools"]),
            category("H", &["Tools", "Hand"]),
        ]);
        let text = "\
category_code,category_1,category_2
T,Hardware,
,Tools,
,Tools,Hand
,Hardware,Hand
";
        let result = import_csv(&store, text).await.unwrap();
        assert_eq!(result.updated, 1);
        assert_eq!(result.created, 2);
        assert_eq!(result.skipped_duplicates, 1);
        assert!(result.errors.is_empty());

        let mut crumbs: Vec<_> = store.snapshot().into_iter().map(|r| r.breadcrumb).collect();
        crumbs.sort();
        assert_eq!(
            crumbs,
            vec!["Hardware", "Hardware > Hand", "Tools", "Tools > Hand"]
        );
    }

    #[tokio::test]
    async fn test_import_validates_dedups_and_upserts() {
        let store = MemoryCategoryStore::with_records(vec![category("T", &["Tools"])]);
        let text = "\
category_code,category_1,category_2,category_3
,Tools,,
,Tools,Saws,
,Tools,Saws,
,Tools,,Hammers
,,,
T,Hand Tools,,
";
        let result = import_csv(&store, text).await.unwrap();
        assert_eq!(result.created, 1);
        assert_eq!(result.updated, 1);
        assert_eq!(result.skipped_duplicates, 2);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].row, 4);
        assert!(result.errors[0].messages[0].contains("level 3"));
        assert_eq!(result.errors[1].row, 5);

        assert_eq!(store.breadcrumb_of("T").unwrap(), "Hand Tools");
        assert_eq!(store.snapshot().len(), 2);
    }
}
