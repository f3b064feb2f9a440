use crate::domain::common::{AggregateRoot, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hierarchy;

/// Максимальная глубина дерева категорий
pub const MAX_LEVELS: usize = 8;

// ============================================================================
// Level columns
// ============================================================================

/// Восемь упорядоченных названий уровней категории.
///
/// На проводе это плоские поля `category_1` .. `category_8`, внутри - массив,
/// чтобы сравнение префиксов сводилось к сравнению срезов.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LevelColumns", into = "LevelColumns")]
pub struct CategoryLevels([String; MAX_LEVELS]);

impl CategoryLevels {
    pub fn new(levels: [String; MAX_LEVELS]) -> Self {
        Self(levels)
    }

    /// Уровни из списка названий; лишние (после восьмого) отбрасываются
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut levels = Self::default();
        for (i, name) in names.into_iter().take(MAX_LEVELS).enumerate() {
            levels.0[i] = name.into();
        }
        levels
    }

    /// Значение уровня `n` (1..=8); вне диапазона - пустая строка
    pub fn get(&self, n: usize) -> &str {
        match n {
            1..=MAX_LEVELS => &self.0[n - 1],
            _ => "",
        }
    }

    /// Записать значение уровня `n` (1..=8); вне диапазона игнорируется
    pub fn set(&mut self, n: usize, value: impl Into<String>) {
        if (1..=MAX_LEVELS).contains(&n) {
            self.0[n - 1] = value.into();
        }
    }

    /// Уровень заполнен, если он непустой после trim
    pub fn is_filled(&self, n: usize) -> bool {
        !self.get(n).trim().is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Default, Serialize, Deserialize)]
struct LevelColumns {
    #[serde(default)]
    category_1: String,
    #[serde(default)]
    category_2: String,
    #[serde(default)]
    category_3: String,
    #[serde(default)]
    category_4: String,
    #[serde(default)]
    category_5: String,
    #[serde(default)]
    category_6: String,
    #[serde(default)]
    category_7: String,
    #[serde(default)]
    category_8: String,
}

impl From<LevelColumns> for CategoryLevels {
    fn from(c: LevelColumns) -> Self {
        Self([
            c.category_1,
            c.category_2,
            c.category_3,
            c.category_4,
            c.category_5,
            c.category_6,
            c.category_7,
            c.category_8,
        ])
    }
}

impl From<CategoryLevels> for LevelColumns {
    fn from(levels: CategoryLevels) -> Self {
        let [category_1, category_2, category_3, category_4, category_5, category_6, category_7, category_8] =
            levels.0;
        Self {
            category_1,
            category_2,
            category_3,
            category_4,
            category_5,
            category_6,
            category_7,
            category_8,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Присваивается хранилищем при создании; пусто у несохранённой записи
    #[serde(default)]
    pub category_code: String,

    #[serde(default)]
    pub industry_code: Option<String>,

    #[serde(default)]
    pub industry_name: Option<String>,

    #[serde(flatten)]
    pub levels: CategoryLevels,

    #[serde(default)]
    pub product_type: Option<String>,

    /// Кэш, всегда выводится из уровней (см. `refresh_breadcrumb`)
    #[serde(default)]
    pub breadcrumb: String,

    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl CategoryRecord {
    /// Новая несохранённая запись с заданными уровнями
    pub fn with_levels(levels: CategoryLevels) -> Self {
        let mut record = Self {
            levels,
            ..Self::default()
        };
        record.refresh_breadcrumb();
        record
    }

    /// Код для новой записи
    pub fn generate_code() -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("CAT-{}", id[..8].to_uppercase())
    }

    pub fn has_code(&self) -> bool {
        !self.category_code.trim().is_empty()
    }

    /// Пересчитать breadcrumb из уровней
    pub fn refresh_breadcrumb(&mut self) {
        self.breadcrumb = hierarchy::breadcrumb(self);
    }

    /// Применить обновление иерархии, полученное при перемещении
    pub fn apply_hierarchy_update(&mut self, update: &HierarchyUpdate) {
        self.levels = update.levels.clone();
        self.breadcrumb = update.breadcrumb.clone();
    }

    /// Ключ дедупликации при импорте: отрасль + путь
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.industry_code.clone().unwrap_or_default(),
            hierarchy::breadcrumb(self),
        )
    }
}

impl AggregateRoot for CategoryRecord {
    fn code(&self) -> &str {
        &self.category_code
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "category"
    }

    fn element_name() -> &'static str {
        "Category"
    }

    fn list_name() -> &'static str {
        "Categories"
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Частичное создание/изменение категории: заполнены только переданные поля
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategoryDto {
    pub industry_code: Option<String>,
    pub industry_name: Option<String>,
    pub category_1: Option<String>,
    pub category_2: Option<String>,
    pub category_3: Option<String>,
    pub category_4: Option<String>,
    pub category_5: Option<String>,
    pub category_6: Option<String>,
    pub category_7: Option<String>,
    pub category_8: Option<String>,
    pub product_type: Option<String>,
}

impl CategoryDto {
    fn level_fields(&self) -> [&Option<String>; MAX_LEVELS] {
        [
            &self.category_1,
            &self.category_2,
            &self.category_3,
            &self.category_4,
            &self.category_5,
            &self.category_6,
            &self.category_7,
            &self.category_8,
        ]
    }

    /// Переданы ли в DTO какие-либо уровни
    pub fn touches_levels(&self) -> bool {
        self.level_fields().iter().any(|f| f.is_some())
    }

    /// Наложить переданные поля на запись и пересчитать breadcrumb
    pub fn apply_to(&self, record: &mut CategoryRecord) {
        if self.industry_code.is_some() {
            record.industry_code = self.industry_code.clone();
        }
        if self.industry_name.is_some() {
            record.industry_name = self.industry_name.clone();
        }
        if self.product_type.is_some() {
            record.product_type = self.product_type.clone();
        }
        for (i, field) in self.level_fields().into_iter().enumerate() {
            if let Some(value) = field {
                record.levels.set(i + 1, value.clone());
            }
        }
        record.refresh_breadcrumb();
    }

    /// Несохранённая запись из DTO
    pub fn into_record(self) -> CategoryRecord {
        let mut record = CategoryRecord::default();
        self.apply_to(&mut record);
        record
    }
}

/// Частичное обновление, которое возвращает перемещение узла:
/// восемь уровней и пересчитанный breadcrumb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyUpdate {
    #[serde(flatten)]
    pub levels: CategoryLevels,
    pub breadcrumb: String,
}

impl HierarchyUpdate {
    pub fn new(levels: CategoryLevels) -> Self {
        let breadcrumb = hierarchy::breadcrumb_of(&levels);
        Self { levels, breadcrumb }
    }
}

/// Запрос на перемещение узла
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MoveCategoryDto {
    /// Новый родитель; `None` - перенос в корень
    pub new_parent_code: Option<String>,
    /// Новое имя листа; по умолчанию сохраняется текущее
    pub leaf_name: Option<String>,
}

/// Обновление одной записи в составе перемещения
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedUpdate {
    pub category_code: String,
    #[serde(flatten)]
    pub update: HierarchyUpdate,
}

/// Результат перемещения: сам узел первым, затем его потомки
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    pub updates: Vec<PlannedUpdate>,
}

/// Проверка перед удалением
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionCheck {
    pub category_code: String,
    pub child_codes: Vec<String>,
    pub product_count: u64,
    pub can_delete: bool,
}

impl DeletionCheck {
    pub fn new(category_code: String, child_codes: Vec<String>, product_count: u64) -> Self {
        let can_delete = child_codes.is_empty() && product_count == 0;
        Self {
            category_code,
            child_codes,
            product_count,
            can_delete,
        }
    }
}
