use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_category::{CategoryLevels, CategoryRecord, PlannedUpdate};
use contracts::domain::common::EntityMetadata;

use sea_orm::entity::prelude::*;
use sea_orm::{
    ActiveValue::NotSet, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::shared::data::db::get_connection;

/// Хранилище категорий: полная выборка, создание, частичное обновление по коду, удаление.
///
/// Выборка должна быть полной (без пагинации): по ней ищутся родители.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Все категории отрасли (или все вообще, если отрасль не задана)
    async fn list_categories(&self, industry_code: Option<&str>)
        -> anyhow::Result<Vec<CategoryRecord>>;

    async fn get_category(&self, code: &str) -> anyhow::Result<Option<CategoryRecord>>;

    async fn create_category(&self, record: &CategoryRecord) -> anyhow::Result<CategoryRecord>;

    /// Перезаписать поля записи; `false`, если кода нет в хранилище
    async fn update_category(&self, record: &CategoryRecord) -> anyhow::Result<bool>;

    /// Применить обновления уровней одной транзакцией
    async fn apply_hierarchy_updates(&self, updates: &[PlannedUpdate]) -> anyhow::Result<()>;

    /// Перезаписать запись и перенести её потомков одной транзакцией;
    /// `false` (и ничего не записано), если кода нет в хранилище
    async fn update_with_descendants(
        &self,
        record: &CategoryRecord,
        cascaded: &[PlannedUpdate],
    ) -> anyhow::Result<bool>;

    async fn delete_category(&self, code: &str) -> anyhow::Result<bool>;
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_code: String,
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
    pub breadcrumb: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CategoryRecord {
    fn from(m: Model) -> Self {
        CategoryRecord {
            category_code: m.category_code,
            industry_code: m.industry_code,
            industry_name: m.industry_name,
            levels: CategoryLevels::new([
                m.category_1,
                m.category_2,
                m.category_3,
                m.category_4,
                m.category_5,
                m.category_6,
                m.category_7,
                m.category_8,
            ]),
            product_type: m.product_type,
            breadcrumb: m.breadcrumb,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
            },
        }
    }
}

/// Колонки уровней в виде ActiveValue
fn level_values(levels: &CategoryLevels) -> [sea_orm::ActiveValue<String>; 8] {
    std::array::from_fn(|i| Set(levels.get(i + 1).to_string()))
}

fn to_active(record: &CategoryRecord) -> ActiveModel {
    let [c1, c2, c3, c4, c5, c6, c7, c8] = level_values(&record.levels);
    ActiveModel {
        category_code: Set(record.category_code.clone()),
        industry_code: Set(record.industry_code.clone()),
        industry_name: Set(record.industry_name.clone()),
        category_1: c1,
        category_2: c2,
        category_3: c3,
        category_4: c4,
        category_5: c5,
        category_6: c6,
        category_7: c7,
        category_8: c8,
        product_type: Set(record.product_type.clone()),
        breadcrumb: Set(record.breadcrumb.clone()),
        created_at: Set(record.metadata.created_at),
        updated_at: Set(record.metadata.updated_at),
    }
}

/// Только колонки уровней, breadcrumb и updated_at
fn hierarchy_active(planned: &PlannedUpdate, now: chrono::DateTime<Utc>) -> ActiveModel {
    let [c1, c2, c3, c4, c5, c6, c7, c8] = level_values(&planned.update.levels);
    ActiveModel {
        category_code: Set(planned.category_code.clone()),
        category_1: c1,
        category_2: c2,
        category_3: c3,
        category_4: c4,
        category_5: c5,
        category_6: c6,
        category_7: c7,
        category_8: c8,
        breadcrumb: Set(planned.update.breadcrumb.clone()),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Хранилище категорий поверх SQLite
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteCategoryStore;

#[async_trait]
impl CategoryStore for SqliteCategoryStore {
    async fn list_categories(
        &self,
        industry_code: Option<&str>,
    ) -> anyhow::Result<Vec<CategoryRecord>> {
        let mut query = Entity::find();
        if let Some(industry) = industry_code {
            query = query.filter(Column::IndustryCode.eq(industry));
        }
        // Стабильный порядок: от него зависит выбор родителя среди дублей
        let items = query
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::CategoryCode)
            .all(conn())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }

    async fn get_category(&self, code: &str) -> anyhow::Result<Option<CategoryRecord>> {
        let result = Entity::find_by_id(code.to_string()).one(conn()).await?;
        Ok(result.map(Into::into))
    }

    async fn create_category(&self, record: &CategoryRecord) -> anyhow::Result<CategoryRecord> {
        let model = to_active(record).insert(conn()).await?;
        Ok(model.into())
    }

    async fn update_category(&self, record: &CategoryRecord) -> anyhow::Result<bool> {
        if Entity::find_by_id(record.category_code.clone())
            .one(conn())
            .await?
            .is_none()
        {
            return Ok(false);
        }
        let mut active = to_active(record);
        active.created_at = NotSet;
        active.update(conn()).await?;
        Ok(true)
    }

    async fn apply_hierarchy_updates(&self, updates: &[PlannedUpdate]) -> anyhow::Result<()> {
        let txn = conn().begin().await?;
        let now = Utc::now();
        for planned in updates {
            hierarchy_active(planned, now).update(&txn).await?;
        }
        txn.commit().await?;
        tracing::info!("Applied {} hierarchy updates", updates.len());
        Ok(())
    }

    async fn update_with_descendants(
        &self,
        record: &CategoryRecord,
        cascaded: &[PlannedUpdate],
    ) -> anyhow::Result<bool> {
        let txn = conn().begin().await?;
        if Entity::find_by_id(record.category_code.clone())
            .one(&txn)
            .await?
            .is_none()
        {
            txn.rollback().await?;
            return Ok(false);
        }

        let mut active = to_active(record);
        active.created_at = NotSet;
        active.update(&txn).await?;

        let now = Utc::now();
        for planned in cascaded {
            hierarchy_active(planned, now).update(&txn).await?;
        }
        // Без commit транзакция откатывается при drop
        txn.commit().await?;
        Ok(true)
    }

    async fn delete_category(&self, code: &str) -> anyhow::Result<bool> {
        let result = Entity::delete_by_id(code.to_string()).exec(conn()).await?;
        Ok(result.rows_affected > 0)
    }
}
