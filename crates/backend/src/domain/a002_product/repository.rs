use async_trait::async_trait;
use contracts::domain::a002_product::Product;
use contracts::domain::common::EntityMetadata;

use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

/// Хранилище товаров; для категорий нужен только подсчёт ссылок
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn count_products_referencing(&self, category_code: &str) -> anyhow::Result<u64>;

    async fn list_products(&self, category_code: Option<&str>) -> anyhow::Result<Vec<Product>>;

    async fn create_product(&self, product: &Product) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_code: String,
    pub product_name: String,
    pub category_code: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(m: Model) -> Self {
        Product {
            product_code: m.product_code,
            product_name: m.product_name,
            category_code: m.category_code,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
            },
        }
    }
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteProductStore;

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn count_products_referencing(&self, category_code: &str) -> anyhow::Result<u64> {
        let count = Entity::find()
            .filter(Column::CategoryCode.eq(category_code))
            .count(conn())
            .await?;
        Ok(count)
    }

    async fn list_products(&self, category_code: Option<&str>) -> anyhow::Result<Vec<Product>> {
        let mut query = Entity::find();
        if let Some(code) = category_code {
            query = query.filter(Column::CategoryCode.eq(code));
        }
        let items = query
            .order_by_asc(Column::ProductName)
            .all(conn())
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(items)
    }

    async fn create_product(&self, product: &Product) -> anyhow::Result<()> {
        let active = ActiveModel {
            product_code: Set(product.product_code.clone()),
            product_name: Set(product.product_name.clone()),
            category_code: Set(product.category_code.clone()),
            created_at: Set(product.metadata.created_at),
            updated_at: Set(product.metadata.updated_at),
        };
        active.insert(conn()).await?;
        Ok(())
    }
}
