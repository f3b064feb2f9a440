//! In-memory stores for service tests.

use async_trait::async_trait;
use contracts::domain::a001_category::{CategoryLevels, CategoryRecord, PlannedUpdate};
use contracts::domain::a002_product::Product;
use std::sync::Mutex;

use super::a001_category::CategoryStore;
use super::a002_product::ProductStore;

#[derive(Default)]
pub struct MemoryCategoryStore {
    pub records: Mutex<Vec<CategoryRecord>>,
    /// Каскадные записи уровней завершаются ошибкой
    pub fail_hierarchy_writes: bool,
}

impl MemoryCategoryStore {
    pub fn with_records(records: Vec<CategoryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_hierarchy_writes: false,
        }
    }

    pub fn failing_hierarchy_writes(records: Vec<CategoryRecord>) -> Self {
        Self {
            fail_hierarchy_writes: true,
            ..Self::with_records(records)
        }
    }

    pub fn snapshot(&self) -> Vec<CategoryRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn breadcrumb_of(&self, code: &str) -> Option<String> {
        self.snapshot()
            .into_iter()
            .find(|r| r.category_code == code)
            .map(|r| r.breadcrumb)
    }
}

pub fn category(code: &str, names: &[&str]) -> CategoryRecord {
    let mut record = CategoryRecord::with_levels(CategoryLevels::from_names(names.iter().copied()));
    record.category_code = code.to_string();
    record
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn list_categories(
        &self,
        industry_code: Option<&str>,
    ) -> anyhow::Result<Vec<CategoryRecord>> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|r| industry_code.is_none() || r.industry_code.as_deref() == industry_code)
            .collect())
    }

    async fn get_category(&self, code: &str) -> anyhow::Result<Option<CategoryRecord>> {
        Ok(self.snapshot().into_iter().find(|r| r.category_code == code))
    }

    async fn create_category(&self, record: &CategoryRecord) -> anyhow::Result<CategoryRecord> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.category_code == record.category_code) {
            anyhow::bail!("duplicate category code {}", record.category_code);
        }
        records.push(record.clone());
        Ok(record.clone())
    }

    async fn update_category(&self, record: &CategoryRecord) -> anyhow::Result<bool> {
        let mut records = self.records.lock().unwrap();
        match records
            .iter_mut()
            .find(|r| r.category_code == record.category_code)
        {
            Some(existing) => {
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_hierarchy_updates(&self, updates: &[PlannedUpdate]) -> anyhow::Result<()> {
        if self.fail_hierarchy_writes {
            anyhow::bail!("hierarchy write failed");
        }
        let mut records = self.records.lock().unwrap();
        for planned in updates {
            let record = records
                .iter_mut()
                .find(|r| r.category_code == planned.category_code)
                .ok_or_else(|| anyhow::anyhow!("missing {}", planned.category_code))?;
            record.apply_hierarchy_update(&planned.update);
        }
        Ok(())
    }

    async fn update_with_descendants(
        &self,
        record: &CategoryRecord,
        cascaded: &[PlannedUpdate],
    ) -> anyhow::Result<bool> {
        // Все изменения готовятся на копии и применяются разом
        let mut staged = self.snapshot();
        let Some(head) = staged
            .iter_mut()
            .find(|r| r.category_code == record.category_code)
        else {
            return Ok(false);
        };
        *head = record.clone();

        if !cascaded.is_empty() && self.fail_hierarchy_writes {
            anyhow::bail!("hierarchy write failed");
        }
        for planned in cascaded {
            let descendant = staged
                .iter_mut()
                .find(|r| r.category_code == planned.category_code)
                .ok_or_else(|| anyhow::anyhow!("missing {}", planned.category_code))?;
            descendant.apply_hierarchy_update(&planned.update);
        }

        *self.records.lock().unwrap() = staged;
        Ok(true)
    }

    async fn delete_category(&self, code: &str) -> anyhow::Result<bool> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.category_code != code);
        Ok(records.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryProductStore {
    pub products: Mutex<Vec<Product>>,
}

impl MemoryProductStore {
    pub fn referencing(category_code: &str, count: usize) -> Self {
        let products = (0..count)
            .map(|i| Product {
                product_code: format!("PRD-{}", i),
                product_name: format!("Product {}", i),
                category_code: Some(category_code.to_string()),
                ..Product::default()
            })
            .collect();
        Self {
            products: Mutex::new(products),
        }
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn count_products_referencing(&self, category_code: &str) -> anyhow::Result<u64> {
        let products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .filter(|p| p.category_code.as_deref() == Some(category_code))
            .count() as u64)
    }

    async fn list_products(&self, category_code: Option<&str>) -> anyhow::Result<Vec<Product>> {
        let products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .filter(|p| category_code.is_none() || p.category_code.as_deref() == category_code)
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: &Product) -> anyhow::Result<()> {
        self.products.lock().unwrap().push(product.clone());
        Ok(())
    }
}
