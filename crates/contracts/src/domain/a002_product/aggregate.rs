use crate::domain::common::{AggregateRoot, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Товар; для иерархии важна только ссылка на категорию
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_code: String,
    pub product_name: String,
    #[serde(default)]
    pub category_code: Option<String>,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Product {
    pub fn new_for_insert(dto: ProductDto) -> Self {
        let product_code = dto
            .product_code
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| format!("PRD-{}", Uuid::new_v4().simple()));
        Self {
            product_code,
            product_name: dto.product_name,
            category_code: dto.category_code.filter(|c| !c.trim().is_empty()),
            metadata: EntityMetadata::created_now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.product_name.trim().is_empty() {
            return Err("Product name cannot be empty".into());
        }
        Ok(())
    }
}

impl AggregateRoot for Product {
    fn code(&self) -> &str {
        &self.product_code
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "product"
    }

    fn element_name() -> &'static str {
        "Product"
    }

    fn list_name() -> &'static str {
        "Products"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductDto {
    pub product_code: Option<String>,
    pub product_name: String,
    pub category_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_codes_are_normalized() {
        let product = Product::new_for_insert(ProductDto {
            product_code: Some("  ".into()),
            product_name: "Claw hammer".into(),
            category_code: Some(String::new()),
        });
        assert!(product.product_code.starts_with("PRD-"));
        assert!(product.category_code.is_none());
        assert!(product.validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let product = Product::new_for_insert(ProductDto::default());
        assert!(product.validate().is_err());
        assert_eq!(Product::full_name(), "a002_product");
    }
}
