use super::error::ProductServiceError;
use super::repository::ProductStore;
use contracts::domain::a002_product::{Product, ProductDto};

pub async fn create(store: &dyn ProductStore, dto: ProductDto) -> Result<Product, ProductServiceError> {
    let product = Product::new_for_insert(dto);
    product.validate().map_err(ProductServiceError::Validation)?;
    store.create_product(&product).await?;
    tracing::info!(
        "Created product {} in category {:?}",
        product.product_code,
        product.category_code
    );
    Ok(product)
}

pub async fn list(store: &dyn ProductStore, category_code: Option<&str>) -> anyhow::Result<Vec<Product>> {
    store.list_products(category_code).await
}

pub async fn count_referencing(store: &dyn ProductStore, category_code: &str) -> anyhow::Result<u64> {
    store.count_products_referencing(category_code).await
}
