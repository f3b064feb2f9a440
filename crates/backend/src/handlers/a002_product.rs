use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contracts::domain::a002_product::{Product, ProductDto};
use serde::Deserialize;
use serde_json::json;

use crate::domain::a002_product::{service, ProductServiceError, SqliteProductStore};

impl IntoResponse for ProductServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProductServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProductServiceError::Storage(e) => {
                tracing::error!("Product storage error: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct ProductQuery {
    pub category_code: Option<String>,
}

/// GET /api/products
pub async fn list_all(Query(query): Query<ProductQuery>) -> Result<Json<Vec<Product>>, StatusCode> {
    match service::list(&SqliteProductStore, query.category_code.as_deref()).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list products: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/products
pub async fn create(Json(dto): Json<ProductDto>) -> Result<(StatusCode, Json<Product>), ProductServiceError> {
    let product = service::create(&SqliteProductStore, dto).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products/count
pub async fn count(Query(query): Query<ProductQuery>) -> Result<Json<serde_json::Value>, StatusCode> {
    let Some(category_code) = query.category_code else {
        return Err(StatusCode::BAD_REQUEST);
    };
    match service::count_referencing(&SqliteProductStore, &category_code).await {
        Ok(count) => Ok(Json(json!({ "category_code": category_code, "count": count }))),
        Err(e) => {
            tracing::error!("Failed to count products: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ProductServiceError::Validation("empty".into())
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ProductServiceError::Storage(anyhow::anyhow!("disk"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
