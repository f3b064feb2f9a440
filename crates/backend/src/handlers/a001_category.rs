use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use contracts::domain::a001_category::{
    CategoryDto, CategoryRecord, CategoryTreeNode, DeletionCheck, HierarchyStats, ImportResult,
    MoveCategoryDto, MovePlan,
};
use serde::Deserialize;
use serde_json::json;

use crate::domain::a001_category::service::{self, CategoryQuery};
use crate::domain::a001_category::{csv_exchange, CategoryServiceError, SqliteCategoryStore};
use crate::domain::a002_product::SqliteProductStore;

type ApiResult<T> = Result<Json<T>, CategoryServiceError>;

#[derive(Deserialize)]
pub struct IndustryQuery {
    pub industry_code: Option<String>,
}

impl IntoResponse for CategoryServiceError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            CategoryServiceError::NotFound(_) => (StatusCode::NOT_FOUND, json!(null)),
            CategoryServiceError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!(errors))
            }
            CategoryServiceError::Hierarchy(_) => (StatusCode::UNPROCESSABLE_ENTITY, json!(null)),
            CategoryServiceError::HasChildren(children) => {
                (StatusCode::CONFLICT, json!({ "child_codes": children }))
            }
            CategoryServiceError::ReferencedByProducts(count) => {
                (StatusCode::CONFLICT, json!({ "product_count": count }))
            }
            CategoryServiceError::Storage(e) => {
                tracing::error!("Category storage error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!(null))
            }
        };
        let body = json!({ "error": self.to_string(), "details": details });
        (status, Json(body)).into_response()
    }
}

/// GET /api/categories
pub async fn list_all(Query(query): Query<CategoryQuery>) -> ApiResult<Vec<CategoryRecord>> {
    service::list(&SqliteCategoryStore, &query).await.map(Json)
}

/// GET /api/categories/tree
pub async fn tree(Query(query): Query<CategoryQuery>) -> ApiResult<Vec<CategoryTreeNode>> {
    service::tree(&SqliteCategoryStore, &query).await.map(Json)
}

/// GET /api/categories/stats
pub async fn stats(Query(query): Query<IndustryQuery>) -> ApiResult<HierarchyStats> {
    service::stats(&SqliteCategoryStore, query.industry_code.as_deref())
        .await
        .map(Json)
}

/// GET /api/categories/:code
pub async fn get_by_code(Path(code): Path<String>) -> ApiResult<CategoryRecord> {
    service::get(&SqliteCategoryStore, &code).await.map(Json)
}

/// GET /api/categories/:code/parent
pub async fn get_parent(Path(code): Path<String>) -> ApiResult<Option<CategoryRecord>> {
    service::parent_of(&SqliteCategoryStore, &code).await.map(Json)
}

/// POST /api/categories
pub async fn create(Json(dto): Json<CategoryDto>) -> Result<(StatusCode, Json<CategoryRecord>), CategoryServiceError> {
    let record = service::create(&SqliteCategoryStore, dto).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/categories/:code
pub async fn update(Path(code): Path<String>, Json(dto): Json<CategoryDto>) -> ApiResult<CategoryRecord> {
    service::update(&SqliteCategoryStore, &code, dto).await.map(Json)
}

/// POST /api/categories/:code/move
pub async fn move_category(
    Path(code): Path<String>,
    Json(dto): Json<MoveCategoryDto>,
) -> ApiResult<MovePlan> {
    service::move_category(&SqliteCategoryStore, &code, dto)
        .await
        .map(Json)
}

/// GET /api/categories/:code/deletion-check
pub async fn deletion_check(Path(code): Path<String>) -> ApiResult<DeletionCheck> {
    service::deletion_check(&SqliteCategoryStore, &SqliteProductStore, &code)
        .await
        .map(Json)
}

/// DELETE /api/categories/:code
pub async fn delete(Path(code): Path<String>) -> Result<StatusCode, CategoryServiceError> {
    service::delete(&SqliteCategoryStore, &SqliteProductStore, &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/categories/import
pub async fn import_csv(body: String) -> ApiResult<ImportResult> {
    tracing::info!("Received CSV import request ({} bytes)", body.len());
    csv_exchange::import_csv(&SqliteCategoryStore, &body)
        .await
        .map(Json)
}

/// GET /api/categories/export
pub async fn export_csv(Query(query): Query<IndustryQuery>) -> Result<Response, CategoryServiceError> {
    let category_query = CategoryQuery {
        industry_code: query.industry_code,
        q: None,
    };
    let records = service::list(&SqliteCategoryStore, &category_query).await?;
    let body = csv_exchange::export_csv(&records)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"categories.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}
