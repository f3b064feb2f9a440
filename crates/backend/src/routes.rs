use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // A001 CATEGORIES
        // ========================================
        .route(
            "/api/categories",
            get(handlers::a001_category::list_all).post(handlers::a001_category::create),
        )
        .route("/api/categories/tree", get(handlers::a001_category::tree))
        .route("/api/categories/stats", get(handlers::a001_category::stats))
        .route(
            "/api/categories/export",
            get(handlers::a001_category::export_csv),
        )
        .route(
            "/api/categories/import",
            post(handlers::a001_category::import_csv),
        )
        .route(
            "/api/categories/:code",
            get(handlers::a001_category::get_by_code)
                .put(handlers::a001_category::update)
                .delete(handlers::a001_category::delete),
        )
        .route(
            "/api/categories/:code/parent",
            get(handlers::a001_category::get_parent),
        )
        .route(
            "/api/categories/:code/deletion-check",
            get(handlers::a001_category::deletion_check),
        )
        .route(
            "/api/categories/:code/move",
            post(handlers::a001_category::move_category),
        )
        // ========================================
        // A002 PRODUCTS (category reference counts)
        // ========================================
        .route(
            "/api/products",
            get(handlers::a002_product::list_all).post(handlers::a002_product::create),
        )
        .route("/api/products/count", get(handlers::a002_product::count))
}
