use contracts::domain::a001_category::HierarchyError;
use thiserror::Error;

/// Ошибки сервиса категорий
#[derive(Debug, Error)]
pub enum CategoryServiceError {
    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("Category has child categories: {}", .0.join(", "))]
    HasChildren(Vec<String>),

    #[error("Category is referenced by {0} products")]
    ReferencedByProducts(u64),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CategoryServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}
