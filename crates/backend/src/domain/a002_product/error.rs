use thiserror::Error;

/// Ошибки сервиса товаров
#[derive(Debug, Error)]
pub enum ProductServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
