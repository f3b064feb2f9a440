use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Серверные отметки времени записи.
///
/// Для движка иерархии непрозрачны: заполняются хранилищем при записи
/// и только переносятся между слоями.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Дата создания записи
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Дата последнего обновления
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EntityMetadata {
    /// Метаданные для только что созданной записи
    pub fn created_now() -> Self {
        let now = Utc::now();
        Self {
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Обновить timestamp
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
        if self.created_at.is_none() {
            self.created_at = self.updated_at;
        }
    }
}
