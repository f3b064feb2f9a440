use contracts::domain::a001_category::CategoryRecord;
use contracts::domain::a002_product::Product;
use contracts::domain::common::AggregateRoot;
use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use std::path::Path;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// URL подключения к SQLite-файлу (с созданием файла при отсутствии)
fn sqlite_url(db_file: &Path) -> anyhow::Result<String> {
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    Ok(format!("sqlite://{}{}?mode=rwc", prefix, normalized))
}

pub async fn initialize_database(db_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db_url = sqlite_url(db_file)?;
    tracing::info!("Connecting to database: {}", db_url);
    let conn = Database::connect(&db_url).await?;

    // Ensure required tables exist (minimal schema bootstrap)
    let category_table = CategoryRecord::full_name();
    ensure_table(
        &conn,
        &category_table,
        &format!(
            r#"
            CREATE TABLE {category_table} (
                category_code TEXT PRIMARY KEY NOT NULL,
                industry_code TEXT,
                industry_name TEXT,
                category_1 TEXT NOT NULL DEFAULT '',
                category_2 TEXT NOT NULL DEFAULT '',
                category_3 TEXT NOT NULL DEFAULT '',
                category_4 TEXT NOT NULL DEFAULT '',
                category_5 TEXT NOT NULL DEFAULT '',
                category_6 TEXT NOT NULL DEFAULT '',
                category_7 TEXT NOT NULL DEFAULT '',
                category_8 TEXT NOT NULL DEFAULT '',
                product_type TEXT,
                breadcrumb TEXT NOT NULL DEFAULT '',
                created_at TEXT,
                updated_at TEXT
            );
            CREATE INDEX idx_{category_table}_industry ON {category_table} (industry_code);
            "#
        ),
    )
    .await?;

    let product_table = Product::full_name();
    ensure_table(
        &conn,
        &product_table,
        &format!(
            r#"
            CREATE TABLE {product_table} (
                product_code TEXT PRIMARY KEY NOT NULL,
                product_name TEXT NOT NULL,
                category_code TEXT,
                created_at TEXT,
                updated_at TEXT
            );
            CREATE INDEX idx_{product_table}_category ON {product_table} (category_code);
            "#
        ),
    )
    .await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Создать таблицу, если её ещё нет
async fn ensure_table(conn: &DatabaseConnection, table: &str, ddl: &str) -> anyhow::Result<()> {
    let check_table = format!(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='{}';",
        table
    );
    let existing = conn
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, check_table))
        .await?;

    if existing.is_empty() {
        tracing::info!("Creating {} table", table);
        conn.execute_unprepared(ddl).await?;
    } else {
        tracing::info!("Table {} already exists", table);
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_url_for_absolute_path() {
        let url = sqlite_url(Path::new("/var/lib/catalog/app.db")).unwrap();
        assert_eq!(url, "sqlite:///var/lib/catalog/app.db?mode=rwc");
    }
}
