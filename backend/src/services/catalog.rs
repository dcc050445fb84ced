//! Categories and departments
//!
//! Both are plain named lookups with identical behaviour, so one service
//! serves both tables.

use serde::Deserialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Which lookup table to work on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Category,
    Department,
}

impl CatalogKind {
    fn table(&self) -> &'static str {
        match self {
            CatalogKind::Category => "categories",
            CatalogKind::Department => "departments",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CatalogKind::Category => "Category",
            CatalogKind::Department => "Department",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::Department => "department",
        }
    }
}

/// A category or department
#[derive(Debug, Clone, serde::Serialize, FromRow)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CatalogInput {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
    kind: CatalogKind,
}

impl CatalogService {
    pub fn new(db: PgPool, kind: CatalogKind) -> Self {
        Self { db, kind }
    }

    pub async fn list(&self) -> AppResult<Vec<CatalogEntry>> {
        let entries = sqlx::query_as::<_, CatalogEntry>(&format!(
            "SELECT id, name FROM {} ORDER BY name",
            self.kind.table()
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    pub async fn create(&self, input: CatalogInput) -> AppResult<CatalogEntry> {
        input.validate()?;

        let entry = sqlx::query_as::<_, CatalogEntry>(&format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            self.kind.table()
        ))
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| self.map_unique(e))?;

        Ok(entry)
    }

    pub async fn update(&self, id: Uuid, input: CatalogInput) -> AppResult<CatalogEntry> {
        input.validate()?;

        sqlx::query_as::<_, CatalogEntry>(&format!(
            "UPDATE {} SET name = $2 WHERE id = $1 RETURNING id, name",
            self.kind.table()
        ))
        .bind(id)
        .bind(input.name.trim())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| self.map_unique(e))?
        .ok_or_else(|| AppError::NotFound(self.kind.label().to_string()))
    }

    /// Items that referenced the entry keep a NULL reference
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.kind.table()))
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(self.kind.label().to_string()));
        }
        Ok(())
    }

    /// Resolve a name to an id inside a transaction. Blank names resolve to
    /// `None`; unknown names are a validation error.
    pub async fn resolve(
        tx: &mut Transaction<'_, Postgres>,
        kind: CatalogKind,
        name: Option<&str>,
    ) -> AppResult<Option<Uuid>> {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };

        let id = sqlx::query_scalar::<_, Uuid>(&format!(
            "SELECT id FROM {} WHERE LOWER(name) = LOWER($1)",
            kind.table()
        ))
        .bind(name)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::validation(kind.field(), format!("Unknown {}: {}", kind.field(), name)))?;

        Ok(Some(id))
    }

    fn map_unique(&self, err: sqlx::Error) -> AppError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::DuplicateEntry(self.kind.field().to_string());
            }
        }
        AppError::DatabaseError(err)
    }
}
