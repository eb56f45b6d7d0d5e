use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::config::Config;
use crate::models::{NewProject, Project, ProjectChanges};

#[cfg(test)]
pub mod memory;

const PROJECT_COLUMNS: &str = "id, title, description, url, image_url, created_at";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id          SERIAL PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    url         TEXT,
    image_url   TEXT,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS ix_projects_title ON projects (title);
"#;

/// Failure of the underlying record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence operations for projects.
///
/// Every call runs in its own transaction. A missing row is `Ok(None)`, not an error.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, project: NewProject) -> StoreResult<Project>;

    /// Rows in insertion order, skipping `skip` and returning at most `limit`.
    async fn list(&self, skip: u32, limit: u32) -> StoreResult<Vec<Project>>;

    async fn get(&self, id: i32) -> StoreResult<Option<Project>>;

    /// Apply the present fields of `changes` and return the refreshed row.
    async fn update(&self, id: i32, changes: ProjectChanges) -> StoreResult<Option<Project>>;

    /// Remove the row, returning it as it was before deletion.
    async fn delete(&self, id: i32) -> StoreResult<Option<Project>>;
}

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_with(config.connect_options()?)
            .await?;

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the projects table and its title index if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.get_pool().execute(SCHEMA).await?;
        tracing::info!("projects schema ready");

        Ok(())
    }

    /// Wait for checked-out connections to return, then close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ProjectStore for Database {
    async fn create(&self, project: NewProject) -> StoreResult<Project> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (title, description, url, image_url) \
             VALUES ($1, $2, $3, $4) RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(project.title)
        .bind(project.description)
        .bind(project.url)
        .bind(project.image_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(project_id = created.id, "created project");

        Ok(created)
    }

    async fn list(&self, skip: u32, limit: u32) -> StoreResult<Vec<Project>> {
        let mut tx = self.pool.begin().await?;

        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id ASC OFFSET $1 LIMIT $2"
        ))
        .bind(i64::from(skip))
        .bind(i64::from(limit))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(projects)
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(project)
    }

    async fn update(&self, id: i32, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;

        let mut query = update_query(id, &changes);
        let project = query
            .build_query_as::<Project>()
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        if project.is_some() {
            tracing::debug!(project_id = id, "updated project");
        }

        Ok(project)
    }

    async fn delete(&self, id: i32) -> StoreResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(&format!(
            "DELETE FROM projects WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        if project.is_some() {
            tracing::debug!(project_id = id, "deleted project");
        }

        Ok(project)
    }
}

/// Build an `UPDATE … RETURNING` touching only the present fields, or a
/// plain `SELECT` when nothing changes.
fn update_query(id: i32, changes: &ProjectChanges) -> QueryBuilder<'static, Postgres> {
    if changes.is_empty() {
        let mut query = QueryBuilder::new(format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = "));
        query.push_bind(id);
        return query;
    }

    let mut query = QueryBuilder::new("UPDATE projects SET ");
    let mut set = query.separated(", ");
    if let Some(title) = &changes.title {
        set.push("title = ").push_bind_unseparated(title.clone());
    }
    if let Some(description) = &changes.description {
        set.push("description = ").push_bind_unseparated(description.clone());
    }
    if let Some(url) = &changes.url {
        set.push("url = ").push_bind_unseparated(url.clone());
    }
    if let Some(image_url) = &changes.image_url {
        set.push("image_url = ").push_bind_unseparated(image_url.clone());
    }
    query.push(" WHERE id = ");
    query.push_bind(id);
    query.push(format!(" RETURNING {PROJECT_COLUMNS}"));

    query
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;
    tracing::info!("database connection established");

    Ok(db)
}
