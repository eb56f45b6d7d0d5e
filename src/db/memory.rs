use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{ProjectStore, StoreError, StoreResult};
use crate::models::{NewProject, Project, ProjectChanges};

/// In-process `ProjectStore` used by the handler tests.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Project>>,
    next_id: Mutex<i32>,
    pub unavailable: bool,
}

impl MemoryStore {
    /// A store whose every operation fails, for exercising the 500 path.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create(&self, project: NewProject) -> StoreResult<Project> {
        self.check()?;
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;

        let row = Project {
            id: *next_id,
            title: project.title,
            description: project.description,
            url: project.url,
            image_url: project.image_url,
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(row.clone());

        Ok(row)
    }

    async fn list(&self, skip: u32, limit: u32) -> StoreResult<Vec<Project>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Project>> {
        self.check()?;
        Ok(self.rows.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, id: i32, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        Ok(rows.iter_mut().find(|p| p.id == id).map(|row| {
            changes.apply_to(row);
            row.clone()
        }))
    }

    async fn delete(&self, id: i32) -> StoreResult<Option<Project>> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .position(|p| p.id == id)
            .map(|index| rows.remove(index)))
    }
}
