use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::validation::{collect, http_url, non_blank, FieldError, ValidationErrors};

/// A stored project row, also the response shape.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a project.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A validated project ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl ProjectPayload {
    pub fn validate(self) -> Result<NewProject, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = collect(
            &mut errors,
            required("title", self.title).and_then(|title| non_blank("title", title)),
        );
        let description = collect(&mut errors, required("description", self.description));
        let url = collect(&mut errors, optional_url("url", self.url));
        let image_url = collect(&mut errors, optional_url("image_url", self.image_url));

        match (title, description, url, image_url) {
            (Some(title), Some(description), Some(url), Some(image_url)) => {
                errors.into_result(NewProject {
                    title,
                    description,
                    url,
                    image_url,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Request body for a partial update.
///
/// The outer `Option` records whether the field was sent at all; the inner
/// one whether it was sent as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
}

/// Validated field changes for an existing project. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.image_url.is_none()
    }

    /// Apply the present fields to `project`.
    #[cfg(test)]
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(title) = &self.title {
            project.title = title.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(url) = &self.url {
            project.url = url.clone();
        }
        if let Some(image_url) = &self.image_url {
            project.image_url = image_url.clone();
        }
    }
}

impl ProjectPatch {
    pub fn validate(self) -> Result<ProjectChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut changes = ProjectChanges::default();

        match self.title {
            None => {}
            Some(None) => errors.push(not_null("title")),
            Some(Some(title)) => changes.title = collect(&mut errors, non_blank("title", title)),
        }
        match self.description {
            None => {}
            Some(None) => errors.push(not_null("description")),
            Some(Some(description)) => changes.description = Some(description),
        }
        if let Some(url) = self.url {
            changes.url = collect(&mut errors, optional_url("url", url));
        }
        if let Some(image_url) = self.image_url {
            changes.image_url = collect(&mut errors, optional_url("image_url", image_url));
        }

        errors.into_result(changes)
    }
}

fn optional_url(field: &str, raw: Option<String>) -> Result<Option<String>, FieldError> {
    raw.map(|raw| http_url(field, &raw)).transpose()
}

fn required(field: &str, value: Option<String>) -> Result<String, FieldError> {
    value.ok_or_else(|| FieldError::new(field, "missing", format!("{field} is required")))
}

fn not_null(field: &str) -> FieldError {
    FieldError::new(field, "null", format!("{field} may not be null"))
}

/// Deserialize a field that was present in the payload, keeping `null` as `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
