mod project;
mod validation;

pub use project::{NewProject, Project, ProjectChanges, ProjectPatch, ProjectPayload};
pub use validation::{FieldError, ValidationErrors};
