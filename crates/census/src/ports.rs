//! Port traits through which the pipeline reaches the issue tracker.
//!
//! Both traits are object-safe (`async-trait`) so the orchestrator can take
//! `&dyn ProjectBoard` / `&dyn LabelCatalog`. The `github` crate supplies the
//! production implementation; tests supply in-memory ones.

use async_trait::async_trait;

use crate::{Card, Column, ColumnId, Label, LabelName, Project, ProjectId, RepositoryId, TrackerError};

/// Read access to the project boards of a repository.
#[async_trait]
pub trait ProjectBoard: Send + Sync {
    /// Lists the project boards attached to `repository`, in tracker order.
    async fn list_projects(&self, repository: &RepositoryId) -> Result<Vec<Project>, TrackerError>;

    /// Lists every column of a project, in board order.
    async fn list_project_columns(&self, project: ProjectId) -> Result<Vec<Column>, TrackerError>;

    /// Lists the cards of one column, in board order, with their labels.
    async fn list_project_cards(&self, column: ColumnId) -> Result<Vec<Card>, TrackerError>;
}

/// Lookup of repository labels by name.
#[async_trait]
pub trait LabelCatalog: Send + Sync {
    /// Fetches one label.
    ///
    /// Returns [`TrackerError::NotFound`] when the repository has no such label.
    async fn get_label(
        &self,
        repository: &RepositoryId,
        name: &LabelName,
    ) -> Result<Label, TrackerError>;
}
