//! Project CRUD scoped to the authenticated owner.
//!
//! Every operation takes the owner resolved from the session and treats a
//! project owned by someone else exactly like a missing one, so project ids
//! do not leak existence across accounts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use super::error::Error;
use super::ports::{CodeSink, ProjectRepository};
use super::project::{Language, Project, ProjectId, ProjectName};
use super::user::UserId;

const PROJECT_NOT_FOUND: &str = "project not found";

/// CRUD operations over the [`ProjectRepository`] port.
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    /// Build the service over a repository port.
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    /// Create a project seeded with the template for `language`.
    ///
    /// An unrecognised language tag does not fail creation; the project seeds
    /// the "not supported" placeholder instead.
    pub async fn create(
        &self,
        owner: &UserId,
        name: &str,
        language: &str,
    ) -> Result<Project, Error> {
        let name = ProjectName::new(name).map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({ "field": "name" }))
        })?;
        let project = Project::seeded(name, Language::parse(language), *owner);
        self.projects.insert(&project).await?;
        Ok(project)
    }

    /// All projects owned by `owner`, most recently updated first.
    pub async fn list(&self, owner: &UserId) -> Result<Vec<Project>, Error> {
        Ok(self.projects.list_by_owner(owner).await?)
    }

    /// Fetch one project owned by `owner`.
    pub async fn get(&self, owner: &UserId, id: &ProjectId) -> Result<Project, Error> {
        self.owned(owner, id).await
    }

    /// Overwrite the code blob. Last write wins; there is no concurrency
    /// token to check.
    pub async fn save(&self, owner: &UserId, id: &ProjectId, code: &str) -> Result<Project, Error> {
        self.owned(owner, id).await?;
        self.projects
            .update_code(id, code, Utc::now())
            .await?
            .ok_or_else(|| Error::not_found(PROJECT_NOT_FOUND))
    }

    /// Remove a project owned by `owner`.
    pub async fn delete(&self, owner: &UserId, id: &ProjectId) -> Result<(), Error> {
        self.owned(owner, id).await?;
        if self.projects.delete(id).await? {
            Ok(())
        } else {
            Err(Error::not_found(PROJECT_NOT_FOUND))
        }
    }

    /// Narrow autosave port bound to one owner, for the editor session.
    pub fn sink_for(self: &Arc<Self>, owner: UserId) -> Arc<dyn CodeSink> {
        Arc::new(OwnedProjectSink {
            service: Arc::clone(self),
            owner,
        })
    }

    async fn owned(&self, owner: &UserId, id: &ProjectId) -> Result<Project, Error> {
        match self.projects.find_by_id(id).await? {
            Some(project) if &project.owner == owner => Ok(project),
            // Hide other owners' projects behind the same NotFound.
            Some(_) | None => Err(Error::not_found(PROJECT_NOT_FOUND)),
        }
    }
}

/// [`CodeSink`] adapter writing through [`ProjectService::save`] as one owner.
struct OwnedProjectSink {
    service: Arc<ProjectService>,
    owner: UserId,
}

#[async_trait]
impl CodeSink for OwnedProjectSink {
    async fn persist(&self, project: &ProjectId, code: &str) -> Result<(), Error> {
        self.service.save(&self.owner, project, code).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PersistenceError;
    use crate::domain::ErrorCode;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryProjects {
        rows: Mutex<HashMap<ProjectId, Project>>,
    }

    #[async_trait]
    impl ProjectRepository for MemoryProjects {
        async fn insert(&self, project: &Project) -> Result<(), PersistenceError> {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            rows.insert(project.id, project.clone());
            Ok(())
        }

        async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Project>, PersistenceError> {
            let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            let mut owned: Vec<Project> = rows
                .values()
                .filter(|project| &project.owner == owner)
                .cloned()
                .collect();
            owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(owned)
        }

        async fn find_by_id(&self, id: &ProjectId) -> Result<Option<Project>, PersistenceError> {
            let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            Ok(rows.get(id).cloned())
        }

        async fn update_code(
            &self,
            id: &ProjectId,
            code: &str,
            updated_at: DateTime<Utc>,
        ) -> Result<Option<Project>, PersistenceError> {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            Ok(rows.get_mut(id).map(|project| {
                project.code = code.to_owned();
                project.updated_at = updated_at;
                project.clone()
            }))
        }

        async fn delete(&self, id: &ProjectId) -> Result<bool, PersistenceError> {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            Ok(rows.remove(id).is_some())
        }
    }

    fn service() -> Arc<ProjectService> {
        Arc::new(ProjectService::new(Arc::new(MemoryProjects::default())))
    }

    #[tokio::test]
    async fn create_seeds_language_template() {
        let projects = service();
        let owner = UserId::random();
        let project = projects
            .create(&owner, "hello", "python")
            .await
            .expect("create succeeds");
        assert_eq!(project.code, "print(\"Hello World\")");
        assert_eq!(project.language, Language::Python);
    }

    #[tokio::test]
    async fn create_with_unknown_language_still_succeeds() {
        let projects = service();
        let owner = UserId::random();
        let project = projects
            .create(&owner, "mystery", "cobol")
            .await
            .expect("create succeeds");
        assert_eq!(project.code, "Language not supported");
    }

    #[tokio::test]
    async fn save_then_get_returns_saved_code() {
        let projects = service();
        let owner = UserId::random();
        let project = projects
            .create(&owner, "hello", "c")
            .await
            .expect("create succeeds");

        projects
            .save(&owner, &project.id, "int main() { return 7; }")
            .await
            .expect("save succeeds");
        let fetched = projects
            .get(&owner, &project.id)
            .await
            .expect("get succeeds");
        assert_eq!(fetched.code, "int main() { return 7; }");
    }

    #[tokio::test]
    async fn save_to_missing_id_is_not_found() {
        let projects = service();
        let owner = UserId::random();
        let err = projects
            .save(&owner, &ProjectId::random(), "x")
            .await
            .expect_err("save fails");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn other_owners_projects_read_as_missing() {
        let projects = service();
        let owner = UserId::random();
        let intruder = UserId::random();
        let project = projects
            .create(&owner, "secret", "bash")
            .await
            .expect("create succeeds");

        for err in [
            projects.get(&intruder, &project.id).await.expect_err("get"),
            projects
                .save(&intruder, &project.id, "stolen")
                .await
                .expect_err("save"),
            projects
                .delete(&intruder, &project.id)
                .await
                .expect_err("delete")
                .into(),
        ] {
            assert_eq!(err.code(), ErrorCode::NotFound);
        }

        // The owner still sees the original code.
        let untouched = projects.get(&owner, &project.id).await.expect("get");
        assert_eq!(untouched.code, "echo \"Hello World\"");
    }

    #[tokio::test]
    async fn delete_removes_until_not_found() {
        let projects = service();
        let owner = UserId::random();
        let project = projects
            .create(&owner, "ephemeral", "go")
            .await
            .expect("create succeeds");

        projects
            .delete(&owner, &project.id)
            .await
            .expect("delete succeeds");
        let err = projects
            .get(&owner, &project.id)
            .await
            .expect_err("get fails after delete");
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err = projects
            .delete(&owner, &project.id)
            .await
            .expect_err("second delete fails");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let projects = service();
        let ada = UserId::random();
        let bob = UserId::random();
        projects.create(&ada, "one", "python").await.expect("create");
        projects.create(&ada, "two", "go").await.expect("create");
        projects.create(&bob, "other", "bash").await.expect("create");

        let listed = projects.list(&ada).await.expect("list succeeds");
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|project| project.owner == ada));
    }

    #[tokio::test]
    async fn sink_writes_through_the_service() {
        let projects = service();
        let owner = UserId::random();
        let project = projects
            .create(&owner, "hello", "python")
            .await
            .expect("create succeeds");

        let sink = projects.sink_for(owner);
        sink.persist(&project.id, "print(42)")
            .await
            .expect("persist succeeds");

        let fetched = projects.get(&owner, &project.id).await.expect("get");
        assert_eq!(fetched.code, "print(42)");
    }
}
