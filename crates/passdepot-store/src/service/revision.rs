//! Generic service over revision records.
//!
//! Revisions are append-only: the service creates them with a full field
//! set, persists them once, and never mutates them afterwards. The update
//! path exists but by convention only consumes soft-delete flips.

use std::sync::Arc;

use passdepot_core::db::unix_timestamp;
use tracing::debug;

use super::{EventListener, StoreEvent};
use crate::db::StoreDatabase;
use crate::entity::{Record, RevisionRecord};
use crate::error::StoreError;
use crate::ids::{UuidSource, UuidV4};
use crate::query::Scope;
use crate::repository::Repository;

pub struct RevisionService<R: RevisionRecord> {
    repository: Repository<R>,
    scope: Scope,
    uuids: Arc<dyn UuidSource>,
    listeners: Vec<EventListener<R>>,
}

impl<R: RevisionRecord> RevisionService<R> {
    pub fn new(db: StoreDatabase, scope: Scope) -> Self {
        Self {
            repository: Repository::new(db),
            scope,
            uuids: Arc::new(UuidV4),
            listeners: Vec::new(),
        }
    }

    /// Replace the identifier generator (tests, embedding applications).
    #[must_use]
    pub fn with_uuid_source(mut self, uuids: Arc<dyn UuidSource>) -> Self {
        self.uuids = uuids;
        self
    }

    /// Register a lifecycle listener. Listeners run synchronously in
    /// registration order.
    pub fn subscribe(&mut self, listener: EventListener<R>) {
        self.listeners.push(listener);
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub const fn repository(&self) -> &Repository<R> {
        &self.repository
    }

    /// Build a new revision for the given model: standard fields first,
    /// then the caller initializes the versioned payload. Not yet
    /// persisted.
    pub fn create_with(
        &self,
        model_uuid: &str,
        init: impl FnOnce(&mut R),
    ) -> Result<R, StoreError> {
        let now = unix_timestamp();
        let mut revision = R::default();
        revision.set_deleted(false);
        revision.set_user_id(self.scope.user_id().map(ToOwned::to_owned));
        revision.set_uuid(self.uuids.generate());
        revision.set_model(model_uuid.to_string());
        revision.set_created(now);
        revision.set_updated(now);
        init(&mut revision);

        self.emit(&StoreEvent::PostCreate(&revision))?;

        Ok(revision)
    }

    /// Persist a revision: insert when it has no identity, otherwise stamp
    /// `updated` and write the dirty fields back.
    pub async fn save(&self, revision: &mut R) -> Result<(), StoreError> {
        self.emit(&StoreEvent::PreSave(revision))?;

        if revision.id().is_none() {
            self.repository.insert(revision).await?;
        } else {
            revision.set_updated(unix_timestamp());
            self.repository.update(revision).await?;
        }

        self.emit(&StoreEvent::PostSave(revision))?;

        Ok(())
    }

    /// Soft-delete a revision.
    pub async fn delete(&self, revision: &mut R) -> Result<(), StoreError> {
        self.emit(&StoreEvent::PreDelete(revision))?;
        revision.set_deleted(true);
        self.save(revision).await?;
        self.emit(&StoreEvent::PostDelete(revision))?;

        Ok(())
    }

    /// Duplicate a revision's field values, including the owning model,
    /// into a new instance with a fresh uuid and no store identity.
    pub fn clone_revision(&self, original: &R) -> R {
        let now = unix_timestamp();
        let mut clone = original.clone();
        clone.reset_identity();
        clone.mark_all_dirty();
        clone.set_uuid(self.uuids.generate());
        clone.set_created(now);
        clone.set_updated(now);

        clone
    }

    /// Hard-delete a revision row. Retention path for departed users.
    pub async fn destroy(&self, revision: &R) -> Result<(), StoreError> {
        debug!(revision = %revision.uuid(), "Revision destroyed");
        self.repository.destroy(revision).await
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<R, StoreError> {
        self.repository.find_by_uuid(&self.scope, uuid).await
    }

    pub async fn find_all(&self) -> Result<Vec<R>, StoreError> {
        self.repository.find_all(&self.scope).await
    }

    /// Every revision ever created for a model.
    pub async fn find_by_model(&self, model_uuid: &str) -> Result<Vec<R>, StoreError> {
        self.repository
            .find_all_by_model(&self.scope, model_uuid)
            .await
    }

    /// The revision mutually referenced by the model's pointer and its own
    /// back-reference.
    pub async fn find_current_by_model(&self, model_uuid: &str) -> Result<R, StoreError> {
        self.repository
            .find_current_revision_by_model(&self.scope, model_uuid)
            .await
    }

    pub async fn find_deleted(&self) -> Result<Vec<R>, StoreError> {
        self.repository.find_all_deleted(&self.scope).await
    }

    fn emit(&self, event: &StoreEvent<'_, R>) -> Result<(), StoreError> {
        for listener in &self.listeners {
            listener(event)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{BASE_FOLDER_UUID, FolderRevision, PasswordRevision};
    use std::sync::Mutex;

    async fn test_service() -> RevisionService<PasswordRevision> {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        RevisionService::new(db, Scope::user("alice"))
    }

    #[tokio::test]
    async fn create_with_sets_standard_fields_and_payload() {
        let service = test_service().await;

        let revision = service
            .create_with("p-1", |r| {
                r.set_label("mail");
                r.set_username("alice");
                r.set_password("ciphertext");
            })
            .unwrap();

        assert_eq!(revision.model(), "p-1");
        assert_eq!(revision.user_id(), Some("alice"));
        assert_eq!(revision.label(), "mail");
        assert!(!revision.uuid().is_empty());
        assert!(revision.id().is_none());
    }

    #[tokio::test]
    async fn save_round_trips_the_payload() {
        let service = test_service().await;

        let mut revision = service
            .create_with("p-1", |r| {
                r.set_label("mail");
                r.set_username("alice");
                r.set_password("ciphertext");
                r.set_url(Some("https://mail.example".to_string()));
                r.set_folder(BASE_FOLDER_UUID);
                r.set_favorite(true);
                r.set_edited(99);
            })
            .unwrap();
        service.save(&mut revision).await.unwrap();

        let found = service.find_by_uuid(revision.uuid()).await.unwrap();
        assert_eq!(found.label(), "mail");
        assert_eq!(found.username(), "alice");
        assert_eq!(found.password(), "ciphertext");
        assert_eq!(found.url(), Some("https://mail.example"));
        assert_eq!(found.notes(), None);
        assert_eq!(found.folder(), BASE_FOLDER_UUID);
        assert!(found.favorite());
        assert_eq!(found.edited(), 99);
    }

    #[tokio::test]
    async fn revisions_accumulate_per_model() {
        let service = test_service().await;

        for label in ["A", "B", "C"] {
            let mut revision = service
                .create_with("p-1", |r| r.set_label(label))
                .unwrap();
            service.save(&mut revision).await.unwrap();
        }

        assert_eq!(service.find_by_model("p-1").await.unwrap().len(), 3);
        assert!(service.find_by_model("p-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clone_revision_keeps_the_model_reference() {
        let service = test_service().await;

        let mut original = service
            .create_with("p-1", |r| r.set_label("A"))
            .unwrap();
        service.save(&mut original).await.unwrap();

        let clone = service.clone_revision(&original);
        assert_eq!(clone.model(), "p-1");
        assert_eq!(clone.label(), "A");
        assert_ne!(clone.uuid(), original.uuid());
        assert!(clone.id().is_none());
    }

    #[tokio::test]
    async fn delete_moves_a_revision_to_the_deleted_set() {
        let service = test_service().await;

        let mut revision = service
            .create_with("p-1", |r| r.set_label("A"))
            .unwrap();
        service.save(&mut revision).await.unwrap();
        service.delete(&mut revision).await.unwrap();

        assert!(service.find_by_model("p-1").await.unwrap().is_empty());
        assert_eq!(service.find_deleted().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listeners_observe_revision_saves() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let mut service =
            RevisionService::<FolderRevision>::new(db, Scope::user("alice"));
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        service.subscribe(Box::new(move |event| {
            sink.lock().unwrap().push(event.name().to_string());
            Ok(())
        }));

        let mut revision = service
            .create_with("f-1", |r| {
                r.set_label("docs");
                r.set_parent(BASE_FOLDER_UUID);
            })
            .unwrap();
        service.save(&mut revision).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["postCreate", "preSave", "postSave"]
        );
    }
}
