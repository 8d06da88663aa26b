//! Generic service over a model record and its revisions.

use std::sync::Arc;

use passdepot_core::db::unix_timestamp;
use tracing::debug;

use super::{ModelEvent, ModelEventListener};
use crate::db::StoreDatabase;
use crate::entity::{ModelRecord, Record, RevisionRecord};
use crate::error::StoreError;
use crate::ids::{UuidSource, UuidV4};
use crate::query::{FieldFilter, Scope};
use crate::repository::Repository;

/// Orchestrates the create → attach-revision → save lifecycle for one model
/// kind.
pub struct ModelService<M: ModelRecord> {
    repository: Repository<M>,
    scope: Scope,
    uuids: Arc<dyn UuidSource>,
    listeners: Vec<ModelEventListener<M>>,
}

impl<M: ModelRecord> ModelService<M> {
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
    pub fn subscribe(&mut self, listener: ModelEventListener<M>) {
        self.listeners.push(listener);
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub const fn repository(&self) -> &Repository<M> {
        &self.repository
    }

    /// Build a new model: fresh uuid, owner from the service scope,
    /// timestamps set to now. Not yet persisted.
    pub fn create(&self) -> Result<M, StoreError> {
        let now = unix_timestamp();
        let mut model = M::default();
        model.set_deleted(false);
        model.set_user_id(self.scope.user_id().map(ToOwned::to_owned));
        model.set_uuid(self.uuids.generate());
        model.set_created(now);
        model.set_updated(now);

        self.emit(&ModelEvent::PostCreate(&model))?;

        Ok(model)
    }

    /// Persist a model: insert when it has no identity, otherwise stamp
    /// `updated` and write the dirty fields back.
    pub async fn save(&self, model: &mut M) -> Result<(), StoreError> {
        self.emit(&ModelEvent::PreSave(model))?;

        if model.id().is_none() {
            self.repository.insert(model).await?;
        } else {
            model.set_updated(unix_timestamp());
            self.repository.update(model).await?;
        }

        self.emit(&ModelEvent::PostSave(model))?;

        Ok(())
    }

    /// Advance the model's current-revision pointer. The sole sanctioned
    /// pointer-advance path: the revision must belong to the model, and the
    /// pointer is untouched when it does not.
    ///
    /// Concurrent calls for the same model are not adjudicated; the last
    /// write wins.
    pub async fn set_revision(
        &self,
        model: &mut M,
        revision: &M::Revision,
    ) -> Result<(), StoreError> {
        if revision.model() != model.uuid() {
            return Err(StoreError::RevisionMismatch {
                model: model.uuid().to_string(),
                revision: revision.uuid().to_string(),
            });
        }

        self.emit(&ModelEvent::PreSetRevision(model, revision))?;
        model.set_revision(Some(revision.uuid().to_string()));
        self.save(model).await?;
        debug!(model = %model.uuid(), revision = %revision.uuid(), "Model revision advanced");
        self.emit(&ModelEvent::PostSetRevision(model, revision))?;

        Ok(())
    }

    /// Soft-delete a model. The row is retained and moves to the deleted
    /// set; hard deletion is reserved for [`Self::destroy`].
    pub async fn delete(&self, model: &mut M) -> Result<(), StoreError> {
        self.emit(&ModelEvent::PreDelete(model))?;
        model.set_deleted(true);
        self.save(model).await?;
        self.emit(&ModelEvent::PostDelete(model))?;

        Ok(())
    }

    /// Duplicate a model's field values into a new instance with a fresh
    /// uuid, no store identity, and refreshed timestamps. Not yet
    /// persisted.
    pub fn clone_model(&self, original: &M) -> M {
        let now = unix_timestamp();
        let mut clone = original.clone();
        clone.reset_identity();
        clone.mark_all_dirty();
        clone.set_uuid(self.uuids.generate());
        clone.set_created(now);
        clone.set_updated(now);

        clone
    }

    /// Hard-delete a model row. Retention path for departed users.
    pub async fn destroy(&self, model: &M) -> Result<(), StoreError> {
        debug!(model = %model.uuid(), "Model destroyed");
        self.repository.destroy(model).await
    }

    pub async fn find_all(&self) -> Result<Vec<M>, StoreError> {
        self.repository.find_all(&self.scope).await
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<M, StoreError> {
        self.repository.find_by_uuid(&self.scope, uuid).await
    }

    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<M>, StoreError> {
        self.repository
            .find_all_by_user_id(&self.scope, user_id)
            .await
    }

    pub async fn find_deleted(&self) -> Result<Vec<M>, StoreError> {
        self.repository.find_all_deleted(&self.scope).await
    }

    /// Models whose current revision matches the given filters.
    pub async fn find_by_revision_fields(
        &self,
        filters: &[FieldFilter],
    ) -> Result<Vec<M>, StoreError> {
        self.repository
            .find_all_by_revision_fields(&self.scope, filters)
            .await
    }

    fn emit(&self, event: &ModelEvent<'_, M>) -> Result<(), StoreError> {
        for listener in &self.listeners {
            listener(event)?;
        }

        Ok(())
    }
}
