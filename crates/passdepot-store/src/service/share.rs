//! Share lifecycle and propagation bookkeeping.
//!
//! The service tracks which shares need outbound propagation without
//! running the propagation itself: shares are created with
//! `source_updated = true`, and the dirty flags are cleared only by the
//! external sync collaborator once it has propagated, so a crashed run is
//! retried on the next scan.

use std::sync::Arc;

use passdepot_core::db::unix_timestamp;
use tracing::debug;

use super::{EventListener, StoreEvent};
use crate::db::StoreDatabase;
use crate::entity::{Record, Share, ShareType, Value};
use crate::error::StoreError;
use crate::ids::{UuidSource, UuidV4};
use crate::query::{FieldFilter, Scope};
use crate::repository::Repository;

pub struct ShareService {
    repository: Repository<Share>,
    scope: Scope,
    uuids: Arc<dyn UuidSource>,
    listeners: Vec<EventListener<Share>>,
}

impl ShareService {
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
    pub fn subscribe(&mut self, listener: EventListener<Share>) {
        self.listeners.push(listener);
    }

    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    pub const fn repository(&self) -> &Repository<Share> {
        &self.repository
    }

    /// Build a new share of a source password. The source side starts
    /// dirty; the target password stays unset until the receiver's copy
    /// materializes. Not yet persisted.
    pub fn create(
        &self,
        source_password: &str,
        receiver: &str,
        share_type: ShareType,
        editable: bool,
        expires: Option<i64>,
        shareable: bool,
    ) -> Result<Share, StoreError> {
        let now = unix_timestamp();
        let mut share = Share::default();
        share.set_deleted(false);
        share.set_user_id(self.scope.user_id().map(ToOwned::to_owned));
        share.set_uuid(self.uuids.generate());
        share.set_created(now);
        share.set_updated(now);

        share.set_source_password(source_password);
        share.set_source_updated(true);
        share.set_target_updated(false);
        share.set_receiver(receiver);
        share.set_share_type(share_type.as_str());
        share.set_editable(editable);
        share.set_shareable(shareable);
        share.set_expires(expires);

        self.emit(&StoreEvent::PostCreate(&share))?;

        Ok(share)
    }

    /// Persist a share: insert when it has no identity, otherwise stamp
    /// `updated` and write the dirty fields back.
    pub async fn save(&self, share: &mut Share) -> Result<(), StoreError> {
        self.emit(&StoreEvent::PreSave(share))?;

        if share.id().is_none() {
            self.repository.insert(share).await?;
        } else {
            share.set_updated(unix_timestamp());
            self.repository.update(share).await?;
        }

        self.emit(&StoreEvent::PostSave(share))?;

        Ok(())
    }

    /// Soft-delete a share.
    pub async fn delete(&self, share: &mut Share) -> Result<(), StoreError> {
        self.emit(&StoreEvent::PreDelete(share))?;
        share.set_deleted(true);
        self.save(share).await?;
        self.emit(&StoreEvent::PostDelete(share))?;

        Ok(())
    }

    /// Hard-delete a share row. Expiry and retention collaborators only.
    pub async fn destroy(&self, share: &Share) -> Result<(), StoreError> {
        debug!(share = %share.uuid(), "Share destroyed");
        self.repository.destroy(share).await
    }

    pub async fn find_by_uuid(&self, uuid: &str) -> Result<Share, StoreError> {
        self.repository.find_by_uuid(&self.scope, uuid).await
    }

    pub async fn find_all(&self) -> Result<Vec<Share>, StoreError> {
        self.repository.find_all(&self.scope).await
    }

    /// All shares of a source password.
    pub async fn find_by_source_password(
        &self,
        password_uuid: &str,
    ) -> Result<Vec<Share>, StoreError> {
        self.repository
            .find_all_by_fields(
                &self.scope,
                &[FieldFilter::eq("source_password", Value::text(password_uuid))],
            )
            .await
    }

    /// The share backing a receiver-side password copy.
    pub async fn find_by_target_password(
        &self,
        password_uuid: &str,
    ) -> Result<Share, StoreError> {
        self.repository
            .find_one_by_fields(
                &self.scope,
                &[FieldFilter::eq("target_password", Value::text(password_uuid))],
            )
            .await
    }

    /// The share of a source password aimed at a specific receiver.
    pub async fn find_by_source_password_and_receiver(
        &self,
        password_uuid: &str,
        receiver: &str,
    ) -> Result<Share, StoreError> {
        self.repository
            .find_one_by_fields(
                &self.scope,
                &[
                    FieldFilter::eq("source_password", Value::text(password_uuid)),
                    FieldFilter::eq("receiver", Value::text(receiver)),
                ],
            )
            .await
    }

    /// Shares whose owner side changed since the last propagation run.
    pub async fn find_by_source_updated(&self) -> Result<Vec<Share>, StoreError> {
        self.repository
            .find_all_by_fields(
                &self.scope,
                &[FieldFilter::eq("source_updated", Value::Bool(true))],
            )
            .await
    }

    /// Shares whose receiver side changed since the last propagation run.
    pub async fn find_by_target_updated(&self) -> Result<Vec<Share>, StoreError> {
        self.repository
            .find_all_by_fields(
                &self.scope,
                &[FieldFilter::eq("target_updated", Value::Bool(true))],
            )
            .await
    }

    /// Shares whose receiver copy has not been provisioned yet.
    pub async fn find_new(&self) -> Result<Vec<Share>, StoreError> {
        self.repository
            .find_all_by_fields(
                &self.scope,
                &[FieldFilter::eq("target_password", Value::Null)],
            )
            .await
    }

    /// Shares whose expiry timestamp lies in the past. Deletion policy is
    /// the expiry collaborator's call.
    pub async fn find_expired(&self) -> Result<Vec<Share>, StoreError> {
        self.repository
            .find_all_by_fields(
                &self.scope,
                &[
                    FieldFilter::new("expires", Value::Null, "neq"),
                    FieldFilter::new("expires", Value::Int(unix_timestamp()), "lt"),
                ],
            )
            .await
    }

    /// Shares a user participates in, as owner or receiver.
    pub async fn find_by_user_id(&self, user_id: &str) -> Result<Vec<Share>, StoreError> {
        self.repository.find_all_by_user_or_receiver(user_id).await
    }

    fn emit(&self, event: &StoreEvent<'_, Share>) -> Result<(), StoreError> {
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

    async fn test_service() -> ShareService {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        ShareService::new(db, Scope::user("alice"))
    }

    async fn shared(service: &ShareService, source: &str, receiver: &str) -> Share {
        let mut share = service
            .create(source, receiver, ShareType::User, false, None, true)
            .unwrap();
        service.save(&mut share).await.unwrap();
        share
    }

    #[tokio::test]
    async fn create_marks_the_source_side_dirty() {
        let service = test_service().await;
        let share = shared(&service, "p-1", "bob").await;

        assert!(share.source_updated());
        assert!(!share.target_updated());
        assert_eq!(share.target_password(), None);
        assert_eq!(share.share_type(), "user");
        assert_eq!(share.user_id(), Some("alice"));
    }

    #[tokio::test]
    async fn fresh_share_appears_only_in_source_updated() {
        let service = test_service().await;
        let share = shared(&service, "p-1", "bob").await;

        let source_dirty = service.find_by_source_updated().await.unwrap();
        assert_eq!(source_dirty.len(), 1);
        assert_eq!(source_dirty[0].uuid(), share.uuid());

        assert!(service.find_by_target_updated().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn flag_flip_moves_a_share_between_dirty_sets() {
        let service = test_service().await;
        let mut share = shared(&service, "p-1", "bob").await;

        share.set_source_updated(false);
        share.set_target_updated(true);
        service.save(&mut share).await.unwrap();

        assert!(service.find_by_source_updated().await.unwrap().is_empty());
        assert_eq!(service.find_by_target_updated().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn new_shares_have_no_target_password() {
        let service = test_service().await;
        let mut share = shared(&service, "p-1", "bob").await;

        assert_eq!(service.find_new().await.unwrap().len(), 1);

        share.set_target_password(Some("p-copy".to_string()));
        service.save(&mut share).await.unwrap();

        assert!(service.find_new().await.unwrap().is_empty());
        let found = service.find_by_target_password("p-copy").await.unwrap();
        assert_eq!(found.uuid(), share.uuid());
    }

    #[tokio::test]
    async fn expiry_boundary() {
        let service = test_service().await;
        let now = unix_timestamp();

        let mut past = service
            .create("p-1", "bob", ShareType::User, false, Some(now - 10), true)
            .unwrap();
        service.save(&mut past).await.unwrap();

        let mut future = service
            .create("p-2", "bob", ShareType::User, false, Some(now + 1000), true)
            .unwrap();
        service.save(&mut future).await.unwrap();

        // no expiry at all
        shared(&service, "p-3", "bob").await;

        let expired = service.find_expired().await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].uuid(), past.uuid());
    }

    #[tokio::test]
    async fn lookup_by_source_and_receiver() {
        let service = test_service().await;
        shared(&service, "p-1", "bob").await;
        shared(&service, "p-1", "carol").await;
        shared(&service, "p-2", "bob").await;

        assert_eq!(
            service.find_by_source_password("p-1").await.unwrap().len(),
            2
        );

        let share = service
            .find_by_source_password_and_receiver("p-1", "carol")
            .await
            .unwrap();
        assert_eq!(share.receiver(), "carol");

        let missing = service
            .find_by_source_password_and_receiver("p-2", "carol")
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn owner_or_receiver_lookup_spans_both_sides() {
        let db = StoreDatabase::open_in_memory().await.unwrap();
        let alice = ShareService::new(db.clone(), Scope::user("alice"));
        let carol = ShareService::new(db, Scope::user("carol"));

        shared(&alice, "p-1", "bob").await;
        shared(&carol, "p-9", "alice").await;

        let visible = alice.find_by_user_id("alice").await.unwrap();
        assert_eq!(visible.len(), 2);

        let bobs = alice.find_by_user_id("bob").await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].receiver(), "bob");
    }

    #[tokio::test]
    async fn link_shares_carry_their_type() {
        let service = test_service().await;
        let mut share = service
            .create("p-1", "anyone", ShareType::Link, false, None, false)
            .unwrap();
        service.save(&mut share).await.unwrap();

        let found = service.find_by_uuid(share.uuid()).await.unwrap();
        assert_eq!(found.share_type(), "link");
        assert!(!found.shareable());
        assert!(!found.editable());
    }
}
