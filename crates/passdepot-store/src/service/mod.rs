//! Lifecycle services over the repositories.
//!
//! Services own creation and mutation of records and expose lifecycle
//! notification points to external collaborators. Listeners are a typed
//! callback list held by each service and invoked synchronously in
//! registration order: action performed, notification fired, caller
//! resumes. A listener error propagates to the caller; nothing is retried.

mod model;
mod revision;
mod share;

pub use model::ModelService;
pub use revision::RevisionService;
pub use share::ShareService;

use crate::entity::ModelRecord;
use crate::error::StoreError;

/// Lifecycle notifications common to all record services.
pub enum StoreEvent<'a, E> {
    PostCreate(&'a E),
    PreSave(&'a E),
    PostSave(&'a E),
    PreDelete(&'a E),
    PostDelete(&'a E),
}

impl<E> StoreEvent<'_, E> {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PostCreate(_) => "postCreate",
            Self::PreSave(_) => "preSave",
            Self::PostSave(_) => "postSave",
            Self::PreDelete(_) => "preDelete",
            Self::PostDelete(_) => "postDelete",
        }
    }
}

/// Lifecycle notifications for model services, including the
/// revision-pointer events carrying both sides of the relation.
pub enum ModelEvent<'a, M: ModelRecord> {
    PostCreate(&'a M),
    PreSave(&'a M),
    PostSave(&'a M),
    PreDelete(&'a M),
    PostDelete(&'a M),
    PreSetRevision(&'a M, &'a M::Revision),
    PostSetRevision(&'a M, &'a M::Revision),
}

impl<M: ModelRecord> ModelEvent<'_, M> {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PostCreate(_) => "postCreate",
            Self::PreSave(_) => "preSave",
            Self::PostSave(_) => "postSave",
            Self::PreDelete(_) => "preDelete",
            Self::PostDelete(_) => "postDelete",
            Self::PreSetRevision(..) => "preSetRevision",
            Self::PostSetRevision(..) => "postSetRevision",
        }
    }
}

/// Callback registered for [`StoreEvent`] notifications.
pub type EventListener<E> =
    Box<dyn Fn(&StoreEvent<'_, E>) -> Result<(), StoreError> + Send + Sync>;

/// Callback registered for [`ModelEvent`] notifications.
pub type ModelEventListener<M> =
    Box<dyn Fn(&ModelEvent<'_, M>) -> Result<(), StoreError> + Send + Sync>;
