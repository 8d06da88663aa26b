//! Passdepot Versioned Entity Store
//!
//! Persistence core for an encrypted password manager backend:
//! - Models (passwords, folders) pointing at their current revision
//! - Append-only revision snapshots of the versioned payload
//! - Shares linking a source password to a receiver, with propagation
//!   bookkeeping for an external sync collaborator
//! - A field-filtered query builder with mandatory deleted/user scoping
//! - Lifecycle services with typed listener notifications

pub mod db;
pub mod entity;
pub mod error;
pub mod ids;
pub mod query;
pub mod repository;
pub mod service;

pub use db::StoreDatabase;
pub use entity::{
    BASE_FOLDER_UUID, Folder, FolderRevision, ModelRecord, Password, PasswordRevision, Record,
    RevisionRecord, Share, ShareType, Value,
};
pub use error::StoreError;
pub use ids::{UuidSource, UuidV4};
pub use query::{FieldFilter, Scope};
pub use repository::Repository;
pub use service::{
    EventListener, ModelEvent, ModelEventListener, ModelService, RevisionService, ShareService,
    StoreEvent,
};

/// Service over password models.
pub type PasswordService = ModelService<Password>;
/// Service over folder models.
pub type FolderService = ModelService<Folder>;
/// Service over password revisions.
pub type PasswordRevisionService = RevisionService<PasswordRevision>;
/// Service over folder revisions.
pub type FolderRevisionService = RevisionService<FolderRevision>;
