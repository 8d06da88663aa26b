//! Entity records and dirty tracking.
//!
//! Every persisted record carries an explicit set of changed-field names
//! populated by its setters. Insert persists only dirty fields; an update
//! with a clean record issues no store write.

mod folder;
mod password;
mod share;

pub use folder::{BASE_FOLDER_UUID, Folder, FolderRevision};
pub use password::{Password, PasswordRevision};
pub use share::{Share, ShareType};

use sqlx::sqlite::SqliteRow;

/// A value bound into a query parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Shape of a persisted record: table metadata, store identity, and the
/// dirty field set consumed by insert/update.
pub trait Record:
    Clone + Send + Sync + Unpin + for<'r> sqlx::FromRow<'r, SqliteRow> + 'static
{
    const TABLE: &'static str;
    /// Persisted columns, excluding the store identity.
    const FIELDS: &'static [&'static str];
    /// Columns callers may not filter on.
    const FORBIDDEN_FIELDS: &'static [&'static str];

    fn id(&self) -> Option<i64>;
    fn assign_id(&mut self, id: i64);
    fn reset_identity(&mut self);

    /// Changed-field names in deterministic order.
    fn dirty_fields(&self) -> Vec<&'static str>;
    fn mark_dirty(&mut self, field: &'static str);
    fn clear_dirty(&mut self);
    fn mark_all_dirty(&mut self) {
        for field in Self::FIELDS {
            self.mark_dirty(field);
        }
    }

    /// Current value of a field, as a bindable parameter.
    fn value(&self, field: &str) -> Value;
}

/// An identity record pointing at its current revision.
pub trait ModelRecord: Record + Default {
    /// Revision record type paired with this model.
    type Revision: RevisionRecord;

    fn uuid(&self) -> &str;
    fn set_uuid(&mut self, uuid: String);
    fn user_id(&self) -> Option<&str>;
    fn set_user_id(&mut self, user_id: Option<String>);
    fn revision(&self) -> Option<&str>;
    fn set_revision(&mut self, revision: Option<String>);
    fn deleted(&self) -> bool;
    fn set_deleted(&mut self, deleted: bool);
    fn created(&self) -> i64;
    fn set_created(&mut self, created: i64);
    fn updated(&self) -> i64;
    fn set_updated(&mut self, updated: i64);
}

/// An immutable snapshot of a model's versioned fields. The `model` field
/// never changes after creation; updates to a logical item create a new
/// revision instead of mutating an old one.
pub trait RevisionRecord: Record + Default {
    /// Table holding the owning model records.
    const MODEL_TABLE: &'static str;

    fn uuid(&self) -> &str;
    fn set_uuid(&mut self, uuid: String);
    fn model(&self) -> &str;
    fn set_model(&mut self, model: String);
    fn user_id(&self) -> Option<&str>;
    fn set_user_id(&mut self, user_id: Option<String>);
    fn deleted(&self) -> bool;
    fn set_deleted(&mut self, deleted: bool);
    fn created(&self) -> i64;
    fn set_created(&mut self, created: i64);
    fn updated(&self) -> i64;
    fn set_updated(&mut self, updated: i64);
}

/// Expands to the bindable [`Value`] of a struct field, by kind.
macro_rules! value_of {
    ($self:ident, $field:ident, text) => {
        crate::entity::Value::Text($self.$field.clone())
    };
    ($self:ident, $field:ident, opt_text) => {
        $self
            .$field
            .clone()
            .map_or(crate::entity::Value::Null, crate::entity::Value::Text)
    };
    ($self:ident, $field:ident, boolean) => {
        crate::entity::Value::Bool($self.$field)
    };
    ($self:ident, $field:ident, int) => {
        crate::entity::Value::Int($self.$field)
    };
    ($self:ident, $field:ident, opt_int) => {
        $self
            .$field
            .map_or(crate::entity::Value::Null, crate::entity::Value::Int)
    };
}
pub(crate) use value_of;

/// Implements [`Record`] for a struct with `id` and `dirty` fields plus the
/// listed persisted columns.
macro_rules! impl_record {
    (
        $name:ident, table $table:literal,
        forbidden = [$($forbid:literal),* $(,)?],
        fields { $($field:ident => $kind:ident),+ $(,)? }
    ) => {
        impl crate::entity::Record for $name {
            const TABLE: &'static str = $table;
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];
            const FORBIDDEN_FIELDS: &'static [&'static str] = &[$($forbid),*];

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn assign_id(&mut self, id: i64) {
                self.id = Some(id);
            }

            fn reset_identity(&mut self) {
                self.id = None;
            }

            fn dirty_fields(&self) -> Vec<&'static str> {
                self.dirty.iter().copied().collect()
            }

            fn mark_dirty(&mut self, field: &'static str) {
                self.dirty.insert(field);
            }

            fn clear_dirty(&mut self) {
                self.dirty.clear();
            }

            fn value(&self, field: &str) -> crate::entity::Value {
                match field {
                    $(stringify!($field) => crate::entity::value_of!(self, $field, $kind),)+
                    _ => crate::entity::Value::Null,
                }
            }
        }
    };
}
pub(crate) use impl_record;

/// Implements [`RevisionRecord`] for a struct carrying the standard
/// revision fields.
macro_rules! impl_revision_record {
    ($name:ident, model_table = $model_table:literal) => {
        impl crate::entity::RevisionRecord for $name {
            const MODEL_TABLE: &'static str = $model_table;

            fn uuid(&self) -> &str {
                &self.uuid
            }

            fn set_uuid(&mut self, uuid: String) {
                self.uuid = uuid;
                self.dirty.insert("uuid");
            }

            fn model(&self) -> &str {
                &self.model
            }

            fn set_model(&mut self, model: String) {
                self.model = model;
                self.dirty.insert("model");
            }

            fn user_id(&self) -> Option<&str> {
                self.user_id.as_deref()
            }

            fn set_user_id(&mut self, user_id: Option<String>) {
                self.user_id = user_id;
                self.dirty.insert("user_id");
            }

            fn deleted(&self) -> bool {
                self.deleted
            }

            fn set_deleted(&mut self, deleted: bool) {
                self.deleted = deleted;
                self.dirty.insert("deleted");
            }

            fn created(&self) -> i64 {
                self.created
            }

            fn set_created(&mut self, created: i64) {
                self.created = created;
                self.dirty.insert("created");
            }

            fn updated(&self) -> i64 {
                self.updated
            }

            fn set_updated(&mut self, updated: i64) {
                self.updated = updated;
                self.dirty.insert("updated");
            }
        }
    };
}
pub(crate) use impl_revision_record;

/// Declares a model record struct (identity, current-revision pointer,
/// soft-delete flag, timestamps) and wires up [`Record`] + [`ModelRecord`].
macro_rules! model_record {
    (
        $(#[$meta:meta])*
        $name:ident, table $table:literal, revision $revision:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
        pub struct $name {
            id: Option<i64>,
            uuid: String,
            user_id: Option<String>,
            revision: Option<String>,
            deleted: bool,
            created: i64,
            updated: i64,
            #[serde(skip)]
            #[sqlx(skip)]
            dirty: ::std::collections::BTreeSet<&'static str>,
        }

        crate::entity::impl_record!(
            $name, table $table,
            forbidden = [],
            fields {
                uuid => text,
                user_id => opt_text,
                revision => opt_text,
                deleted => boolean,
                created => int,
                updated => int,
            }
        );

        impl crate::entity::ModelRecord for $name {
            type Revision = $revision;

            fn uuid(&self) -> &str {
                &self.uuid
            }

            fn set_uuid(&mut self, uuid: String) {
                self.uuid = uuid;
                self.dirty.insert("uuid");
            }

            fn user_id(&self) -> Option<&str> {
                self.user_id.as_deref()
            }

            fn set_user_id(&mut self, user_id: Option<String>) {
                self.user_id = user_id;
                self.dirty.insert("user_id");
            }

            fn revision(&self) -> Option<&str> {
                self.revision.as_deref()
            }

            fn set_revision(&mut self, revision: Option<String>) {
                self.revision = revision;
                self.dirty.insert("revision");
            }

            fn deleted(&self) -> bool {
                self.deleted
            }

            fn set_deleted(&mut self, deleted: bool) {
                self.deleted = deleted;
                self.dirty.insert("deleted");
            }

            fn created(&self) -> i64 {
                self.created
            }

            fn set_created(&mut self, created: i64) {
                self.created = created;
                self.dirty.insert("created");
            }

            fn updated(&self) -> i64 {
                self.updated
            }

            fn set_updated(&mut self, updated: i64) {
                self.updated = updated;
                self.dirty.insert("updated");
            }
        }
    };
}
pub(crate) use model_record;

/// Declares getter/setter pairs; setters record the field in the dirty set.
macro_rules! accessors {
    () => {};
    ( $(#[$m:meta])* str $field:ident / $setter:ident; $($rest:tt)* ) => {
        $(#[$m])*
        pub fn $field(&self) -> &str {
            &self.$field
        }

        pub fn $setter(&mut self, value: impl Into<String>) {
            self.$field = value.into();
            self.dirty.insert(stringify!($field));
        }

        crate::entity::accessors!($($rest)*);
    };
    ( $(#[$m:meta])* opt $field:ident / $setter:ident; $($rest:tt)* ) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<&str> {
            self.$field.as_deref()
        }

        pub fn $setter(&mut self, value: Option<String>) {
            self.$field = value;
            self.dirty.insert(stringify!($field));
        }

        crate::entity::accessors!($($rest)*);
    };
    ( $(#[$m:meta])* opt_int $field:ident / $setter:ident; $($rest:tt)* ) => {
        $(#[$m])*
        pub fn $field(&self) -> Option<i64> {
            self.$field
        }

        pub fn $setter(&mut self, value: Option<i64>) {
            self.$field = value;
            self.dirty.insert(stringify!($field));
        }

        crate::entity::accessors!($($rest)*);
    };
    ( $(#[$m:meta])* copy $ty:ty, $field:ident / $setter:ident; $($rest:tt)* ) => {
        $(#[$m])*
        pub fn $field(&self) -> $ty {
            self.$field
        }

        pub fn $setter(&mut self, value: $ty) {
            self.$field = value;
            self.dirty.insert(stringify!($field));
        }

        crate::entity::accessors!($($rest)*);
    };
}
pub(crate) use accessors;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_text_and_null() {
        assert_eq!(Value::text("a"), Value::Text("a".to_string()));
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(false).is_null());
    }

    #[test]
    fn mark_all_dirty_covers_every_field() {
        let mut password = Password::default();
        password.mark_all_dirty();
        assert_eq!(password.dirty_fields().len(), Password::FIELDS.len());
    }

    #[test]
    fn fresh_record_is_clean() {
        let password = Password::default();
        assert!(password.dirty_fields().is_empty());
    }
}
