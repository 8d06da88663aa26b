//! Folder model and revision records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{accessors, impl_record, impl_revision_record, model_record};

/// Uuid of the implicit root folder. Never stored as a model row; revisions
/// whose `parent` equals this uuid live at the top level.
pub const BASE_FOLDER_UUID: &str = "00000000-0000-0000-0000-000000000000";

model_record! {
    /// Identity record for a folder in the password hierarchy.
    Folder, table "folders", revision FolderRevision
}

/// Snapshot of a folder's versioned fields at a point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct FolderRevision {
    id: Option<i64>,
    uuid: String,
    model: String,
    user_id: Option<String>,
    label: String,
    parent: String,
    cse_type: String,
    sse_type: String,
    hidden: bool,
    trashed: bool,
    favorite: bool,
    edited: i64,
    deleted: bool,
    created: i64,
    updated: i64,
    #[serde(skip)]
    #[sqlx(skip)]
    dirty: BTreeSet<&'static str>,
}

impl_record!(
    FolderRevision, table "folder_revisions",
    forbidden = [],
    fields {
        uuid => text,
        model => text,
        user_id => opt_text,
        label => text,
        parent => text,
        cse_type => text,
        sse_type => text,
        hidden => boolean,
        trashed => boolean,
        favorite => boolean,
        edited => int,
        deleted => boolean,
        created => int,
        updated => int,
    }
);

impl_revision_record!(FolderRevision, model_table = "folders");

impl FolderRevision {
    accessors! {
        str label / set_label;
        /// Uuid of the parent folder, [`BASE_FOLDER_UUID`] at the top level.
        str parent / set_parent;
        str cse_type / set_cse_type;
        str sse_type / set_sse_type;
        copy bool, hidden / set_hidden;
        copy bool, trashed / set_trashed;
        copy bool, favorite / set_favorite;
        copy i64, edited / set_edited;
    }
}
