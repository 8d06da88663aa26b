//! Password model and revision records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{accessors, impl_record, impl_revision_record, model_record};

model_record! {
    /// Identity record for a stored password. Carries the pointer to the
    /// current revision; the versioned payload lives in
    /// [`PasswordRevision`].
    Password, table "passwords", revision PasswordRevision
}

/// Snapshot of a password's versioned fields at a point in time.
///
/// The `password` field holds the client- or server-side encrypted
/// ciphertext, never plaintext; `hash` is the breach-check digest of the
/// plaintext. Neither may be used as a query filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordRevision {
    id: Option<i64>,
    uuid: String,
    model: String,
    user_id: Option<String>,
    label: String,
    username: String,
    password: String,
    url: Option<String>,
    notes: Option<String>,
    folder: String,
    hash: String,
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
    PasswordRevision, table "password_revisions",
    forbidden = ["password", "hash"],
    fields {
        uuid => text,
        model => text,
        user_id => opt_text,
        label => text,
        username => text,
        password => text,
        url => opt_text,
        notes => opt_text,
        folder => text,
        hash => text,
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

impl_revision_record!(PasswordRevision, model_table = "passwords");

impl PasswordRevision {
    accessors! {
        str label / set_label;
        str username / set_username;
        /// Encrypted password payload.
        str password / set_password;
        opt url / set_url;
        opt notes / set_notes;
        /// Uuid of the folder this password lives in.
        str folder / set_folder;
        str hash / set_hash;
        str cse_type / set_cse_type;
        str sse_type / set_sse_type;
        copy bool, hidden / set_hidden;
        copy bool, trashed / set_trashed;
        copy bool, favorite / set_favorite;
        /// Client-side edit timestamp, distinct from the store's `updated`.
        copy i64, edited / set_edited;
    }
}
