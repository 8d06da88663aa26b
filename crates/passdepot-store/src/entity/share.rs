//! Share records linking a source password to a receiver.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{accessors, impl_record};

/// How a share reaches its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareType {
    User,
    Group,
    Link,
}

impl ShareType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Link => "link",
        }
    }
}

impl std::fmt::Display for ShareType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relation granting another user, group or public link access to a
/// password.
///
/// `source_password` is the owner's model uuid; `target_password` stays
/// unset until the receiver's copy materializes. The `source_updated` and
/// `target_updated` flags mark pending outbound propagation; they are set
/// here and cleared only by the external sync collaborator, so a crashed
/// propagation run is retried on the next scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Share {
    id: Option<i64>,
    uuid: String,
    user_id: Option<String>,
    receiver: String,
    share_type: String,
    source_password: String,
    target_password: Option<String>,
    editable: bool,
    shareable: bool,
    expires: Option<i64>,
    source_updated: bool,
    target_updated: bool,
    deleted: bool,
    created: i64,
    updated: i64,
    #[serde(skip)]
    #[sqlx(skip)]
    dirty: BTreeSet<&'static str>,
}

impl_record!(
    Share, table "shares",
    forbidden = [],
    fields {
        uuid => text,
        user_id => opt_text,
        receiver => text,
        share_type => text,
        source_password => text,
        target_password => opt_text,
        editable => boolean,
        shareable => boolean,
        expires => opt_int,
        source_updated => boolean,
        target_updated => boolean,
        deleted => boolean,
        created => int,
        updated => int,
    }
);

impl Share {
    accessors! {
        str uuid / set_uuid;
        opt user_id / set_user_id;
        str receiver / set_receiver;
        str share_type / set_share_type;
        str source_password / set_source_password;
        opt target_password / set_target_password;
        copy bool, editable / set_editable;
        copy bool, shareable / set_shareable;
        opt_int expires / set_expires;
        copy bool, source_updated / set_source_updated;
        copy bool, target_updated / set_target_updated;
        copy bool, deleted / set_deleted;
        copy i64, created / set_created;
        copy i64, updated / set_updated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Record, Value};

    #[test]
    fn share_type_round_trip() {
        assert_eq!(ShareType::User.as_str(), "user");
        assert_eq!(ShareType::Group.to_string(), "group");
        assert_eq!(ShareType::Link.as_str(), "link");
    }

    #[test]
    fn expires_binds_as_null_when_unset() {
        let share = Share::default();
        assert_eq!(share.value("expires"), Value::Null);

        let mut share = Share::default();
        share.set_expires(Some(100));
        assert_eq!(share.value("expires"), Value::Int(100));
    }

    #[test]
    fn propagation_flags_track_dirtiness() {
        let mut share = Share::default();
        share.set_source_updated(true);

        assert!(share.source_updated());
        assert!(!share.target_updated());
        assert_eq!(share.dirty_fields(), vec!["source_updated"]);
    }
}
