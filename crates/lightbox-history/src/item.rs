//! File references and role tags.
//!
//! An [`ItemInfo`] points at one concrete file in the collection together
//! with the metadata this subsystem needs: a database id, the modification
//! timestamp, the content-equivalence group, and the role tags the editing
//! session assigned to it.
//!
//! Role tags are *carried*, never derived: whether a file counts as the
//! original capture, an intermediate snapshot, or the current edited result
//! is decided by the session that wrote the file. Graph code unions these
//! tags but does not second-guess them from topology.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Role tags an item carries, and — unioned per vertex — the category
    /// set [`crate::history::HistoryGraph::categorize`] reports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Roles: u8 {
        /// First captured state of the lineage; no incoming edges.
        const ORIGINAL     = 1 << 0;
        /// Referenced only as an ancestor, never edited directly.
        const SOURCE       = 1 << 1;
        /// The file presently considered "the" edited result for its lineage.
        const CURRENT      = 1 << 2;
        /// A stored checkpoint, neither original nor current.
        const INTERMEDIATE = 1 << 3;
    }
}

/// A reference to one concrete file plus the metadata the history engine
/// consumes. Supplied by the image database; treated as immutable here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Database id of the file. Unique across the collection.
    pub id: i64,
    /// Last modification timestamp of the file.
    pub modified: DateTime<Utc>,
    /// Content-hash-equivalence group. Two infos with the same group are
    /// byte-for-byte equivalent pixel content and belong to the same vertex.
    pub content_group: String,
    /// Role tags assigned by the editing session.
    pub roles: Roles,
}

impl ItemInfo {
    /// Construct an info with the given id, timestamp, and content group,
    /// carrying no role tags.
    #[must_use]
    pub fn new(id: i64, modified: DateTime<Utc>, content_group: impl Into<String>) -> Self {
        Self {
            id,
            modified,
            content_group: content_group.into(),
            roles: Roles::empty(),
        }
    }

    /// Same info with `roles` added to its tag set.
    #[must_use]
    pub fn with_roles(mut self, roles: Roles) -> Self {
        self.roles |= roles;
        self
    }

    /// `true` if this info carries any of the given role tags.
    #[must_use]
    pub fn has_role(&self, roles: Roles) -> bool {
        self.roles.intersects(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info(id: i64) -> ItemInfo {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().expect("valid ts");
        ItemInfo::new(id, ts, format!("grp-{id}"))
    }

    #[test]
    fn new_info_has_no_roles() {
        assert_eq!(info(1).roles, Roles::empty());
        assert!(!info(1).has_role(Roles::ORIGINAL));
    }

    #[test]
    fn with_roles_accumulates() {
        let i = info(1).with_roles(Roles::ORIGINAL).with_roles(Roles::SOURCE);
        assert!(i.has_role(Roles::ORIGINAL));
        assert!(i.has_role(Roles::SOURCE));
        assert!(!i.has_role(Roles::CURRENT));
    }

    #[test]
    fn has_role_matches_any_of_set() {
        let i = info(2).with_roles(Roles::CURRENT);
        assert!(i.has_role(Roles::ORIGINAL | Roles::CURRENT));
    }

    #[test]
    fn roles_serde_round_trip() {
        let i = info(3).with_roles(Roles::ORIGINAL | Roles::CURRENT);
        let json = serde_json::to_string(&i).expect("serialize");
        let back: ItemInfo = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, i);
    }
}
