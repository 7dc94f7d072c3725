//! The linear edit history an editing session accumulates.
//!
//! An [`EditHistory`] is the flat, ordered record the editor hands to the
//! graph builder and the version policy: entry 0 is the starting state, and
//! every later entry carries the action that produced it. Entries may also
//! refer to files on disk whose pixel content equals the state after that
//! step — the starting file, stored intermediates, and the current result.
//!
//! Two histories matter to the version policy on save:
//! the *resolved initial* history (entries whose referred files were found
//! in the collection when the file was opened) and the *current* history
//! (initial plus everything applied this session).

use serde::{Deserialize, Serialize};

use crate::action::FilterAction;
use crate::item::{ItemInfo, Roles};

/// One step of the linear history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The action that produced this state. `None` only for the starting
    /// entry of a well-formed history.
    pub action: Option<FilterAction>,
    /// Files whose pixel content equals the state after this step.
    /// Empty for steps that were never written to disk.
    #[serde(default)]
    pub referred: Vec<ItemInfo>,
}

/// Ordered sequence of history entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditHistory {
    entries: Vec<HistoryEntry>,
}

impl EditHistory {
    /// An empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History built from the given entries, in order.
    #[must_use]
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The action recorded at `step`, if the entry exists and carries one.
    #[must_use]
    pub fn action(&self, step: usize) -> Option<&FilterAction> {
        self.entries.get(step).and_then(|e| e.action.as_ref())
    }

    /// `true` if any entry refers to a file carrying one of `roles`.
    #[must_use]
    pub fn has_referred_of_role(&self, roles: Roles) -> bool {
        self.entries
            .iter()
            .flat_map(|e| &e.referred)
            .any(|info| info.has_role(roles))
    }

    /// All referred infos carrying one of `roles`, in history order.
    #[must_use]
    pub fn referred_of_role(&self, roles: Roles) -> Vec<&ItemInfo> {
        self.entries
            .iter()
            .flat_map(|e| &e.referred)
            .filter(|info| info.has_role(roles))
            .collect()
    }

    /// Append an entry produced by `action`, with no referred files yet.
    pub fn push_action(&mut self, action: FilterAction) {
        self.entries.push(HistoryEntry {
            action: Some(action),
            referred: Vec::new(),
        });
    }

    /// Append a starting entry (no action) referring to `info`.
    pub fn push_start(&mut self, info: ItemInfo) {
        self.entries.push(HistoryEntry {
            action: None,
            referred: vec![info],
        });
    }

    /// Attach `info` to the most recent entry.
    ///
    /// No-op on an empty history; the caller is responsible for recording
    /// the starting entry first.
    pub fn push_referred(&mut self, info: ItemInfo) {
        if let Some(last) = self.entries.last_mut() {
            last.referred.push(info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FilterCategory;
    use chrono::{TimeZone, Utc};

    fn info(id: i64, roles: Roles) -> ItemInfo {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).single().expect("valid ts");
        ItemInfo::new(id, ts, format!("grp-{id}")).with_roles(roles)
    }

    fn action(id: &str) -> FilterAction {
        FilterAction::new(id, 1, FilterCategory::Reproducible)
    }

    #[test]
    fn empty_history_answers_queries() {
        let history = EditHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.action(0), None);
        assert!(!history.has_referred_of_role(Roles::ORIGINAL));
        assert!(history.referred_of_role(Roles::all()).is_empty());
    }

    #[test]
    fn action_indexing_matches_entry_order() {
        let mut history = EditHistory::new();
        history.push_start(info(1, Roles::ORIGINAL));
        history.push_action(action("bcg:adjust"));
        history.push_action(action("crop:apply"));

        assert_eq!(history.len(), 3);
        assert_eq!(history.action(0), None);
        assert_eq!(history.action(1).map(|a| a.identifier.as_str()), Some("bcg:adjust"));
        assert_eq!(history.action(2).map(|a| a.identifier.as_str()), Some("crop:apply"));
        assert_eq!(history.action(3), None);
    }

    #[test]
    fn referred_roles_are_found_across_entries() {
        let mut history = EditHistory::new();
        history.push_start(info(1, Roles::ORIGINAL));
        history.push_action(action("bcg:adjust"));
        history.push_referred(info(2, Roles::INTERMEDIATE));
        history.push_action(action("crop:apply"));
        history.push_referred(info(3, Roles::CURRENT));

        assert!(history.has_referred_of_role(Roles::ORIGINAL));
        assert!(history.has_referred_of_role(Roles::INTERMEDIATE));
        assert!(history.has_referred_of_role(Roles::ORIGINAL | Roles::INTERMEDIATE));
        assert!(!history.has_referred_of_role(Roles::SOURCE));

        let currents = history.referred_of_role(Roles::CURRENT);
        assert_eq!(currents.len(), 1);
        assert_eq!(currents[0].id, 3);
    }

    #[test]
    fn push_referred_on_empty_history_is_noop() {
        let mut history = EditHistory::new();
        history.push_referred(info(1, Roles::CURRENT));
        assert!(history.is_empty());
    }

    #[test]
    fn serde_round_trip() {
        let mut history = EditHistory::new();
        history.push_start(info(1, Roles::ORIGINAL));
        history.push_action(action("bcg:adjust"));
        let json = serde_json::to_string(&history).expect("serialize");
        let back: EditHistory = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, history);
    }
}
