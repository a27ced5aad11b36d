//! Reorder engine
//!
//! Moves a single element within one sibling group. Indices are positions in
//! the group at the time of the move; the destination index is read against the
//! group with the moved element already removed, which matches dropping an item
//! "before what is now at position N".

use serde::{Deserialize, Serialize};

use crate::models::{GroupKey, MoveRecord, NavTree};

/// Contract violations by the caller. These are integration bugs, never
/// something to retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    #[error("cannot move between sibling groups '{from_group}' and '{to_group}'")]
    CrossGroup {
        from_group: GroupKey,
        to_group: GroupKey,
    },

    #[error("index {index} is out of range for group '{group}' of length {len}")]
    IndexOutOfRange {
        group: GroupKey,
        index: usize,
        len: usize,
    },
}

/// A completed drag as reported by the gesture layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drag {
    pub source: GroupKey,
    pub destination: GroupKey,
    pub from: usize,
    pub to: usize,
}

/// Result of a move: the new tree plus a record when anything changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub tree: NavTree,
    pub record: Option<MoveRecord>,
}

impl MoveOutcome {
    fn unchanged(tree: &NavTree) -> Self {
        Self {
            tree: tree.clone(),
            record: None,
        }
    }

    pub fn changed(&self) -> bool {
        self.record.is_some()
    }
}

/// Relocates the element at `from` to `to` within `group`.
///
/// Equal indices, an unknown parent, or a leaf parent all yield an unchanged
/// tree with no record. Out-of-range indices are rejected.
pub fn move_item(
    tree: &NavTree,
    group: &GroupKey,
    from: usize,
    to: usize,
) -> Result<MoveOutcome, ReorderError> {
    if from == to {
        return Ok(MoveOutcome::unchanged(tree));
    }

    let Some(siblings) = tree.sibling_group(group) else {
        return Ok(MoveOutcome::unchanged(tree));
    };

    let len = siblings.len();
    for index in [from, to] {
        if index >= len {
            return Err(ReorderError::IndexOutOfRange {
                group: group.clone(),
                index,
                len,
            });
        }
    }

    let mut reordered = siblings.to_vec();
    let moved = reordered.remove(from);
    let record = MoveRecord {
        item_id: moved.id().to_string(),
        from_index: from,
        to_index: to,
    };
    reordered.insert(to, moved);

    Ok(MoveOutcome {
        tree: tree.replace_sibling_group(group, reordered),
        record: Some(record),
    })
}

/// Applies a drag, rejecting it outright when it crosses sibling groups
pub fn apply_drag(tree: &NavTree, drag: &Drag) -> Result<MoveOutcome, ReorderError> {
    if drag.source != drag.destination {
        return Err(ReorderError::CrossGroup {
            from_group: drag.source.clone(),
            to_group: drag.destination.clone(),
        });
    }
    move_item(tree, &drag.source, drag.from, drag.to)
}
