//! navedit library crate
//!
//! Editing engine for a two-level site navigation menu: reorder items within
//! a sibling group, toggle visibility, rename, then save or discard, with every
//! reorder reported to an analytics sink.

pub mod api;
pub mod cli;
pub mod editor;
pub mod gesture;
pub mod models;
pub mod reorder;
pub mod reporter;
pub mod seed;
pub mod session;

pub use editor::{Editor, EditorConfig, EditorError};
pub use models::{GroupKey, MoveRecord, NavNode, NavTree, TreeError};
pub use reorder::{apply_drag, move_item, Drag, MoveOutcome, ReorderError};
pub use session::{Mode, SaveOutcome, Session};
