//! Seed navigation
//!
//! The fixed tree used when the backing service cannot be reached, and by the
//! reference server when started with `--seed`.

use lazy_static::lazy_static;

use crate::models::{NavNode, NavTree};

lazy_static! {
    static ref SEED_TREE: NavTree = NavTree::new(vec![
        NavNode::leaf("1", "Dashboard", "/"),
        NavNode::parent(
            "2",
            "Job Applications",
            "/applications",
            vec![
                NavNode::leaf("2-1", "John Doe", "/applications/john-doe"),
                NavNode::leaf("2-2", "James Bond", "/applications/james-bond").hidden(),
            ],
        ),
        NavNode::leaf("3", "Settings", "/settings"),
    ]);
}

/// Returns a fresh copy of the seed tree
pub fn seed_tree() -> NavTree {
    SEED_TREE.clone()
}
