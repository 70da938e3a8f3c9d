//! [`TreePair`]: a source and a replica tree side by side.

use crate::tree::TestTree;

/// Source and replica roots in two separate temporary directories, plus a
/// scratch directory for log files.
pub struct TreePair {
    pub source: TestTree,
    pub replica: TestTree,
    pub scratch: TestTree,
}

impl Default for TreePair {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePair {
    pub fn new() -> Self {
        Self {
            source: TestTree::new(),
            replica: TestTree::new(),
            scratch: TestTree::new(),
        }
    }

    /// Panic unless both trees hold the same entries with the same content.
    pub fn assert_converged(&self) {
        assert_eq!(
            self.source.snapshot(),
            self.replica.snapshot(),
            "replica does not mirror source"
        );
    }
}
