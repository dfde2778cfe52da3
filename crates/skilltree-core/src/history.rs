use crate::id::NodeKey;
use serde::{Deserialize, Serialize};

/// Nodes in the order they were unlocked, most recent last.
///
/// Used to pick eviction victims when a budget ceiling drops below current
/// usage. A node appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockHistory {
    stack: Vec<NodeKey>,
}

impl UnlockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key`. Returns false (and changes nothing) if already present.
    pub fn push(&mut self, key: NodeKey) -> bool {
        if self.stack.contains(&key) {
            return false;
        }
        self.stack.push(key);
        true
    }

    /// Remove and return the most recently unlocked node.
    pub fn pop(&mut self) -> Option<NodeKey> {
        self.stack.pop()
    }

    /// Remove `key` wherever it is. Returns whether it was present.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        match self.stack.iter().rposition(|&k| k == key) {
            Some(index) => {
                self.stack.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.stack.contains(&key)
    }

    pub fn last(&self) -> Option<NodeKey> {
        self.stack.last().copied()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.stack.iter().copied()
    }
}
