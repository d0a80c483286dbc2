//! Arena-backed state tree

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Handle to a node owned by a [`StateTree`]
///
/// Handles are never reused: once a node is deleted its handle stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Node<S> {
    value: S,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A forest of state-bearing nodes kept consistent by propagation
#[derive(Debug, Clone)]
pub struct StateTree<S> {
    slots: Vec<Option<Node<S>>>,
    live: usize,
}

impl<S> Default for StateTree<S> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<S: Clone + PartialEq> StateTree<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detached node and return its handle
    pub fn insert(&mut self, value: S) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Node {
            value,
            parent: None,
            children: Vec::new(),
        }));
        self.live += 1;
        id
    }

    /// Add a node directly under `parent`
    ///
    /// Returns `None` if `parent` is not in the tree.
    pub fn insert_child(&mut self, parent: NodeId, value: S) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let child = self.insert(value);
        self.add_child(parent, child);
        Some(child)
    }

    /// Attach `child` (with its subtree) as the last child of `parent`
    ///
    /// A node has at most one parent: attaching a node that already has one
    /// moves it. Attaching a node under itself or under one of its own
    /// descendants is refused, as are dead handles; both return `false`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if parent == child || self.is_ancestor(child, parent) {
            return false;
        }

        self.unlink(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Detach the first node below `from` whose value equals `target`
    ///
    /// The search is breadth-first over `from`'s descendants and compares
    /// values, not identity: the first value-equal node wins even if the
    /// caller meant another. Use [`StateTree::detach`] to remove a specific
    /// node. The detached subtree stays in the arena as its own root.
    /// Returns the detached node, or `None` when nothing matched.
    pub fn remove_subtree(&mut self, from: NodeId, target: &S) -> Option<NodeId> {
        let found = self
            .descendants(from)
            .into_iter()
            .find(|&id| self.value(id) == Some(target))?;
        self.unlink(found);
        Some(found)
    }

    /// Detach `node` from its parent by identity
    ///
    /// Returns `false` if the node is dead or already a root.
    pub fn detach(&mut self, node: NodeId) -> bool {
        match self.parent(node) {
            Some(_) => {
                self.unlink(node);
                true
            }
            None => false,
        }
    }

    /// Remove `node` and its whole subtree from the arena
    ///
    /// Returns the number of nodes freed; their handles become dead.
    pub fn delete(&mut self, node: NodeId) -> usize {
        if !self.contains(node) {
            return 0;
        }
        self.unlink(node);
        let mut doomed = vec![node];
        doomed.extend(self.descendants(node));
        for id in &doomed {
            self.slots[id.0] = None;
        }
        self.live -= doomed.len();
        doomed.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    pub fn value(&self, node: NodeId) -> Option<&S> {
        self.node(node).map(|n| &n.value)
    }

    /// Overwrite one node without propagating; returns the previous value
    ///
    /// For resetting nodes from an outside source of truth. Neighbours are
    /// left as they are.
    pub fn replace_value(&mut self, node: NodeId, value: S) -> Option<S> {
        self.node_mut(node)
            .map(|n| std::mem::replace(&mut n.value, value))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    /// Children in insertion order; empty for dead handles
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Every node below `node`, breadth-first
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<NodeId> = self.children(node).iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            out.push(id);
            queue.extend(self.children(id).iter().copied());
        }
        out
    }

    /// Live nodes in the arena
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Apply `value` to `node` and bring the rest of the tree in line
    ///
    /// Downward: every descendant of `node` takes `value`. Upward: while
    /// every adjacent pair in the parent's child list is equal, the parent
    /// takes `value`, any of its descendants that still differ are
    /// overwritten, and the walk continues one level higher. A dead handle
    /// is ignored.
    pub fn propagate_state_change(&mut self, node: NodeId, value: S) {
        if !self.contains(node) {
            tracing::trace!(node = %node, "Propagation from dead node ignored");
            return;
        }
        self.set_value(node, value.clone());
        self.overwrite_descendants(node, &value);
        self.propagate_up(node, &value);
    }

    fn propagate_up(&mut self, node: NodeId, value: &S) {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            if !self.children_agree(parent) {
                break;
            }
            self.set_value(parent, value.clone());
            self.reconcile_down(parent, value);
            current = parent;
        }
    }

    /// Adjacent-pair comparison; a single child trivially agrees
    fn children_agree(&self, parent: NodeId) -> bool {
        self.children(parent)
            .windows(2)
            .all(|pair| self.value(pair[0]) == self.value(pair[1]))
    }

    /// Push `value` into every subtree under `root` whose top differs
    fn reconcile_down(&mut self, root: NodeId, value: &S) {
        let mut stack: Vec<NodeId> = self.children(root).to_vec();
        while let Some(id) = stack.pop() {
            if self.value(id) != Some(value) {
                self.set_value(id, value.clone());
                self.overwrite_descendants(id, value);
            } else {
                stack.extend(self.children(id).iter().copied());
            }
        }
    }

    fn overwrite_descendants(&mut self, node: NodeId, value: &S) {
        for id in self.descendants(node) {
            self.set_value(id, value.clone());
        }
    }

    fn set_value(&mut self, node: NodeId, value: S) {
        if let Some(n) = self.node_mut(node) {
            n.value = value;
        }
    }

    /// Whether `ancestor` lies on the parent chain of `node`
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.node_mut(node) {
            n.parent = None;
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node<S>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<S>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }
}
