//! PrivGate Tree - consistency propagation for scope hierarchies
//!
//! A policy scope is often shown as a hierarchy of coarse-to-fine controls:
//! a device-wide toggle, a category toggle, one toggle per app. Editing any
//! one of them must leave the others consistent without re-reading the
//! whole hierarchy from storage. [`StateTree`] does that for any value type
//! with `Clone + PartialEq`.
//!
//! ## Ownership
//!
//! The tree owns every node in an arena and hands out [`NodeId`] handles.
//! Nodes refer to their parent and children by handle, so there are no
//! reference cycles and no interior mutability.
//!
//! ## Propagation
//!
//! [`StateTree::propagate_state_change`] applies a new value to one node and
//! then:
//!
//! - overwrites every descendant with it (a direct edit wins over the whole
//!   subtree below it);
//! - walks upward while the parent's children all agree, setting each such
//!   parent to the new value and pushing it into any of that parent's
//!   descendants that still differ.
//!
//! ## Threading
//!
//! There is no internal synchronization. All methods that change the tree
//! take `&mut self`; callers owning a tree from several threads must wrap it
//! themselves.
//!
//! ## Example
//!
//! ```rust
//! use privgate_tree::StateTree;
//!
//! let mut tree = StateTree::new();
//! let device = tree.insert(false);
//! let camera = tree.insert_child(device, false).unwrap();
//! let app = tree.insert_child(camera, false).unwrap();
//!
//! // The only app is switched on; the single-child chain promotes upward.
//! tree.propagate_state_change(app, true);
//! assert_eq!(tree.value(device), Some(&true));
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod tree;

pub use tree::{NodeId, StateTree};
