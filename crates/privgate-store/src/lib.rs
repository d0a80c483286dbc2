//! PrivGate Store - the policy store boundary
//!
//! The on-device relational store is an external collaborator. This crate
//! defines the async interface the engine talks to ([`PolicyStore`]) and an
//! in-memory backend for development and tests. Persistent backends
//! implement the same traits.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::InMemoryPolicyStore;
pub use traits::{EntryStorage, PolicyStore, ProfileStorage};
