//! PrivGate Types - vocabulary shared by every PrivGate crate
//!
//! - **Taxonomy**: immutable registries of permissions, purposes and
//!   libraries, built once and shared by reference
//! - **Scope**: the (app, permission, purpose, library) tuple a policy
//!   decision applies to
//! - **PolicyEntry / Profile**: the records a policy store persists
//! - **ProfileTemplate**: canonical bundles installed as new profiles
//! - **Action / Verdict / UserChoice**: decision vocabulary

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod action;
pub mod entry;
pub mod error;
pub mod scope;
pub mod taxonomy;
pub mod template;

pub use action::{Action, Durability, UserChoice, Verdict};
pub use entry::{entry_key, PolicyEntry, Profile, PROFILE_KEY_SEPARATOR};
pub use error::{PolicyError, Result, TaxonomyKind};
pub use scope::{AppTarget, Scope, ScopeDraft, APP_ALL, SCOPE_KEY_SEPARATOR};
pub use taxonomy::{
    LibraryCategory, PermissionKind, ProtectionTier, Purpose, Sensitivity, Taxonomy,
    TaxonomyBuilder, ThirdPartyLibrary,
};
pub use template::{ProfileTemplate, TemplateRule};
