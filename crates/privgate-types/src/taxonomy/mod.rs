//! Taxonomy registries: permissions, purposes and libraries

mod catalog;
pub mod library;
pub mod permission;
pub mod purpose;
pub mod registry;

pub use library::{
    LibraryCategory, ThirdPartyLibrary, LIBRARY_ALL, LIBRARY_APP_INTERNAL, LIBRARY_THIRD_PARTY,
};
pub use permission::{PermissionKind, ProtectionTier, Sensitivity};
pub use purpose::{Purpose, PURPOSE_ALL};
pub use registry::{Registered, Registry, Taxonomy, TaxonomyBuilder};
