//! PrivGate Engine - decides whether an app may touch sensitive data
//!
//! A request is turned into a scope tuple (app, permission, purpose,
//! library) and resolved in two steps:
//!
//! 1. an unexpired "allow once" grant for exactly that scope answers Allow;
//! 2. otherwise the active profile's entries are searched from the most to
//!    the least specific candidate scope. No match means Ask.
//!
//! The [`RequestMediator`] turns Ask into a terminal verdict by consulting a
//! [`ConsentPrompt`] and recording the answer. Profiles are managed by the
//! [`ProfileManager`]; settings toggles use the consistency tree from
//! `privgate-tree` through [`PermissionToggles`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use privgate_engine::{AccessRequest, EngineConfig, PolicyEngine, SystemClock};
//! use privgate_store::InMemoryPolicyStore;
//! use privgate_types::Taxonomy;
//!
//! # async fn run() -> privgate_engine::Result<()> {
//! let engine = PolicyEngine::start(
//!     Arc::new(Taxonomy::standard()),
//!     Arc::new(InMemoryPolicyStore::new()),
//!     Arc::new(SystemClock),
//!     &EngineConfig::default(),
//! )
//! .await?;
//!
//! let request = AccessRequest::new("com.example.app", "CAMERA");
//! let resolution = engine.resolve(&request).await?;
//! println!("{} via {:?}", resolution.action, resolution.source);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod grants;
pub mod mediator;
pub mod packages;
pub mod profiles;
pub mod prompts;
pub mod request;
pub mod resolution;
pub mod toggles;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{PackageRemoval, PolicyEngine, RecordOutcome};
pub use error::{EngineError, Result};
pub use events::{ProfileEvent, ProfileEventBus, ProfileSubscription, SubscriberInfo};
pub use grants::{AskGrant, AskGrantCache, MAX_ASK_GRANT_TIMEFRAME};
pub use mediator::{ConsentPrompt, ConsentRequest, Mediation, RequestMediator};
pub use packages::{spawn_package_listener, PackageEvent};
pub use profiles::ProfileManager;
pub use prompts::{FixedPrompt, PendingPrompts};
pub use request::AccessRequest;
pub use resolution::{specificity_chain, Candidate, Resolution, ResolutionSource, Specificity};
pub use toggles::PermissionToggles;
