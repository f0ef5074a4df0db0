//! calcforge configuration inheritance and validation engine
//!
//! Merges an AI-proposed patch into the calculator descriptor a user already
//! has, without destroying protected payloads (usually images) and without
//! producing a structurally broken calculator.
//!
//! # Pipeline
//!
//! ```text
//! patch → normalize → strip protected → merge(base) → sanitize
//!       → ensure companions → reassert protected → Outcome
//! ```
//!
//! Every stage is a pure function and is exported for testing. The engine
//! performs no I/O and keeps no state between calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use calcforge_engine::{CustomizeRequest, Engine, EngineConfig, ProtectionSpec};
//!
//! let engine = Engine::new(EngineConfig::default());
//! let request = CustomizeRequest::new(Some(current), patch)
//!     .with_protection(ProtectionSpec::explicit(["appBackground.backgroundImageUrl"]));
//! let outcome = engine.customize(&request)?;
//! for diagnostic in &outcome.diagnostics {
//!     println!("{diagnostic}");
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod companion;
mod config;
mod diagnostics;
mod engine;
mod error;
mod merge;
mod normalize;
mod protect;
mod sanitize;

pub use companion::{ensure_companions, EXECUTE_ID, SEPARATOR_ID};
pub use config::{ConfigError, EngineConfig, GridBounds, ProtectionDefaults};
pub use diagnostics::{Diagnostic, Diagnostics, DropReason, RepairedField};
pub use engine::{CustomizeRequest, Engine, Outcome};
pub use error::{json_kind, EngineError, EngineResult};
pub use merge::{is_placeholder, merge};
pub use normalize::normalize;
pub use protect::{ProtectionSet, ProtectionSpec};
pub use sanitize::{Sanitized, Sanitizer, GENERATED_ID_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
