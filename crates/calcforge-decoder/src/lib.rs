//! calcforge patch decoder
//!
//! Recovers the JSON object a language model was asked to produce from its
//! raw reply. The engine only ever sees the decoded object.
//!
//! # Example
//!
//! ```rust
//! use calcforge_decoder::{DecoderConfig, PatchDecoder};
//!
//! let decoder = PatchDecoder::new(DecoderConfig::default());
//! let patch = decoder.decode("```json\n{\"name\": \"Ocean\"}\n```").unwrap();
//! assert_eq!(patch["name"], "Ocean");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod decoder;
mod error;

pub use decoder::{DecoderConfig, PatchDecoder, DEFAULT_MAX_BYTES};
pub use error::DecodeError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
