// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # Echoprint
//!
//! Acoustic fingerprint code generation compatible with Echoprint codegen 4.12.
//!
//! ## Overview
//!
//! The crate turns mono 16-bit PCM at 11025 Hz into a compact code string that
//! can be matched against an Echoprint database. The pipeline is:
//!
//! 1. **Whitening** ([`whitening`]): adaptive 40th-order linear prediction
//!    removes the spectral envelope of the signal
//! 2. **Subband analysis** ([`subband`]): an 8-band pseudo-QMF filter bank
//!    produces band energies every 8 samples
//! 3. **Fingerprinting** ([`fingerprint`]): an adaptive onset detector runs in
//!    every band, and the intervals between nearby onsets are hashed into
//!    20-bit codes tagged with their onset time
//! 4. **Encoding** ([`encoder`]): codes are written as hex text, zlib
//!    compressed and base64 encoded
//!
//! Every numeric step reproduces Echoprint codegen 4.12 bit for bit, so code
//! strings are interchangeable with those of other Echoprint implementations.
//!
//! ## Quick Start
//!
//! ```rust
//! use echoprint::{Codegen, decode_code_string};
//! use echoprint::utils::generation::{pluck_train, to_pcm};
//! use std::time::Duration;
//!
//! // Fifteen seconds of plucks every 700 ms.
//! let onsets: Vec<Duration> = (0..20).map(|i| Duration::from_millis(300 + 700 * i)).collect();
//! let pcm = to_pcm(&pluck_train(&onsets, Duration::from_secs(15), 0.8));
//!
//! let output = Codegen::default().generate(&pcm)?;
//! println!("{} codes: {}", output.num_codes(), output.code_string);
//!
//! let decoded = decode_code_string(&output.code_string)?;
//! if !output.code_string.is_empty() {
//!     assert_eq!(decoded, output.codes);
//! }
//! # Ok::<(), echoprint::EchoprintError>(())
//! ```
//!
//! Audio in other layouts can be handed to
//! [`Codegen::generate_with_format`], which first applies the fixed
//! nearest-sample resampler of [`resampling`].
//!
//! ## Error Handling
//!
//! The numeric pipeline never fails: silent, short or otherwise degenerate
//! input yields an empty code string. Errors ([`EchoprintError`]) come from
//! unsupported PCM layouts, invalid configuration and malformed code strings.
//!
//! ## Features
//!
//! - `parallel-processing`: evaluates subband frames on the `rayon` thread
//!   pool (results are identical to the sequential path)
//! - `random-generation` (default): noise generator in [`utils::generation`]
//!
//! ## Logging
//!
//! Pipeline stages emit `tracing` events (`debug` per stage, `trace` per
//! whitening block). The crate never installs a subscriber.

pub mod codegen;
pub mod conversions;
pub mod encoder;
mod error;
pub mod fingerprint;
pub mod resampling;
pub mod subband;
mod types;
pub mod utils;
pub mod whitening;

pub use codegen::{Codegen, CodegenOutput, ECHOPRINT_VERSION};
pub use encoder::{decode_code_string, encode_codes};
pub use error::{EchoprintError, EchoprintResult};
pub use fingerprint::FpCode;
pub use resampling::PcmFormat;
pub use types::{CodegenConfig, MAX_TIMELINE_SECS, PairEmission};

/// Operating sample rate in Hz. All inputs are fingerprinted at this rate.
pub const SAMPLE_RATE: u32 = 11025;
