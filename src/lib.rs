//! # Snapship
//!
//! Size-bounded JPEG compression and upload for bucket-style object storage.
//! Point it at an image and a bucket: the image is scaled to a fixed width,
//! re-encoded at descending quality until it fits a byte budget, and written
//! to the store exactly once.
//!
//! # Architecture: Compress, Then Ship
//!
//! An upload is two halves with a clean seam between them:
//!
//! ```text
//! 1. Compress   source bytes  →  JPEG candidate   (CPU-bound, blocking pool)
//! 2. Ship       candidate     →  bucket path      (async, one write)
//! ```
//!
//! The seam earns its keep three ways:
//!
//! - **Testability**: the compression loop runs against a mock backend and
//!   the shipping step against a mock store, so every failure path is unit
//!   testable without sockets or image codecs.
//! - **Scheduling**: a multi-attempt encode can take seconds of CPU; it runs
//!   on a blocking worker so the async runtime stays responsive.
//! - **Honest failure semantics**: whatever fails, the caller learns which
//!   half it was — a source that would not decode, an encode that broke, or
//!   a store that said no.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The compression core: backend trait, `image`-crate backend, quality-walk loop |
//! | [`store`] | Object storage: `ObjectStore` trait + HTTP bucket client |
//! | [`picker`] | Image selection sources; cancellation is `Ok(None)`, not an error |
//! | [`keys`] | Validated bucket-relative keys + timestamp/owner-scoped derivation |
//! | [`session`] | Explicit caller credentials; nothing reads ambient global state |
//! | [`pipeline`] | `Uploader`: read → compress → single store write |
//! | [`config`] | `snapship.toml` loading and validation |
//! | [`output`] | CLI report formatting — the quality walk as readable lines |
//!
//! # Design Decisions
//!
//! ## JPEG-Only Output
//!
//! Every upload is baseline JPEG, whatever the source format. One output
//! format means one predictable content type, one size model for the budget
//! walk, and no transparency edge cases (alpha is flattened on encode).
//! Sources remain whatever the picker produces — JPEG, PNG, WebP, TIFF —
//! and are sniffed by magic bytes, never by file extension.
//!
//! ## Re-Encode From the Source, Every Attempt
//!
//! The quality walk never re-compresses its own output. Each attempt decodes
//! the original source and encodes fresh at the next quality step, so a
//! five-attempt walk carries one generation of JPEG loss, not five. The cost
//! is re-decoding the source per attempt, which is cheap next to encoding.
//!
//! ## The Budget Is a Target, the Floor Is a Promise
//!
//! Quality descends a fixed ladder (80 → 10 by default) until the candidate
//! fits the byte budget. If even the floor attempt is over budget, that
//! attempt ships anyway, flagged on the receipt. Refusing the upload would
//! turn an oversized-but-valid photo into a hard failure; the budget exists
//! to keep uploads fast, not to reject content.
//!
//! ## Explicit Sessions
//!
//! Credentials travel as a [`session::Session`] value passed to whoever
//! needs one. There is no global client and no ambient auth: a reader can
//! follow the token from `main` to the store client without leaving the call
//! graph, and tests construct sessions like any other value.
//!
//! ## Exactly One Write
//!
//! A pipeline call makes at most one store write and never retries it.
//! Retry policy belongs to callers, who know whether the key is re-derivable
//! and whether the user is still waiting.

pub mod config;
pub mod imaging;
pub mod keys;
pub mod output;
pub mod picker;
pub mod pipeline;
pub mod session;
pub mod store;
