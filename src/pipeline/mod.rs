//! Pipeline stages for URL-to-PDF merging.
//!
//! Each submodule implements exactly one step. Only `classify` and `fetch`
//! touch the network, and both do so through the [`fetch::RemoteSource`]
//! trait.
//!
//! ## Data Flow
//!
//! ```text
//! classify ──▶ fetch ──▶ append (PDF)   ──▶ document
//! (ext/HEAD)  (GET ×N)   render (image)      (lopdf save)
//!                          └─ encode
//! ```
//!
//! 1. [`classify`]: decide PDF vs image from the extension, else a HEAD probe
//! 2. [`fetch`]: download every item concurrently; first failure aborts
//! 3. [`append`]: copy every page of a source PDF into the output
//! 4. [`render`]: put one image on its own page, or a placeholder page
//! 5. [`encode`]: JPEG header parsing, PNG decoding, JPEG re-encoding
//! 6. [`document`]: the output page tree and final serialisation
//!
//! Steps 3–6 are CPU-bound and run inside `spawn_blocking`.

pub mod append;
pub mod classify;
pub mod document;
pub mod encode;
pub mod fetch;
pub mod render;
