//! Pipeline stages for document-to-text conversion.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the engine can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ adapter ──▶ engine ──▶ sanitize ──▶ bundle
//! (path/URL)  (temp file)  (Markdown)  (plain text)  (names, ZIP)
//! ```
//!
//! 1. [`input`]: read local files, download URLs, or take stdin
//! 2. [`adapter`]: stage bytes in a temp file and call the engine
//! 3. [`engine`]: the opaque document → Markdown converter
//! 4. [`sanitize`]: ordered textual rules that strip Markdown syntax
//! 5. [`bundle`]: output file names and ZIP archives

pub mod adapter;
pub mod bundle;
pub mod engine;
pub mod input;
pub mod sanitize;
