/*
[INPUT]:  Public API exports for deribit-book-stream crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod prompt;

pub use config::{Overrides, StreamConfig};
