//! Render error types.

use std::io;

/// Error returned by [`Pipeline`](crate::Pipeline) render calls.
///
/// Parsing and sanitizing never fail and oracle failures are absorbed, so
/// the output sink is the only source of errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Writing to the output sink failed.
    #[error("Failed to write rendered page: {0}")]
    Write(#[from] io::Error),
}
