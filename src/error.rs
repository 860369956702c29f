//! Recoverable errors surfaced to the owner of a mount.
//!
//! Broken reconciler invariants are not represented here: those panic at the
//! point of detection.

use thiserror::Error;

/// Error type returned by component render functions.
pub type BoxError = Box<dyn std::error::Error>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A component's render function returned an error.
    #[error("component `{component}` failed to render with props {props}")]
    Component {
        component: String,
        props: String,
        #[source]
        source: BoxError,
    },

    /// `ContextMap::require` found no provider.
    #[error("no provider for context `{0}`")]
    MissingContext(String),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
