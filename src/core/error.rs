//! Error handling for upload planning.
//!
//! The error surface here is deliberately small. Graph construction is a
//! sequence of pure, in-memory map operations; the only failure modes are:
//!
//! 1. **Programmer error**: an attachment variant that cannot be uploaded was
//!    handed to the planner ([`GraphError::UnsupportedAttachment`]). This is
//!    fatal and signals a bug upstream, not a recoverable condition.
//! 2. **Collaborator error**: the caller-supplied registration callback
//!    failed ([`GraphError::Registration`]). These are propagated
//!    transparently - the planner never wraps or suppresses them.
//!
//! There is no partial-graph state: construction either returns a fully
//! consistent graph or an error, never something in between.

use thiserror::Error;

/// The error type for upload dependency graph construction.
///
/// # Examples
///
/// ```rust,no_run
/// use upload_graph::GraphError;
///
/// fn handle_error(error: GraphError) {
///     match error {
///         GraphError::UnsupportedAttachment { description } => {
///             // A variant the planner cannot upload reached construction.
///             // This is a bug in the calling code, not a runtime condition.
///             panic!("unsupported attachment reached the upload planner: {description}");
///         }
///         GraphError::Registration(source) => {
///             eprintln!("attachment registration failed: {source}");
///         }
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum GraphError {
    /// An attachment variant that cannot be uploaded was present in the batch.
    ///
    /// Only locally-registered and not-yet-registered attachments can be
    /// planned for upload. Remote pointer attachments (already uploaded by a
    /// peer) have no local payload to compress or upload, so encountering one
    /// here means the caller built an outgoing message incorrectly.
    #[error("unsupported attachment for upload planning: {description}")]
    UnsupportedAttachment {
        /// Describes the offending attachment (e.g. its remote location).
        description: String,
    },

    /// The caller-supplied registration callback failed.
    ///
    /// Registration persists a not-yet-registered attachment and assigns it a
    /// durable id. The planner treats the callback as opaque and surfaces its
    /// error unchanged.
    #[error(transparent)]
    Registration(#[from] anyhow::Error),
}
