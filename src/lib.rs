//! upload-graph - Upload planning for batched message sends
//!
//! When a batch of outgoing messages shares identical attachments (the same
//! photo sent to many recipients, a story fanned out to multiple threads),
//! uploading the payload once per message wastes bandwidth and time. This
//! crate computes the minimal set of upload operations for a batch and
//! produces correctly-ordered chains of work - compress, obtain an upload
//! location, upload, copy for reuse - that an external job-execution engine
//! can run.
//!
//! # Architecture Overview
//!
//! The crate is a pure in-process planning library. It follows a
//! plan/execute split:
//!
//! - [`UploadDependencyGraph::create`] consumes the batch inside the
//!   caller's storage transaction and produces an immutable plan. Nothing is
//!   scheduled.
//! - [`UploadDependencyGraph::consume_deferred_queue`] hands the planned
//!   [`JobChain`]s to the caller exactly once, after the transaction
//!   commits. The chains are inert data; the caller's engine runs them.
//!
//! ## Key Properties
//!
//! - **Deduplication**: attachments are grouped by [`AttachmentKey`]
//!   (content identity plus transform properties); N messages sharing a key
//!   cost one upload pipeline plus at most one copy job, never N pipelines.
//! - **Deterministic ownership**: the first message to reference a key in
//!   input order owns the upload; the rest become copy consumers with their
//!   own registered attachment records.
//! - **One-shot handoff**: the deferred queue is consumed at most once, safe
//!   under concurrent calls.
//!
//! # Core Modules
//!
//! - [`attachment`] - Attachment variants, transform properties, and the
//!   composite deduplication key
//! - [`message`] - Outgoing messages and their attachment references
//! - [`jobs`] - Job descriptors, inert chains, and the [`JobEngine`] seam
//! - [`graph`] - The dependency graph builder and one-shot queue
//! - [`core`] - Error types
//!
//! # Example
//!
//! ```rust
//! use upload_graph::{
//!     Attachment, AttachmentId, MessageId, OutgoingMessage, RegisteredAttachment,
//!     TransformProperties, UploadDependencyGraph, UuidJobEngine,
//! };
//!
//! # fn main() -> Result<(), upload_graph::GraphError> {
//! let message = OutgoingMessage {
//!     id: MessageId(1),
//!     attachments: vec![Attachment::Registered(RegisteredAttachment {
//!         id: AttachmentId(42),
//!         transform_properties: TransformProperties::default(),
//!     })],
//!     link_previews: Vec::new(),
//!     shared_contacts: Vec::new(),
//! };
//!
//! let engine = UuidJobEngine::new();
//! let graph = UploadDependencyGraph::create(std::slice::from_ref(&message), &engine, |_| {
//!     unreachable!("the attachment is already registered")
//! })?;
//!
//! // One node: the message waits on the upload of attachment 42.
//! assert_eq!(graph.dependencies_for(&message).len(), 1);
//!
//! // After the storage transaction commits, take the chains - exactly once.
//! let chains = graph.consume_deferred_queue();
//! assert_eq!(chains.len(), 1);
//! assert_eq!(chains[0].len(), 3); // compress -> obtain location -> upload
//! assert!(graph.consume_deferred_queue().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod core;
pub mod graph;
pub mod jobs;
pub mod message;

pub use crate::attachment::{
    Attachment, AttachmentId, AttachmentKey, MediaQuality, RegisteredAttachment, RemoteAttachment,
    TransformProperties, UnregisteredAttachment, VideoTrim,
};
pub use crate::core::GraphError;
pub use crate::graph::{Node, UploadDependencyGraph};
pub use crate::jobs::{Job, JobChain, JobEngine, JobId, JobKind, UuidJobEngine};
pub use crate::message::{LinkPreview, MessageId, OutgoingMessage, SharedContact};
