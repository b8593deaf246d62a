//! Attachment identity and the deduplication key.
//!
//! Attachments arrive at the planner in one of three shapes:
//!
//! - [`RegisteredAttachment`] - already recorded in attachment storage with a
//!   durable [`AttachmentId`]. Used as-is for keying.
//! - [`UnregisteredAttachment`] - described only by a content locator (URI)
//!   plus [`TransformProperties`]. Must be registered (assigned a durable id)
//!   before any upload work can reference it.
//! - [`RemoteAttachment`] - a pointer to a payload some peer already
//!   uploaded. There is no local payload to upload, so the planner rejects
//!   these outright.
//!
//! The variants form an exhaustively-matched sum type ([`Attachment`]);
//! introducing a new variant is a compile-time break at every match site
//! rather than a silent fallthrough.
//!
//! # Identity
//!
//! Two attachments with identical raw content but different transform
//! properties produce different uploaded bytes and must be uploaded
//! independently. [`AttachmentKey`] captures this: it is the composite
//! (registered id, transform properties) value with structural
//! equality/hashing, so two independently-constructed descriptions of the
//! same logical upload collapse to one map entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Durable, storage-assigned identifier for a registered attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttachmentId(pub u64);

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attachment:{}", self.0)
    }
}

/// Output quality requested for media compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaQuality {
    /// Default transcode quality.
    #[default]
    Standard,
    /// Higher-bitrate transcode, larger output.
    High,
}

/// A requested trim range for video payloads, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoTrim {
    /// Start of the retained range.
    pub start_ms: u64,
    /// End of the retained range (exclusive).
    pub end_ms: u64,
}

/// How a payload must be processed before upload.
///
/// Part of attachment identity: the same source bytes with different
/// transform properties produce different uploads and are never deduplicated
/// against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformProperties {
    /// Skip transcoding entirely and upload the payload as-is.
    pub skip_transform: bool,
    /// Requested compression quality.
    pub media_quality: MediaQuality,
    /// Optional trim range for video payloads.
    pub video_trim: Option<VideoTrim>,
}

/// An attachment tracked in storage under a durable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisteredAttachment {
    /// The storage-assigned identifier.
    pub id: AttachmentId,
    /// How the payload must be processed before upload.
    pub transform_properties: TransformProperties,
}

/// A payload not yet recorded in attachment storage.
///
/// Identified only by its content locator until the registration callback
/// assigns it a durable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnregisteredAttachment {
    /// Content locator for the local payload (e.g. a content URI).
    pub uri: String,
    /// MIME type of the payload.
    pub content_type: String,
    /// Optional display file name.
    pub file_name: Option<String>,
    /// How the payload must be processed before upload.
    pub transform_properties: TransformProperties,
}

/// A pointer to a payload that already lives on the CDN.
///
/// Received attachments are re-shared this way. They carry no local payload,
/// so they can never be planned for upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteAttachment {
    /// Location of the payload on the CDN.
    pub cdn_key: String,
    /// MIME type of the payload.
    pub content_type: String,
}

/// An attachment reference carried by an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attachment {
    /// Already recorded in attachment storage.
    Registered(RegisteredAttachment),
    /// Known only by content locator; must be registered before upload.
    Unregistered(UnregisteredAttachment),
    /// Remote pointer with no local payload. Not uploadable.
    Remote(RemoteAttachment),
}

/// Composite deduplication key: one key, one upload.
///
/// Keys are formed over *registered* attachments only; unregistered
/// attachments are registered first, then keyed by the resulting id. Equality
/// and hashing are structural, so the key works as a map key regardless of
/// how the underlying attachment objects were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttachmentKey {
    /// The registered attachment's durable id.
    pub attachment_id: AttachmentId,
    /// The transform the upload will apply.
    pub transform_properties: TransformProperties,
}

impl AttachmentKey {
    /// Build the key for a registered attachment.
    pub fn for_attachment(attachment: &RegisteredAttachment) -> Self {
        Self {
            attachment_id: attachment.id,
            transform_properties: attachment.transform_properties.clone(),
        }
    }
}
