//! Outgoing messages and their attachment references.
//!
//! A message can reference attachments from three places: its direct
//! attachment list, link-preview thumbnails, and shared-contact avatars. The
//! planner treats all three uniformly via [`OutgoingMessage::all_attachments`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attachment::Attachment;

/// Caller-assigned identifier for an outgoing message.
///
/// The dependency map produced by the graph is keyed by this id, so ids must
/// be unique within one batch. The planner assigns no meaning to the value
/// beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message:{}", self.0)
    }
}

/// A link preview attached to a message. The thumbnail, when present, is an
/// attachment like any other and participates in upload planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPreview {
    /// The previewed URL.
    pub url: String,
    /// Preview title.
    pub title: String,
    /// Optional thumbnail image.
    pub thumbnail: Option<Attachment>,
}

/// A shared contact card. The avatar, when present, participates in upload
/// planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContact {
    /// Contact display name.
    pub name: String,
    /// Optional avatar image.
    pub avatar: Option<Attachment>,
}

/// One message to be sent, with every attachment reference it carries.
///
/// The planner does not own or mutate messages; it reads their attachment
/// references to decide what upload work is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Unique id within the batch.
    pub id: MessageId,
    /// Direct attachments.
    pub attachments: Vec<Attachment>,
    /// Link previews, whose thumbnails may need uploading.
    pub link_previews: Vec<LinkPreview>,
    /// Shared contacts, whose avatars may need uploading.
    pub shared_contacts: Vec<SharedContact>,
}

impl OutgoingMessage {
    /// Create a message with no attachments.
    pub fn new(id: MessageId) -> Self {
        Self {
            id,
            attachments: Vec::new(),
            link_previews: Vec::new(),
            shared_contacts: Vec::new(),
        }
    }

    /// Every attachment reference this message carries, in a fixed order:
    /// direct attachments, then link-preview thumbnails, then contact
    /// avatars.
    pub fn all_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .chain(self.link_previews.iter().filter_map(|preview| preview.thumbnail.as_ref()))
            .chain(self.shared_contacts.iter().filter_map(|contact| contact.avatar.as_ref()))
    }
}
