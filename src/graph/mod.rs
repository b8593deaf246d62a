//! The upload dependency graph: plan the minimum upload work for a batch.
//!
//! Given a batch of outgoing messages that may share identical attachments
//! (the same photo sent to many recipients, a story fanned out to several
//! threads), [`UploadDependencyGraph::create`] computes the minimal set of
//! upload operations and the ordered job chains that perform them:
//!
//! 1. **Group** every attachment reference by [`AttachmentKey`] - content
//!    identity plus transform properties. Not-yet-registered attachments are
//!    registered through the caller's callback first, cached per unique
//!    (locator, transform) pair so each distinct payload is registered at
//!    most once per build.
//! 2. **Build one chain per key**: compress -> obtain upload location ->
//!    upload. The first message to reference the key (in input order) is the
//!    upload owner; every other message sharing the key becomes a copy
//!    consumer, served by a single copy job appended after the upload step.
//!    N messages sharing a key cost 3 jobs (N = 1) or 4 jobs (N > 1), never
//!    3·N.
//! 3. **Record dependencies**: each message gets one [`Node`] per distinct
//!    key it references - the job it must wait for and the registered
//!    attachment id it should ultimately point at.
//!
//! Construction runs single-threaded, typically inside a storage
//! transaction, and schedules nothing. The produced chains sit in a deferred
//! queue until [`UploadDependencyGraph::consume_deferred_queue`] hands them
//! over - exactly once, even under concurrent calls - after the caller's
//! transaction commits.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::mem;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::attachment::{
    Attachment, AttachmentId, AttachmentKey, RegisteredAttachment, TransformProperties,
};
use crate::core::GraphError;
use crate::jobs::{JobChain, JobEngine, JobId};
use crate::message::{MessageId, OutgoingMessage};

/// One message's dependency on one uploaded attachment: the job that must
/// complete and the registered attachment the message should reference once
/// it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Id of the terminal job for this attachment (upload for the owner,
    /// copy for copy consumers).
    pub job_id: JobId,
    /// The registered attachment id this message ends up referencing.
    pub attachment_id: AttachmentId,
}

/// Messages sharing one attachment key, in first-reference order. The first
/// entry is the upload owner.
struct KeyGroup {
    attachment: RegisteredAttachment,
    messages: Vec<MessageId>,
}

/// Registration results cached for the duration of one build, keyed by
/// (content locator, transform properties).
type RegistrationCache = HashMap<(String, TransformProperties), RegisteredAttachment>;

/// The planned upload work for one batch of outgoing messages.
///
/// Immutable after construction except for the deferred-queue consumption
/// flag, so it may be read from multiple threads without locking.
#[derive(Debug)]
pub struct UploadDependencyGraph {
    dependency_map: HashMap<MessageId, Vec<Node>>,
    deferred_queue: Mutex<Vec<JobChain>>,
    consumed: AtomicBool,
}

impl UploadDependencyGraph {
    /// The empty graph: no dependencies, an already-exhausted queue.
    ///
    /// For callers with nothing to upload, so call sites need no
    /// null/optional special case.
    pub fn empty() -> Self {
        Self {
            dependency_map: HashMap::new(),
            deferred_queue: Mutex::new(Vec::new()),
            consumed: AtomicBool::new(true),
        }
    }

    /// Plan the upload work for `messages`.
    ///
    /// `engine` is used only to create job descriptors, never to schedule
    /// them. `register_attachment` persists a not-yet-registered attachment
    /// and returns its durable form; it is called at most once per unique
    /// (locator, transform) pair during grouping, plus once per copy
    /// consumer to mint the consumer's own attachment record.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnsupportedAttachment`] if the batch contains an
    /// attachment variant that cannot be uploaded (a programmer error
    /// upstream), or [`GraphError::Registration`] carrying the callback's
    /// own error unchanged. On error no graph is returned; there is no
    /// partially-built state.
    pub fn create<E, R>(
        messages: &[OutgoingMessage],
        engine: &E,
        mut register_attachment: R,
    ) -> Result<Self, GraphError>
    where
        E: JobEngine + ?Sized,
        R: FnMut(&Attachment) -> anyhow::Result<RegisteredAttachment>,
    {
        debug!(messages = messages.len(), "building upload dependency graph");

        let (key_order, groups) = group_by_key(messages, &mut register_attachment)?;
        debug!(distinct_keys = key_order.len(), "grouped attachments by upload key");

        let mut dependency_map: HashMap<MessageId, Vec<Node>> = HashMap::new();
        let mut chains: Vec<JobChain> = Vec::with_capacity(key_order.len());

        for key in &key_order {
            let group = &groups[key];
            let attachment = &group.attachment;

            // Owner chain: compress -> obtain upload location -> upload.
            let upload = engine.upload_job(attachment);
            let upload_id = upload.id.clone();
            let mut chain = JobChain::start(engine.compression_job(attachment))
                .then(engine.upload_spec_job(attachment))
                .then(upload);

            let owner = group.messages[0];
            dependency_map.entry(owner).or_default().push(Node {
                job_id: upload_id.clone(),
                attachment_id: attachment.id,
            });

            let consumers = &group.messages[1..];
            if !consumers.is_empty() {
                // Each copy consumer gets its own attachment record; copies
                // are never deduplicated against each other.
                let source = Attachment::Registered(attachment.clone());
                let mut destinations = Vec::with_capacity(consumers.len());
                for _ in consumers {
                    destinations.push(register_attachment(&source)?.id);
                }

                let copy = engine.copy_job(attachment.id, destinations.clone());
                let copy_id = copy.id.clone();
                chain = chain.then(copy);

                for (consumer, destination) in consumers.iter().zip(destinations) {
                    dependency_map.entry(*consumer).or_default().push(Node {
                        job_id: copy_id.clone(),
                        attachment_id: destination,
                    });
                }
            }

            trace!(
                key = %attachment.id,
                owner = %owner,
                copy_consumers = consumers.len(),
                jobs = chain.len(),
                "built upload chain"
            );
            chains.push(chain);
        }

        debug!(chains = chains.len(), "upload dependency graph complete");
        Ok(Self {
            dependency_map,
            deferred_queue: Mutex::new(chains),
            consumed: AtomicBool::new(false),
        })
    }

    /// The full dependency map, keyed by message id. Messages with no
    /// attachments have no entry.
    pub fn dependency_map(&self) -> &HashMap<MessageId, Vec<Node>> {
        &self.dependency_map
    }

    /// The nodes `message` depends on: one per distinct attachment key it
    /// references. Empty for messages with no attachments.
    pub fn dependencies_for(&self, message: &OutgoingMessage) -> &[Node] {
        self.dependency_map.get(&message.id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of the jobs `message` must wait for, for declaring run-after
    /// dependencies on the eventual send job.
    pub fn job_dependency_ids(&self, message: &OutgoingMessage) -> Vec<JobId> {
        self.dependencies_for(message).iter().map(|node| node.job_id.clone()).collect()
    }

    /// The registered attachment ids `message` should reference once its
    /// upload work completes.
    pub fn attachment_ids(&self, message: &OutgoingMessage) -> Vec<AttachmentId> {
        self.dependencies_for(message).iter().map(|node| node.attachment_id).collect()
    }

    /// Whether the graph plans no work at all.
    pub fn is_empty(&self) -> bool {
        self.dependency_map.is_empty()
    }

    /// Take the deferred job chains, exactly once.
    ///
    /// The first call returns every chain the build produced; every later
    /// call returns an empty list, including under concurrent invocation.
    /// Callers may invoke this speculatively from more than one place; a
    /// chain is never delivered twice and never lost.
    pub fn consume_deferred_queue(&self) -> Vec<JobChain> {
        // Fast path: already taken, skip the lock.
        if self.consumed.load(Ordering::Acquire) {
            return Vec::new();
        }

        let mut queue = self.deferred_queue.lock().unwrap_or_else(PoisonError::into_inner);
        // Authoritative check under the lock: exactly one caller wins.
        if self.consumed.swap(true, Ordering::AcqRel) {
            return Vec::new();
        }

        debug!(chains = queue.len(), "handing deferred job chains to the caller");
        mem::take(&mut *queue)
    }
}

/// Group every attachment reference in the batch by its upload key.
///
/// Returns the keys in first-seen order (which fixes upload-owner selection
/// and chain order deterministically for a given input order) alongside the
/// groups themselves.
fn group_by_key<R>(
    messages: &[OutgoingMessage],
    register_attachment: &mut R,
) -> Result<(Vec<AttachmentKey>, HashMap<AttachmentKey, KeyGroup>), GraphError>
where
    R: FnMut(&Attachment) -> anyhow::Result<RegisteredAttachment>,
{
    let mut key_order: Vec<AttachmentKey> = Vec::new();
    let mut groups: HashMap<AttachmentKey, KeyGroup> = HashMap::new();
    let mut cache = RegistrationCache::new();

    for message in messages {
        for attachment in message.all_attachments() {
            let registered = match attachment {
                Attachment::Registered(registered) => registered.clone(),
                Attachment::Unregistered(unregistered) => {
                    let cache_key =
                        (unregistered.uri.clone(), unregistered.transform_properties.clone());
                    match cache.get(&cache_key) {
                        Some(registered) => registered.clone(),
                        None => {
                            let registered = register_attachment(attachment)?;
                            cache.insert(cache_key, registered.clone());
                            registered
                        }
                    }
                }
                Attachment::Remote(remote) => {
                    return Err(GraphError::UnsupportedAttachment {
                        description: format!("remote pointer at cdn key {}", remote.cdn_key),
                    });
                }
            };

            let key = AttachmentKey::for_attachment(&registered);
            match groups.entry(key) {
                Entry::Occupied(mut entry) => {
                    let group = entry.get_mut();
                    // The same message may reference one key several times
                    // (e.g. as a direct attachment and a preview thumbnail);
                    // it still depends on it only once.
                    if !group.messages.contains(&message.id) {
                        group.messages.push(message.id);
                    }
                }
                Entry::Vacant(entry) => {
                    key_order.push(entry.key().clone());
                    entry.insert(KeyGroup {
                        attachment: registered,
                        messages: vec![message.id],
                    });
                }
            }
        }
    }

    Ok((key_order, groups))
}
