//! Job descriptors, inert job chains, and the execution-engine seam.
//!
//! The planner never runs anything. It composes the four primitives the
//! external job engine offers - compress, obtain an upload location, upload,
//! copy - into ordered [`JobChain`]s and hands them back as plain data. The
//! caller schedules them with its own engine after its storage transaction
//! commits; enqueueing work while a transaction is open is unsafe, so chains
//! stay inert until that explicit handoff.
//!
//! [`JobEngine`] is the seam: graph construction asks it for job descriptors
//! and records the stable [`JobId`]s it returns. [`UuidJobEngine`] is the
//! stock implementation, producing uuid-v4 ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::attachment::{AttachmentId, RegisteredAttachment};

/// Stable identifier for one job within a chain.
///
/// Other jobs (e.g. the eventual send job) reference these ids to declare
/// run-after dependencies in the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Wrap an engine-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a job does when the execution engine runs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobKind {
    /// Transcode the payload according to its transform properties.
    Compress {
        /// The registered attachment to compress.
        attachment_id: AttachmentId,
    },
    /// Obtain a resumable upload location from the service.
    ObtainUploadSpec {
        /// The registered attachment the location is for.
        attachment_id: AttachmentId,
    },
    /// Upload the compressed payload.
    Upload {
        /// The registered attachment to upload.
        attachment_id: AttachmentId,
    },
    /// Fan an uploaded payload out to other attachment records.
    Copy {
        /// The uploaded source attachment.
        source: AttachmentId,
        /// One destination record per copy consumer.
        destinations: Vec<AttachmentId>,
    },
}

/// One schedulable unit of work: a stable id plus what to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Engine-assigned stable id.
    pub id: JobId,
    /// The work to perform.
    pub kind: JobKind,
}

/// An ordered pipeline of jobs: each step starts only after the previous
/// step completes.
///
/// Chains are data-only. Building one schedules nothing; the caller hands
/// consumed chains to its execution engine once it is safe to enqueue work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobChain {
    jobs: Vec<Job>,
}

impl JobChain {
    /// Start a chain with its first job.
    pub fn start(job: Job) -> Self {
        Self { jobs: vec![job] }
    }

    /// Append a job that must run after everything already in the chain.
    #[must_use]
    pub fn then(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    /// The jobs in execution order.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Number of jobs in the chain.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the chain contains no jobs. Chains built through
    /// [`JobChain::start`] are never empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// The job-execution engine seam.
///
/// Implementations create job descriptors with stable ids; they must not
/// schedule anything as a side effect. The planner composes the returned
/// jobs into chains and records their ids in the dependency map.
pub trait JobEngine {
    /// A compression job for the given attachment.
    fn compression_job(&self, attachment: &RegisteredAttachment) -> Job;

    /// A job that obtains a resumable upload location for the attachment.
    fn upload_spec_job(&self, attachment: &RegisteredAttachment) -> Job;

    /// An upload job for the attachment.
    fn upload_job(&self, attachment: &RegisteredAttachment) -> Job;

    /// A copy job fanning `source` out to every destination record.
    fn copy_job(&self, source: AttachmentId, destinations: Vec<AttachmentId>) -> Job;
}

/// Stock [`JobEngine`] producing uuid-v4 job ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidJobEngine;

impl UuidJobEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self
    }

    fn job(kind: JobKind) -> Job {
        Job {
            id: JobId::new(Uuid::new_v4().to_string()),
            kind,
        }
    }
}

impl JobEngine for UuidJobEngine {
    fn compression_job(&self, attachment: &RegisteredAttachment) -> Job {
        Self::job(JobKind::Compress {
            attachment_id: attachment.id,
        })
    }

    fn upload_spec_job(&self, attachment: &RegisteredAttachment) -> Job {
        Self::job(JobKind::ObtainUploadSpec {
            attachment_id: attachment.id,
        })
    }

    fn upload_job(&self, attachment: &RegisteredAttachment) -> Job {
        Self::job(JobKind::Upload {
            attachment_id: attachment.id,
        })
    }

    fn copy_job(&self, source: AttachmentId, destinations: Vec<AttachmentId>) -> Job {
        Self::job(JobKind::Copy {
            source,
            destinations,
        })
    }
}
