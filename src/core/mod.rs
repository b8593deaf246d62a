//! Core types shared across the upload-planning crate.
//!
//! This module provides the foundation used by the rest of the crate:
//!
//! - [`GraphError`] - Enumerated error types for graph construction
//!
//! # Design Principles
//!
//! ## Error First Design
//! Graph construction returns a [`Result`] with meaningful error information.
//! The fatal, unrecoverable case (an attachment variant the planner cannot
//! upload) is a distinct variant so callers can treat it as a programmer
//! error rather than a transient condition.
//!
//! ## Collaborator Transparency
//! Failures raised by the caller-supplied registration callback are not
//! wrapped or rephrased; they propagate out of construction unchanged via
//! [`GraphError::Registration`].

pub mod error;

pub use self::error::GraphError;
