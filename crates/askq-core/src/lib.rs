// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the askq request queue.
//!
//! This crate provides the error type, the data model persisted in
//! snapshots, and the two collaborator traits ([`SnapshotStore`] and
//! [`Resolver`]) the queue service is built against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::AskqError;
pub use types::{
    Answer, Category, ClientId, EventAction, QueueEvent, Request, RequestId, Response, Snapshot,
    TranscriptEntry, DEFAULT_EVENT_LOG_CAP, DEFAULT_TRANSCRIPT_CAP,
};

pub use traits::{Resolver, SnapshotStore};
