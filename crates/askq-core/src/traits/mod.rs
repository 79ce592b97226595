// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the queue's two collaborator seams.
//!
//! [`SnapshotStore`] persists the full queue state; [`Resolver`] turns
//! request text into an answer.

pub mod resolver;
pub mod store;

pub use resolver::Resolver;
pub use store::SnapshotStore;
