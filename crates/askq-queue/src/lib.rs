// SPDX-FileCopyrightText: 2026 askq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The askq shared request queue.
//!
//! - [`manager`]: pure operations over [`QueueState`] (submit, dispatch,
//!   retrieve, sweep, stats)
//! - [`service`]: the single task owning the state, driven through a
//!   [`QueueHandle`]
//! - [`client`]: polling client sessions
//! - [`persist`]: snapshot load/save with crash recovery
//! - [`shutdown`]: signal handling and draining

pub mod client;
pub mod manager;
pub mod persist;
pub mod service;
pub mod shutdown;
pub mod state;

pub use client::{generate_client_id, ClientSession};
pub use manager::{
    DispatchOutcome, Health, HealthLevel, PreviewEntry, QueuePreview, Stats, SubmitOutcome,
};
pub use service::{Applied, QueueHandle, QueueService};
pub use state::{Now, QueueState};
