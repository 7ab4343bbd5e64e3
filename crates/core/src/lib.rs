// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ph-core: durable primitives for the PropertyHub offline sync engine.
//!
//! This crate provides the record cache, the mutation queue and the types
//! shared between the sync runtime and its remote collaborator.

pub mod action;
pub mod clock;
pub mod error;
pub mod jsonl;
pub mod protocol;
pub mod queue;
pub mod store;

pub use action::{ActionKind, QueuedAction};
pub use clock::{ActionClock, ActionId, ClockSource, SystemClock};
pub use error::{Error, Result};
pub use protocol::{ClientMessage, Confirmation, ServerMessage};
pub use queue::{MutationQueue, Requeue};
pub use store::{CollectionSpec, Store};
