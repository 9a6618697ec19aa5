// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the agent and its collaborators.

pub mod transport;

pub use transport::{EventStream, Transport};
