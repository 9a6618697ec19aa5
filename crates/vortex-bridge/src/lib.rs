// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket bridge to the chat-protocol sidecar.
//!
//! The sidecar hosts the protocol library and exposes it as JSON request,
//! response and event frames. [`BridgeTransport`] is the production
//! [`Transport`](vortex_core::Transport) the agent runs against.

pub mod protocol;
pub mod transport;

pub use protocol::{Frame, FrameError};
pub use transport::BridgeTransport;
