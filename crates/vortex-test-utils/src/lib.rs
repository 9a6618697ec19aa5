// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Vortex integration tests.
//!
//! Provides a scripted transport and message fixtures for fast,
//! deterministic, CI-runnable tests without a protocol sidecar.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock connection with event injection and outbound capture
//! - [`fixtures`] - Builders for raw protocol messages and group metadata

pub mod fixtures;
pub mod mock_transport;

pub use mock_transport::{MockTransport, TransportCalls};
