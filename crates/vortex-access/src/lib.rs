// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Who may run what: the delegated-user list and the tier resolver.

pub mod delegates;
pub mod resolver;

pub use delegates::DelegateStore;
pub use resolver::AuthorizationResolver;
