// SPDX-FileCopyrightText: 2026 Vortex Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session continuity for the Vortex agent.
//!
//! - [`SessionCodec`] turns portable `<marker>:~<base64>` tokens into credentials.
//! - [`CredentialStore`] owns the credential file the transport resumes from.
//! - [`SessionBootstrap`] picks the credentials for each connection attempt,
//!   prompting on a terminal when nothing is configured.

pub mod bootstrap;
pub mod codec;
pub mod prompt;
pub mod store;

pub use bootstrap::{Acquisition, SessionBootstrap};
pub use codec::SessionCodec;
pub use prompt::{Prompter, TerminalPrompter, format_pairing_code};
pub use store::CredentialStore;
