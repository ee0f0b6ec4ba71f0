// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Base library for long-running services: buffered multi-channel logging,
//! typed flags with config-file hot reload, a chained signal dispatcher and
//! the thread primitives they are built on.

pub mod bootstrap;
pub mod flags;
pub mod logging;
pub mod signal;
pub mod thread;

pub use bootstrap::{Bootstrap, BootstrapError, Context};
