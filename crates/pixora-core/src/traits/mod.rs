// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for every external collaborator.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod email;
pub mod identity;
pub mod object_storage;
pub mod payment;
pub mod provider;
pub mod storage;

pub use adapter::PluginAdapter;
pub use email::EmailSender;
pub use identity::IdentityProvider;
pub use object_storage::ObjectStorage;
pub use payment::PaymentProvider;
pub use provider::{ImageGenerator, TrainingProvider};
pub use storage::StorageAdapter;
