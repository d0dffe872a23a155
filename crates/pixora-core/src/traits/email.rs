// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email adapter trait for transactional notifications.

use async_trait::async_trait;

use crate::error::PixoraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::EmailMessage;

/// Adapter for a transactional email provider.
#[async_trait]
pub trait EmailSender: PluginAdapter {
    /// Sends one message and returns the provider's message id.
    async fn send(&self, message: &EmailMessage) -> Result<String, PixoraError>;
}
