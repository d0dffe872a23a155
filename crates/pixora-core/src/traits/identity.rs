// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity adapter trait for resolving session tokens.

use async_trait::async_trait;

use crate::error::PixoraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::AuthUser;

/// Adapter for the hosted identity/session store.
#[async_trait]
pub trait IdentityProvider: PluginAdapter {
    /// Resolves an access token to its user.
    ///
    /// Returns `Ok(None)` for an unknown or expired token; errors are
    /// reserved for transport failures.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, PixoraError>;
}
