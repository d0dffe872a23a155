// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment adapter trait for credit pack purchases.

use async_trait::async_trait;

use crate::error::PixoraError;
use crate::traits::adapter::PluginAdapter;
use crate::types::PaymentOrder;

/// Adapter for a checkout-style payment provider.
#[async_trait]
pub trait PaymentProvider: PluginAdapter {
    /// Creates a capture-intent order for `amount` (decimal string) in `currency`.
    async fn create_order(&self, amount: &str, currency: &str)
    -> Result<PaymentOrder, PixoraError>;

    /// Captures a previously approved order.
    async fn capture_order(&self, order_id: &str) -> Result<PaymentOrder, PixoraError>;
}
