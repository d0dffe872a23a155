// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit accounting for the Pixora back end.
//!
//! - **Ledger**: atomic debit/credit of a user's balance with an audit row per movement
//! - **Pricing**: credits charged for training and per generated image
//! - **Packs**: the purchasable credit pack catalog

pub mod ledger;
pub mod packs;
pub mod pricing;

pub use ledger::{CreditLedger, CreditReason, CreditTransaction};
pub use packs::{CREDIT_PACKS, CreditPack, find_pack};
pub use pricing::{ModelTier, Pricing};
