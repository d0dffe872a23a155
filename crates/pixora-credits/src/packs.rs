// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit packs offered on the billing page.

use serde::Serialize;

/// A purchasable bundle of credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditPack {
    pub id: &'static str,
    pub name: &'static str,
    pub credits: i64,
    /// Price in whole US cents.
    pub price_cents: i64,
}

impl CreditPack {
    /// Price formatted for the payment provider, e.g. `"45.00"`.
    pub fn price_usd(&self) -> String {
        format!("{}.{:02}", self.price_cents / 100, self.price_cents % 100)
    }
}

pub const CREDIT_PACKS: &[CreditPack] = &[
    CreditPack {
        id: "explorer",
        name: "Explorer",
        credits: 1_000,
        price_cents: 1_000,
    },
    CreditPack {
        id: "creator",
        name: "Creator",
        credits: 5_000,
        price_cents: 4_500,
    },
    CreditPack {
        id: "visionary",
        name: "Visionary",
        credits: 15_000,
        price_cents: 12_000,
    },
];

pub fn find_pack(id: &str) -> Option<&'static CreditPack> {
    CREDIT_PACKS.iter().find(|p| p.id == id)
}
