// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Pixora integration tests.
//!
//! Mock adapters for every external collaborator plus a [`TestHarness`]
//! that wires them over a temporary SQLite database.

pub mod harness;
pub mod mock_provider;
pub mod mock_services;

pub use harness::{TEST_SIGNING_SECRET, TEST_SITE_URL, TestHarness};
pub use mock_provider::MockModelProvider;
pub use mock_services::{MockEmail, MockIdentity, MockObjectStorage, MockPayment, Upload};
