// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over the Pixora schema.

pub mod images;
pub mod models;
pub mod orders;
pub mod profiles;
