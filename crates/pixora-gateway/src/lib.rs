// SPDX-FileCopyrightText: 2026 Pixora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API for the Pixora back end.
//!
//! Public routes: `GET /health` and the signed training webhook. Every other
//! route sits behind [`auth::auth_middleware`], which resolves the caller's
//! bearer session to a profile.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ErrorResponse};
pub use server::{AppState, ServerConfig, Services, router, start_server};
