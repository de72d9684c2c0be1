//! `ragchat-server` exposes the ragchat pipeline as a single `POST /chat`
//! endpoint, plus `GET /health` reporting how each role was bound.
//!
//! Applications that ship their own retriever, prompt builder or generator
//! register them in a [`ragchat_core::ProviderRegistry`] and pass it to
//! [`run_server`].

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::{ApiError, AppState, app_router, run_server};
