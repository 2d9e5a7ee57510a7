//! # switchhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API for switches and groups (`/api/switches`,
//!   `/api/groups`), including hold timers
//! - Stream debounced button events as Server-Sent Events
//!   (`/api/buttons/events`)
//! - Map HTTP requests into `Switchboard` calls and domain errors into
//!   status codes
//!
//! ## Dependency rule
//! Depends on `switchhub-app` (for port traits and services) and
//! `switchhub-domain` (for error types). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
