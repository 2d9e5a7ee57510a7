//! # switchhub-domain
//!
//! Pure domain model for the switchhub relay and button controller.
//!
//! ## Responsibilities
//! - Error conventions shared by every layer ([`error`])
//! - Switch addressing: the `"<collection>.<index>"` spec format ([`switch_spec`])
//! - Collection driver kinds ([`collection`])
//! - Button specs, polarity and pull resolution ([`button`])
//! - The per-button debounce state machine ([`button::debounce`])
//! - Normalized button events ([`event`])
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod button;
pub mod collection;
pub mod error;
pub mod event;
pub mod switch_spec;
