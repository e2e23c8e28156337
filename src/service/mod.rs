//! Service integrations for external collaborators.
//!
//! This module contains implementations for the services used by chanbot:
//! - Chat services (e.g., IRC)
//! - Lookup services (web search, cakeday, packages, page fetches)
//! - The conversational brain
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod brain;
pub mod chat;
pub mod lookup;
