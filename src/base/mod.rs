//! Core components, types, and utilities for chanbot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - The quip catalog used by generic action replies.
//! - Common types, errors and result handling.

pub mod config;
pub mod error;
pub mod quips;
pub mod types;
