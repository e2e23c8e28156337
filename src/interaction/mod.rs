//! Event handling and user interactions for chanbot.
//!
//! Transport events flow through the [`events`] registry, whose handlers describe the
//! work to do as [`actions::Action`]s. Commands are parsed by [`trigger`], routed by
//! [`router`] and answered by [`commands`], [`link_title`] and [`dispatch`].

pub mod actions;
pub mod channel_log;
pub mod commands;
pub mod dispatch;
pub mod events;
pub mod link_title;
pub mod message;
pub mod router;
pub mod trigger;
