//! OneBoss portal: token-authenticated users and an owner-scoped FAQ resource with trash and
//! restore, plus the client-side store a frontend drives.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod faq;
pub mod mail;
pub mod memory;
pub mod state;
