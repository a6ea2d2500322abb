//! Business logic services.
//!
//! Every operation takes its storage handle as an argument; nothing here
//! holds state of its own.

pub mod generation;
pub mod identity;
pub mod key_issuer;
pub mod quota;
pub mod retention;
pub mod usage_service;
