//! Core types for toolrelay.

pub mod message;

pub use message::*;
