//! Utility modules for the publisher.

pub mod date;
pub mod minify;
pub mod slug;
