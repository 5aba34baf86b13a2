//! Request handlers, split by surface.

pub mod admin;
pub mod requests;
