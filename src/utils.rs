//! Small shared helpers.

pub mod notation;
