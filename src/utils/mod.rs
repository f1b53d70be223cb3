//! Small shared helpers.

pub mod serde;
