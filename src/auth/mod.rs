//! # Auth Context Resolver
//!
//! Turns the bearer credential attached to every collaborator call into the
//! human-readable role label sent with each step execution.

pub mod role_resolver;

pub use role_resolver::{first_role, format_role_label, RoleClaimError, RoleResolver};
