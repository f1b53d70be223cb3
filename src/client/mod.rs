//! HTTP access to the classifier, task lister and execution gateway.

pub mod error;
pub mod http;

pub use error::{ClientError, ClientResult};
pub use http::HttpRemediationClient;
