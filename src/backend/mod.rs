//! Backend Gateway: the single place where tool invocations leave the process.

pub mod gateway;
pub mod http;

pub use gateway::{Backend, BackendError, BackendHealth, Gateway, Outcome};
pub use http::HttpBackend;
