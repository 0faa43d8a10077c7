//! Chat backend transport

mod http;

pub use http::{ChatClient, ResponseBodySource};
