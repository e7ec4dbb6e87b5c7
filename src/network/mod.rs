pub mod client;
pub mod errors;

pub use client::HttpClient;
pub use errors::NetworkError;
