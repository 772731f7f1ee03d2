pub mod client;
pub mod encoding;
pub mod wire;

pub use client::GitHubClient;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
