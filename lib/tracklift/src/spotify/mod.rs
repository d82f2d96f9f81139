pub mod auth;
pub mod client;
pub(crate) mod models;

pub use auth::SpotifyAuthorizer;
pub use client::{SpotifyClient, SpotifyClientBuilder};
