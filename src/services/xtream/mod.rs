//! Xtream Codes Integration
//!
//! Minimal client for the Xtream Codes Player API v2, used to pull a
//! provider's live channel list so it can be rendered as M3U.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::services::xtream::{XtreamClient, XtreamCredentials};
//!
//! let creds = XtreamCredentials::new(&api_url, &username, &password);
//! let client = XtreamClient::new(http.clone(), &creds);
//! if client.get_auth().await?.user_info.is_authenticated() {
//!     let streams = client.get_live_streams().await?;
//! }
//! ```

pub mod client;
pub mod types;

// Re-exports for convenience
pub use client::{XtreamClient, XtreamError};
pub use types::{XtreamCategory, XtreamCredentials, XtreamLiveStream};
