//! Authentication: Google OAuth login and signed session cookies
//!
//! - `google`: authorization code flow
//! - `jwt`: session token encoding/decoding
//! - `session`: cookie helpers
//! - `middleware`: route guard
//! - `extractor`: session user for handlers

pub mod extractor;
pub mod google;
pub mod jwt;
pub mod middleware;
pub mod session;
