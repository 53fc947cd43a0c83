//! Auth-domain primitives shared by credentials and throttling.

pub mod secret;

pub use secret::*;
