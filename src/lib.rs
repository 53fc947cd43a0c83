//! Client-authentication material and UI-required throttling for OAuth 2.0 / OIDC token
//! clients: mutually exclusive credentials, pluggable signing backends, and fail-fast request
//! fingerprints.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod credential;
pub mod error;
pub mod obs;
pub mod signing;
pub mod throttle;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		credential::{ClientAuthenticator, ClientCertificate, ClientCredentialConfig},
		throttle::{ServiceError, ThrottleRequest},
	};

	/// PEM encoded self-signed certificate shared by the test suites.
	pub const TEST_CERTIFICATE_PEM: &str = include_str!("../tests/fixtures/client_cert.pem");
	/// PKCS#8 PEM encoded 2048-bit RSA key matching [`TEST_CERTIFICATE_PEM`].
	pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/client_key.pem");
	/// PKCS#8 PEM encoded 2048-bit RSA key unrelated to [`TEST_CERTIFICATE_PEM`].
	pub const OTHER_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/other_key.pem");
	/// PKCS#8 PEM encoded 1024-bit RSA key that must be rejected.
	pub const WEAK_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/weak_key.pem");
	/// Base64url SHA-1 digest of the DER form of [`TEST_CERTIFICATE_PEM`].
	pub const TEST_CERTIFICATE_KID: &str = "GFBigalZ_9JZ2I_nHf9SV9Q8Ecs";
	/// Base64url SHA-256 digest of the DER form of [`TEST_CERTIFICATE_PEM`].
	pub const TEST_CERTIFICATE_SHA256_THUMBPRINT: &str =
		"32gaa7xR1hJ9w-jIFhX2CLKjWcy92g8sr0INBc-lhWs";

	/// Loads the shared certificate fixture.
	pub fn test_certificate() -> ClientCertificate {
		ClientCertificate::from_pem(TEST_CERTIFICATE_PEM, TEST_PRIVATE_KEY_PEM)
			.expect("Certificate fixture should load successfully.")
	}

	/// Builds an authenticator backed by the shared certificate fixture.
	pub fn test_certificate_authenticator() -> ClientAuthenticator {
		let config = ClientCredentialConfig::default().with_certificate(test_certificate());

		ClientAuthenticator::new(config)
			.expect("Certificate authenticator fixture should build successfully.")
	}

	/// Builds a throttle request with the provided body parameters against a fixed authority.
	pub fn test_throttle_request<I, K, V>(body: I) -> ThrottleRequest
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		ThrottleRequest::new("https://login.example.com/tenant-a/")
			.with_home_account_id("uid.utid")
			.with_body(body)
	}

	/// Builds a UI-required service error with the provided message.
	pub fn ui_required_error(message: &str) -> ServiceError {
		ServiceError::ui_required("invalid_grant", message)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use rsa;
pub use url;
#[cfg(test)] use {color_eyre as _, tokio as _};
