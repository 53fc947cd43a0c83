//! Request thumbprints used as throttling cache keys.

// std
use std::cmp::Ordering;
// self
use crate::throttle::ThrottleRequest;

/// Body parameter names left out of the value suffix of a full thumbprint.
pub const EXCLUDED_PARAMETERS: &[&str] = &[];

const KEY_DELIMITER: char = '.';

/// Produces the strict part of a request thumbprint: the authority, account, and canonical
/// request shape.
pub trait ThumbprintStrategy
where
	Self: Send + Sync,
{
	/// Canonical strict thumbprint for `request`.
	fn strict_thumbprint(&self, request: &ThrottleRequest) -> String;
}

/// Strict thumbprint of the form `client_id.authority.scope.home_account_id.`, where the
/// `client_id` and `scope` segments appear only when the body carries them.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultThumbprintStrategy;
impl ThumbprintStrategy for DefaultThumbprintStrategy {
	fn strict_thumbprint(&self, request: &ThrottleRequest) -> String {
		let mut buf = String::new();

		if let Some(client_id) = request.body.get("client_id") {
			buf.push_str(client_id);
			buf.push(KEY_DELIMITER);
		}

		buf.push_str(&request.authority);
		buf.push(KEY_DELIMITER);

		if let Some(scope) = request.body.get("scope") {
			buf.push_str(scope);
			buf.push(KEY_DELIMITER);
		}

		buf.push_str(request.home_account_id.as_deref().unwrap_or_default());
		buf.push(KEY_DELIMITER);

		buf
	}
}

/// Full thumbprint: the strict thumbprint, a `.`, then every non-excluded body value sorted
/// case-insensitively and concatenated.
///
/// Values that compare equal ignoring case fall back to ordinal order, so the result never
/// depends on parameter insertion order.
pub fn request_full_thumbprint(
	strategy: &dyn ThumbprintStrategy,
	request: &ThrottleRequest,
) -> String {
	let strict = strategy.strict_thumbprint(request);
	let mut values: Vec<&str> = request
		.body
		.iter()
		.filter(|(key, _)| !EXCLUDED_PARAMETERS.contains(&key.as_str()))
		.map(|(_, value)| value.as_str())
		.collect();

	values.sort_by(|a, b| cmp_ignore_case(a, b).then_with(|| a.cmp(b)));

	let mut buf =
		String::with_capacity(strict.len() + 1 + values.iter().map(|v| v.len()).sum::<usize>());

	buf.push_str(&strict);
	buf.push(KEY_DELIMITER);

	for value in values {
		buf.push_str(value);
	}

	buf
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
	a.chars().flat_map(char::to_uppercase).cmp(b.chars().flat_map(char::to_uppercase))
}
