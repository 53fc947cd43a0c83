//! TTL-bounded store of recent throttle-worthy failures keyed by request thumbprint.

// self
use crate::{_prelude::*, throttle::ServiceError};

type EntryMap = HashMap<String, ThrottlingCacheEntry>;

/// Remembered failure plus its absolute expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrottlingCacheEntry {
	/// Failure re-delivered while the entry is live.
	pub error: ServiceError,
	/// Instant the failure was recorded.
	pub created_at: OffsetDateTime,
	/// Instant the entry stops throttling.
	pub expires_at: OffsetDateTime,
}
impl ThrottlingCacheEntry {
	/// Creates an entry that expires `ttl` from now.
	pub fn new(error: ServiceError, ttl: Duration) -> Self {
		Self::new_at(error, OffsetDateTime::now_utc(), ttl)
	}

	/// Creates an entry recorded at `created_at` that expires `ttl` later.
	pub fn new_at(error: ServiceError, created_at: OffsetDateTime, ttl: Duration) -> Self {
		Self { error, created_at, expires_at: created_at + ttl }
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at <= instant
	}
}

/// Thread-safe thumbprint → failure map that sweeps expired entries on every write.
///
/// There is no capacity bound and no background task: each insert pays for a full sweep, so
/// the map only ever holds entries younger than their TTL as of the latest write. Reads do not
/// expire entries; use [`lookup_live_at`](Self::lookup_live_at) to ignore stale ones.
#[derive(Debug, Default)]
pub struct ThrottlingCache(RwLock<EntryMap>);
impl ThrottlingCache {
	/// Inserts (or replaces) `entry` and sweeps expired entries using the current clock.
	pub fn add_and_cleanup(
		&self,
		thumbprint: impl Into<String>,
		entry: ThrottlingCacheEntry,
	) -> usize {
		self.add_and_cleanup_at(thumbprint, entry, OffsetDateTime::now_utc())
	}

	/// Inserts (or replaces) `entry`, then removes every entry expired at `now`.
	///
	/// Returns the number of evicted entries.
	pub fn add_and_cleanup_at(
		&self,
		thumbprint: impl Into<String>,
		entry: ThrottlingCacheEntry,
		now: OffsetDateTime,
	) -> usize {
		let mut guard = self.0.write();

		guard.insert(thumbprint.into(), entry);

		let before = guard.len();

		guard.retain(|_, entry| !entry.is_expired_at(now));

		before - guard.len()
	}

	/// Entry stored for `thumbprint`, whether or not it has expired.
	pub fn lookup(&self, thumbprint: &str) -> Option<ThrottlingCacheEntry> {
		self.0.read().get(thumbprint).cloned()
	}

	/// Entry stored for `thumbprint` if it is still live at `now`.
	pub fn lookup_live_at(
		&self,
		thumbprint: &str,
		now: OffsetDateTime,
	) -> Option<ThrottlingCacheEntry> {
		self.0.read().get(thumbprint).filter(|entry| !entry.is_expired_at(now)).cloned()
	}

	/// Returns `true` when no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Removes every entry.
	pub fn clear(&self) {
		self.0.write().clear();
	}
}
