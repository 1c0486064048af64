use crate::listener::{AboutToExpireCallback, RemovalCause};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// The mutable part of an item, guarded by the item's own lock.
struct ItemState<K> {
  accessed_on: Instant,
  access_count: u64,
  about_to_expire: Vec<AboutToExpireCallback<K>>,
}

/// A single entry of a `CacheTable`.
///
/// The key, the data, the life span and the creation time never change. The
/// access metadata and the expiry callbacks sit behind a per-item lock, so
/// touching one item never contends with another.
pub struct CacheItem<K, V> {
  key: K,
  data: V,
  /// How long the item may stay idle before it expires. Zero means never.
  life_span: Duration,
  created_on: Instant,
  state: RwLock<ItemState<K>>,
  /// Set by the first removal that claims this item.
  removing: AtomicBool,
}

impl<K, V> CacheItem<K, V> {
  /// Creates a new item. `life_span` of zero makes the item immune to expiry.
  pub fn new(key: K, life_span: Duration, data: V) -> Self {
    let now = Instant::now();
    Self {
      key,
      data,
      life_span,
      created_on: now,
      state: RwLock::new(ItemState {
        accessed_on: now,
        access_count: 0,
        about_to_expire: Vec::new(),
      }),
      removing: AtomicBool::new(false),
    }
  }

  /// Marks the item as just accessed, restarting its expiration clock.
  pub fn keep_alive(&self) {
    let mut state = self.state.write();
    state.accessed_on = Instant::now();
    state.access_count += 1;
  }

  #[inline]
  pub fn key(&self) -> &K {
    &self.key
  }

  #[inline]
  pub fn data(&self) -> &V {
    &self.data
  }

  #[inline]
  pub fn life_span(&self) -> Duration {
    self.life_span
  }

  #[inline]
  pub fn created_on(&self) -> Instant {
    self.created_on
  }

  /// The time of the last keep-alive, or the creation time if there was none.
  pub fn accessed_on(&self) -> Instant {
    self.state.read().accessed_on
  }

  /// How many times the item has been kept alive.
  pub fn access_count(&self) -> u64 {
    self.state.read().access_count
  }

  /// Replaces all about-to-expire callbacks with `f`.
  pub fn set_about_to_expire_callback<F>(&self, f: F)
  where
    F: Fn(&K, RemovalCause) + Send + Sync + 'static,
  {
    let mut state = self.state.write();
    state.about_to_expire.clear();
    state.about_to_expire.push(Arc::new(f));
  }

  /// Appends `f` to the callbacks run right before this item is removed.
  pub fn add_about_to_expire_callback<F>(&self, f: F)
  where
    F: Fn(&K, RemovalCause) + Send + Sync + 'static,
  {
    self.state.write().about_to_expire.push(Arc::new(f));
  }

  pub fn remove_about_to_expire_callbacks(&self) {
    self.state.write().about_to_expire.clear();
  }

  /// Time left before the item expires, as seen at `now`.
  ///
  /// `None` for items that never expire, `Some(Duration::ZERO)` once expired.
  pub fn remaining(&self, now: Instant) -> Option<Duration> {
    if self.life_span.is_zero() {
      return None;
    }
    let idle = now.saturating_duration_since(self.accessed_on());
    Some(self.life_span.saturating_sub(idle))
  }

  /// Checks whether the item has been idle for at least its life span.
  #[inline]
  pub fn is_expired(&self, now: Instant) -> bool {
    self.remaining(now).is_some_and(|left| left.is_zero())
  }

  /// Moves the item under `key`, keeping its data, clock and callbacks.
  pub(crate) fn rekey(self, key: K) -> Self {
    Self { key, ..self }
  }

  /// Snapshot of the expiry callbacks, so they can be run without the lock.
  pub(crate) fn about_to_expire_callbacks(&self) -> Vec<AboutToExpireCallback<K>> {
    self.state.read().about_to_expire.clone()
  }

  /// Claims the item for removal. Only the first caller gets `true`.
  pub(crate) fn claim_removal(&self) -> bool {
    self
      .removing
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }
}

// Manual Debug implementation, the callbacks are not `Debug`.
impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CacheItem<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.read();
    f.debug_struct("CacheItem")
      .field("key", &self.key)
      .field("data", &self.data)
      .field("life_span", &self.life_span)
      .field("created_on", &self.created_on)
      .field("accessed_on", &state.accessed_on)
      .field("access_count", &state.access_count)
      .field("about_to_expire_callbacks", &state.about_to_expire.len())
      .finish()
  }
}
