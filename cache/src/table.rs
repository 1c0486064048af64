use crate::builder::CacheTableBuilder;
use crate::error::{BuildError, CacheError};
use crate::item::CacheItem;
use crate::listener::RemovalCause;
use crate::loader::data_loader;
use crate::logger::LogSink;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::shared::TableShared;

use std::any::Any;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A named, thread-safe cache table with per-item idle expiration.
///
/// Cloning a `CacheTable` is cheap and yields another handle to the same
/// table. The table's sweeper thread stops once the last handle is dropped.
pub struct CacheTable<K, V> {
  pub(crate) shared: Arc<TableShared<K, V>>,
}

impl<K, V> Clone for CacheTable<K, V> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K, V> fmt::Debug for CacheTable<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheTable")
      .field("shared", &self.shared)
      .finish()
  }
}

impl<K, V> CacheTable<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Creates an empty table with no loader, callbacks or log sink.
  pub fn new(name: impl Into<String>) -> Result<Self, BuildError> {
    CacheTableBuilder::new(name).build()
  }

  pub fn builder(name: impl Into<String>) -> CacheTableBuilder<K, V> {
    CacheTableBuilder::new(name)
  }

  pub fn name(&self) -> &str {
    &self.shared.name
  }

  /// Returns how many items are currently stored.
  ///
  /// Items past their deadline are counted until the sweep removes them.
  pub fn count(&self) -> usize {
    self.shared.state.read().items.len()
  }

  /// Checks whether `key` holds a live item, without keeping it alive.
  ///
  /// An item past its deadline is reported absent, as `value` would.
  pub fn exists(&self, key: &K) -> bool {
    let now = Instant::now();
    self
      .shared
      .state
      .read()
      .items
      .get(key)
      .is_some_and(|item| !item.is_expired(now))
  }

  /// The interval the expiration timer is currently armed with.
  ///
  /// `Duration::ZERO` means no item with a life span is known and the
  /// sweeper is dormant.
  pub fn cleanup_interval(&self) -> Duration {
    self.shared.state.read().cleanup_interval
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  /// Adds an item to the table, replacing any item stored under `key`.
  ///
  /// A `life_span` of zero means the item never expires. The added-item
  /// callbacks run after the insert, outside the table lock. A replaced item
  /// is dropped without running its removal hooks.
  pub fn add(&self, key: K, life_span: Duration, data: V) -> Arc<CacheItem<K, V>> {
    let item = Arc::new(CacheItem::new(key, life_span, data));
    self.shared.add_internal(item.clone());
    item
  }

  /// Adds an item only if `key` is not stored yet.
  ///
  /// Returns `true` if the item was inserted.
  pub fn not_found_add(&self, key: K, life_span: Duration, data: V) -> bool {
    let state = self.shared.state.write();
    if state.items.contains_key(&key) {
      return false;
    }
    let item = Arc::new(CacheItem::new(key, life_span, data));
    self.shared.insert_locked(state, item);
    true
  }

  /// Looks up `key`, keeping the item alive on a hit.
  ///
  /// On a miss the data loader, if any, is asked for the item, which is then
  /// stored under `key`.
  pub fn value(&self, key: &K) -> Result<Arc<CacheItem<K, V>>, CacheError> {
    self.value_with(key, &[])
  }

  /// Like [`value`](Self::value), passing `args` to the data loader on a miss.
  pub fn value_with(
    &self,
    key: &K,
    args: &[&dyn Any],
  ) -> Result<Arc<CacheItem<K, V>>, CacheError> {
    let (found, loader) = {
      let state = self.shared.state.read();
      (state.items.get(key).cloned(), state.loader.clone())
    };

    if let Some(item) = found {
      if !item.is_expired(Instant::now()) {
        item.keep_alive();
        Metrics::record(&self.shared.metrics.hits);
        return Ok(item);
      }
      // The sweep has not caught up with this item yet.
      let _ = self
        .shared
        .remove(item.key(), Some(&item), RemovalCause::Expired);
    }
    Metrics::record(&self.shared.metrics.misses);

    let loaded = loader.and_then(|loader| loader(key, args));
    match loaded {
      Some(item) => {
        // Stored under the requested key, whatever key the loader gave it.
        let item = Arc::new(item.rekey(key.clone()));
        Metrics::record(&self.shared.metrics.loads);
        self.shared.add_internal(item.clone());
        Ok(item)
      }
      None => Err(CacheError::KeyNotFound),
    }
  }

  /// Removes the item stored under `key` and returns it.
  ///
  /// The about-to-delete callbacks and the item's about-to-expire callbacks
  /// run first, with [`RemovalCause::Deleted`].
  pub fn delete(&self, key: &K) -> Result<Arc<CacheItem<K, V>>, CacheError> {
    self.shared.remove(key, None, RemovalCause::Deleted)
  }

  /// Removes every item and cancels the expiration timer.
  ///
  /// No removal callbacks run for flushed items.
  pub fn flush(&self) {
    self.shared.flush();
  }

  /// Calls `f` for every item, on a snapshot taken under the table lock.
  ///
  /// `f` runs without any lock held, so it may call back into the table.
  pub fn foreach<F>(&self, mut f: F)
  where
    F: FnMut(&K, &Arc<CacheItem<K, V>>),
  {
    for item in self.shared.snapshot() {
      f(item.key(), &item);
    }
  }

  /// Returns up to `count` items, most accessed first.
  pub fn most_accessed(&self, count: usize) -> Vec<Arc<CacheItem<K, V>>> {
    let mut ranked: Vec<(u64, Arc<CacheItem<K, V>>)> = self
      .shared
      .snapshot()
      .into_iter()
      .map(|item| (item.access_count(), item))
      .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
      .into_iter()
      .take(count)
      .map(|(_, item)| item)
      .collect()
  }

  // --- Hooks ---

  /// Sets the loader asked for missing keys by `value` and `value_with`.
  pub fn set_data_loader<F>(&self, f: F)
  where
    F: Fn(&K, &[&dyn Any]) -> Option<CacheItem<K, V>> + Send + Sync + 'static,
  {
    self.shared.state.write().loader = Some(data_loader(f));
  }

  pub fn remove_data_loader(&self) {
    self.shared.state.write().loader = None;
  }

  /// Replaces all added-item callbacks with `f`.
  pub fn set_added_item_callback<F>(&self, f: F)
  where
    F: Fn(&CacheItem<K, V>) + Send + Sync + 'static,
  {
    let mut state = self.shared.state.write();
    state.added_item.clear();
    state.added_item.push(Arc::new(f));
  }

  pub fn add_added_item_callback<F>(&self, f: F)
  where
    F: Fn(&CacheItem<K, V>) + Send + Sync + 'static,
  {
    self.shared.state.write().added_item.push(Arc::new(f));
  }

  pub fn remove_added_item_callbacks(&self) {
    self.shared.state.write().added_item.clear();
  }

  /// Replaces all about-to-delete callbacks with `f`.
  pub fn set_about_to_delete_item_callback<F>(&self, f: F)
  where
    F: Fn(&CacheItem<K, V>, RemovalCause) + Send + Sync + 'static,
  {
    let mut state = self.shared.state.write();
    state.about_to_delete.clear();
    state.about_to_delete.push(Arc::new(f));
  }

  pub fn add_about_to_delete_item_callback<F>(&self, f: F)
  where
    F: Fn(&CacheItem<K, V>, RemovalCause) + Send + Sync + 'static,
  {
    self.shared.state.write().about_to_delete.push(Arc::new(f));
  }

  pub fn remove_about_to_delete_item_callbacks(&self) {
    self.shared.state.write().about_to_delete.clear();
  }

  /// Routes this table's diagnostic lines to `sink`, or stops doing so with `None`.
  pub fn set_logger(&self, sink: Option<Arc<dyn LogSink>>) {
    *self.shared.logger.write() = sink;
  }
}
