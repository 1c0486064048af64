use crate::error::CacheError;
use crate::item::CacheItem;
use crate::listener::{AboutToDeleteCallback, AddedItemCallback, RemovalCause};
use crate::loader::DataLoader;
use crate::logger::{self, LogSink};
use crate::metrics::Metrics;
use crate::task::sweeper::Sweeper;

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use std::{fmt, mem};

use ahash::HashMap;
use parking_lot::{RwLock, RwLockWriteGuard};

/// Everything guarded by the table lock.
pub(crate) struct TableState<K, V> {
  pub(crate) items: HashMap<K, Arc<CacheItem<K, V>>>,
  /// The interval the sweeper was last armed with. Zero while dormant.
  pub(crate) cleanup_interval: Duration,
  /// Bumped on every insert of an expiring item, so a sweep can tell that it
  /// raced with one.
  pub(crate) insert_epoch: u64,
  pub(crate) loader: Option<DataLoader<K, V>>,
  pub(crate) added_item: Vec<AddedItemCallback<K, V>>,
  pub(crate) about_to_delete: Vec<AboutToDeleteCallback<K, V>>,
}

impl<K, V> Default for TableState<K, V> {
  fn default() -> Self {
    Self {
      items: HashMap::default(),
      cleanup_interval: Duration::ZERO,
      insert_epoch: 0,
      loader: None,
      added_item: Vec::new(),
      about_to_delete: Vec::new(),
    }
  }
}

/// The internal, thread-safe core of a cache table.
pub(crate) struct TableShared<K, V> {
  pub(crate) name: String,
  pub(crate) state: RwLock<TableState<K, V>>,
  pub(crate) logger: RwLock<Option<Arc<dyn LogSink>>>,
  pub(crate) metrics: Metrics,
  pub(crate) sweeper: Sweeper,
}

impl<K, V> fmt::Debug for TableShared<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TableShared")
      .field("name", &self.name)
      .field("cleanup_interval", &self.state.read().cleanup_interval)
      .field("sweeper_armed", &self.sweeper.is_armed())
      .field("metrics", &self.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<K, V> Drop for TableShared<K, V> {
  fn drop(&mut self) {
    self.sweeper.stop();
  }
}

impl<K, V> TableShared<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  pub(crate) fn new(
    name: String,
    state: TableState<K, V>,
    logger: Option<Arc<dyn LogSink>>,
  ) -> Self {
    Self {
      name,
      state: RwLock::new(state),
      logger: RwLock::new(logger),
      metrics: Metrics::new(),
      sweeper: Sweeper::new(),
    }
  }

  pub(crate) fn log(&self, args: fmt::Arguments<'_>) {
    let sink = self.logger.read().clone();
    logger::emit(&self.name, sink.as_deref(), args);
  }

  /// Inserts `item`, replacing any item stored under the same key.
  pub(crate) fn add_internal(&self, item: Arc<CacheItem<K, V>>) {
    self.insert_locked(self.state.write(), item);
  }

  /// Inserts `item` while the caller holds the table lock.
  ///
  /// The lock is released before the added-item callbacks run, and the sweep
  /// is requested if the new item may expire before the armed deadline.
  pub(crate) fn insert_locked(
    &self,
    mut state: RwLockWriteGuard<'_, TableState<K, V>>,
    item: Arc<CacheItem<K, V>>,
  ) {
    let life_span = item.life_span();
    state.items.insert(item.key().clone(), item.clone());
    if !life_span.is_zero() {
      state.insert_epoch = state.insert_epoch.wrapping_add(1);
    }
    let cleanup_interval = state.cleanup_interval;
    let added_item = state.added_item.clone();
    drop(state);

    Metrics::record(&self.metrics.inserts);
    self.log(format_args!(
      "Adding item with life span {:?} to table {}",
      life_span, self.name
    ));

    for callback in &added_item {
      callback(&item);
    }

    if !life_span.is_zero() && (cleanup_interval.is_zero() || life_span < cleanup_interval) {
      self.sweeper.trigger();
    }
  }

  /// Removes the item stored under `key`, running every removal hook first.
  ///
  /// With `expected` set, only that exact item is removed; a replacement
  /// stored under the same key is reported as `KeyNotFound`. When two callers
  /// race to remove the same item, the hooks run once and the loser gets
  /// `KeyNotFound`.
  pub(crate) fn remove(
    &self,
    key: &K,
    expected: Option<&Arc<CacheItem<K, V>>>,
    cause: RemovalCause,
  ) -> Result<Arc<CacheItem<K, V>>, CacheError> {
    let (item, about_to_delete) = {
      let state = self.state.read();
      let item = state.items.get(key).ok_or(CacheError::KeyNotFound)?;
      if expected.is_some_and(|expected| !Arc::ptr_eq(item, expected)) {
        return Err(CacheError::KeyNotFound);
      }
      (item.clone(), state.about_to_delete.clone())
    };

    if !item.claim_removal() {
      return Err(CacheError::KeyNotFound);
    }

    for callback in &about_to_delete {
      callback(&item, cause);
    }
    for callback in item.about_to_expire_callbacks() {
      callback(item.key(), cause);
    }

    {
      let mut state = self.state.write();
      if state
        .items
        .get(key)
        .is_some_and(|current| Arc::ptr_eq(current, &item))
      {
        state.items.remove(key);
      }
    }

    match cause {
      RemovalCause::Expired => Metrics::record(&self.metrics.expirations),
      RemovalCause::Deleted => Metrics::record(&self.metrics.deletions),
    }
    self.log(format_args!(
      "Deleting item created {:?} ago and hit {} times from table {} ({})",
      item.created_on().elapsed(),
      item.access_count(),
      self.name,
      cause
    ));

    Ok(item)
  }

  /// One expiration sweep.
  ///
  /// Removes every item whose idle time reached its life span, then arms the
  /// sweeper for the soonest remaining deadline, or leaves it dormant when no
  /// expiring item is left.
  pub(crate) fn expiration_check(&self) {
    let now = Instant::now();
    let (armed_interval, scanned_epoch, expired, mut smallest) = {
      let state = self.state.read();
      let mut expired = Vec::new();
      let mut smallest: Option<Duration> = None;

      for item in state.items.values() {
        match item.remaining(now) {
          None => {}
          Some(left) if left.is_zero() => expired.push(item.clone()),
          Some(left) => smallest = Some(smallest.map_or(left, |s| s.min(left))),
        }
      }

      (
        state.cleanup_interval,
        state.insert_epoch,
        expired,
        smallest,
      )
    };

    if armed_interval.is_zero() {
      self.log(format_args!("Expiration check installed for table {}", self.name));
    } else {
      self.log(format_args!(
        "Expiration check triggered after {:?} for table {}",
        armed_interval, self.name
      ));
    }

    for item in expired {
      // A keep-alive may have landed since the scan.
      if let Some(left) = item.remaining(Instant::now()).filter(|left| !left.is_zero()) {
        smallest = Some(smallest.map_or(left, |s| s.min(left)));
        continue;
      }

      match self.remove(item.key(), Some(&item), RemovalCause::Expired) {
        Ok(_) => {}
        Err(CacheError::KeyNotFound) => {
          tracing::trace!(table = %self.name, "expired item was already removed");
        }
      }
    }
    Metrics::record(&self.metrics.sweeps);

    let next = smallest.unwrap_or(Duration::ZERO);
    let mut state = self.state.write();
    state.cleanup_interval = next;
    if next.is_zero() {
      self.sweeper.disarm();
    } else {
      self.sweeper.arm_at(now + next);
    }

    // An expiring item inserted after the scan is not covered by `next`.
    if state.insert_epoch != scanned_epoch {
      self.sweeper.trigger();
    }
  }

  /// Drops every item and leaves the sweeper dormant. No removal hooks run.
  pub(crate) fn flush(&self) {
    let items = {
      let mut state = self.state.write();
      state.cleanup_interval = Duration::ZERO;
      self.sweeper.disarm();
      mem::take(&mut state.items)
    };
    self.log(format_args!(
      "Flushing {} items from table {}",
      items.len(),
      self.name
    ));
  }

  /// Clones the handles of all items, so they can be inspected without the lock.
  pub(crate) fn snapshot(&self) -> Vec<Arc<CacheItem<K, V>>> {
    self.state.read().items.values().cloned().collect()
  }
}
