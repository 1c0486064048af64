use crate::item::CacheItem;

use std::fmt;
use std::sync::Arc;

/// Describes why an item is being removed from a table.
///
/// Removal hooks fire on every removal path, so the cause is the only way
/// for a hook to tell an idle expiry apart from an explicit `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
  /// The item stayed idle for longer than its life span.
  Expired,
  /// The item was removed with `CacheTable::delete`.
  Deleted,
}

impl fmt::Display for RemovalCause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RemovalCause::Expired => write!(f, "expired after idling past its life span"),
      RemovalCause::Deleted => write!(f, "explicitly deleted"),
    }
  }
}

/// Called after an item has been inserted into a table.
pub type AddedItemCallback<K, V> = Arc<dyn Fn(&CacheItem<K, V>) + Send + Sync>;

/// Called right before an item is removed from a table.
pub type AboutToDeleteCallback<K, V> = Arc<dyn Fn(&CacheItem<K, V>, RemovalCause) + Send + Sync>;

/// Called with the item's key right before that item is removed from its table.
pub type AboutToExpireCallback<K> = Arc<dyn Fn(&K, RemovalCause) + Send + Sync>;
