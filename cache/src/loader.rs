use crate::item::CacheItem;

use std::any::Any;
use std::sync::Arc;

/// A loader invoked by `CacheTable::value_with` when a key is missing.
///
/// It receives the requested key and the caller's extra arguments, and
/// returns the item to insert, or `None` to report the key as not found.
/// The returned item is stored under its own key.
pub(crate) type DataLoader<K, V> =
  Arc<dyn Fn(&K, &[&dyn Any]) -> Option<CacheItem<K, V>> + Send + Sync>;

/// Wraps a loader closure into the shared form stored by a table.
pub(crate) fn data_loader<K, V, F>(f: F) -> DataLoader<K, V>
where
  F: Fn(&K, &[&dyn Any]) -> Option<CacheItem<K, V>> + Send + Sync + 'static,
{
  Arc::new(f)
}
