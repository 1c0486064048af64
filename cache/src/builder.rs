use crate::error::BuildError;
use crate::item::CacheItem;
use crate::listener::{AboutToDeleteCallback, AddedItemCallback, RemovalCause};
use crate::loader::{data_loader, DataLoader};
use crate::logger::LogSink;
use crate::shared::{TableShared, TableState};
use crate::table::CacheTable;

use core::fmt;
use std::any::Any;
use std::hash::Hash;
use std::sync::Arc;

/// A builder for creating `CacheTable` instances.
pub struct CacheTableBuilder<K, V> {
  name: String,
  loader: Option<DataLoader<K, V>>,
  added_item: Vec<AddedItemCallback<K, V>>,
  about_to_delete: Vec<AboutToDeleteCallback<K, V>>,
  logger: Option<Arc<dyn LogSink>>,
}

// Manual Debug implementation for CacheTableBuilder.
impl<K, V> fmt::Debug for CacheTableBuilder<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheTableBuilder")
      .field("name", &self.name)
      .field("has_loader", &self.loader.is_some())
      .field("added_item_callbacks", &self.added_item.len())
      .field("about_to_delete_callbacks", &self.about_to_delete.len())
      .field("has_logger", &self.logger.is_some())
      .finish()
  }
}

impl<K, V> CacheTableBuilder<K, V> {
  /// Creates a builder for a table called `name`.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      loader: None,
      added_item: Vec::new(),
      about_to_delete: Vec::new(),
      logger: None,
    }
  }

  /// Sets the loader asked for missing keys.
  ///
  /// The closure receives the key and the extra arguments given to
  /// `value_with`, and returns the item to store, or `None` to report a miss.
  pub fn data_loader<F>(mut self, f: F) -> Self
  where
    F: Fn(&K, &[&dyn Any]) -> Option<CacheItem<K, V>> + Send + Sync + 'static,
  {
    self.loader = Some(data_loader(f));
    self
  }

  /// Adds a callback run after every insert. Can be called repeatedly.
  pub fn added_item_callback<F>(mut self, f: F) -> Self
  where
    F: Fn(&CacheItem<K, V>) + Send + Sync + 'static,
  {
    self.added_item.push(Arc::new(f));
    self
  }

  /// Adds a callback run right before any item is removed. Can be called
  /// repeatedly.
  pub fn about_to_delete_item_callback<F>(mut self, f: F) -> Self
  where
    F: Fn(&CacheItem<K, V>, RemovalCause) + Send + Sync + 'static,
  {
    self.about_to_delete.push(Arc::new(f));
    self
  }

  /// Routes the table's diagnostic lines to `sink`, in addition to `tracing`.
  pub fn logger<S>(mut self, sink: S) -> Self
  where
    S: LogSink + 'static,
  {
    self.logger = Some(Arc::new(sink));
    self
  }
}

impl<K, V> CacheTableBuilder<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Builds the table and starts its sweeper thread.
  pub fn build(self) -> Result<CacheTable<K, V>, BuildError> {
    self.validate()?;

    let state = TableState {
      loader: self.loader,
      added_item: self.added_item,
      about_to_delete: self.about_to_delete,
      ..TableState::default()
    };
    let shared = Arc::new(TableShared::new(self.name, state, self.logger));

    // The sweeper only holds a weak handle, so dropping the last table
    // handle ends the thread.
    let weak = Arc::downgrade(&shared);
    shared
      .sweeper
      .start(&shared.name, move || match weak.upgrade() {
        Some(table) => {
          table.expiration_check();
          true
        }
        None => false,
      })
      .map_err(BuildError::SpawnSweeper)?;

    tracing::debug!(table = %shared.name, "cache table created");
    Ok(CacheTable { shared })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.name.is_empty() {
      return Err(BuildError::EmptyName);
    }
    Ok(())
  }
}
