use std::io;

use thiserror::Error;

/// Errors returned by operations on a `CacheTable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheError {
  /// The key is not present in the table, and no configured loader supplied
  /// a value for it.
  #[error("key not found in cache table")]
  KeyNotFound,
}

/// Errors that can occur when building a cache table.
#[derive(Debug, Error)]
pub enum BuildError {
  /// Every table is addressed by its name, so it cannot be empty.
  #[error("cache table name cannot be empty")]
  EmptyName,
  /// The background thread that runs expiration sweeps could not be started.
  #[error("failed to spawn the expiration sweeper thread")]
  SpawnSweeper(#[source] io::Error),
}

/// Errors returned when resolving a table through a `Registry`.
#[derive(Debug, Error)]
pub enum RegistryError {
  #[error(transparent)]
  Build(#[from] BuildError),
  /// The name is already bound to a table with different key or value types.
  #[error("cache table '{name}' is registered with different key/value types")]
  TypeMismatch { name: String },
}
