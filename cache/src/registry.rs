//! Named cache tables.

use crate::builder::CacheTableBuilder;
use crate::error::RegistryError;
use crate::table::CacheTable;

use std::any::Any;
use std::hash::Hash;

use dashmap::DashMap;
use once_cell::sync::Lazy;

// The process-wide registry, created on its first access.
static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

/// A mapping from names to cache tables.
///
/// A name is bound to one table for the lifetime of the registry: asking for
/// it again yields a handle to the same table, as long as the key and value
/// types match.
#[derive(Default)]
pub struct Registry {
  tables: DashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the table called `name`, creating an empty one on first use.
  pub fn table<K, V>(&self, name: &str) -> Result<CacheTable<K, V>, RegistryError>
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
  {
    self.table_with(name, |builder| builder)
  }

  /// Returns the table called `name`, building it with `configure` on first use.
  ///
  /// `configure` is ignored when the table already exists. It may call back
  /// into the registry.
  pub fn table_with<K, V, F>(
    &self,
    name: &str,
    configure: F,
  ) -> Result<CacheTable<K, V>, RegistryError>
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    F: FnOnce(CacheTableBuilder<K, V>) -> CacheTableBuilder<K, V>,
  {
    if let Some(existing) = self.tables.get(name) {
      return downcast(name, existing.value().as_ref());
    }

    // Built without holding a map guard, so `configure` may use the registry.
    // If another caller registered the name meanwhile, its table wins.
    let table = configure(CacheTableBuilder::new(name)).build()?;
    let stored = self
      .tables
      .entry(name.to_owned())
      .or_insert_with(|| Box::new(table) as Box<dyn Any + Send + Sync>);
    downcast(name, stored.value().as_ref())
  }

  pub fn contains(&self, name: &str) -> bool {
    self.tables.contains_key(name)
  }

  /// Forgets the table called `name`. Outstanding handles keep it alive.
  pub fn remove(&self, name: &str) -> bool {
    self.tables.remove(name).is_some()
  }

  pub fn len(&self) -> usize {
    self.tables.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tables.is_empty()
  }
}

fn downcast<K: 'static, V: 'static>(
  name: &str,
  table: &(dyn Any + Send + Sync),
) -> Result<CacheTable<K, V>, RegistryError> {
  table
    .downcast_ref::<CacheTable<K, V>>()
    .cloned()
    .ok_or_else(|| RegistryError::TypeMismatch {
      name: name.to_owned(),
    })
}

/// Provides a reference to the process-wide registry.
pub fn global() -> &'static Registry {
  &GLOBAL_REGISTRY
}

/// Returns the process-wide table called `name`, creating it on first use.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// let users = fibre_cachetable::cache::<u64, String>("users").unwrap();
/// users.add(1, Duration::ZERO, "ada".to_string());
///
/// let again = fibre_cachetable::cache::<u64, String>("users").unwrap();
/// assert_eq!(again.value(&1).unwrap().data(), "ada");
/// ```
pub fn cache<K, V>(name: &str) -> Result<CacheTable<K, V>, RegistryError>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  global().table(name)
}
