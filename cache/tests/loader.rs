mod common;

use common::{init_tracing, wait_until};
use fibre_cachetable::{CacheError, CacheItem, CacheTable};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_loader_fills_misses() {
  init_tracing();
  // A counter to see how many times the loader is called.
  let load_count = Arc::new(AtomicUsize::new(0));

  let table = CacheTable::<i32, i32>::builder("loader_basic")
    .data_loader({
      let load_count = load_count.clone();
      move |key: &i32, _args: &[&dyn Any]| {
        load_count.fetch_add(1, Ordering::SeqCst);
        Some(CacheItem::new(*key, Duration::ZERO, key * 10))
      }
    })
    .build()
    .unwrap();

  // First lookup misses and is answered by the loader.
  let item = table.value(&5).unwrap();
  assert_eq!(*item.data(), 50);
  assert_eq!(load_count.load(Ordering::SeqCst), 1);
  assert_eq!(table.count(), 1);

  // Second lookup is a plain hit.
  let item = table.value(&5).unwrap();
  assert_eq!(*item.data(), 50);
  assert_eq!(item.access_count(), 1);
  assert_eq!(load_count.load(Ordering::SeqCst), 1, "loader should not run again");

  let metrics = table.metrics();
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.loads, 1);
  assert_eq!(metrics.inserts, 1);
}

#[test]
fn test_loader_declining_is_a_miss() {
  let table = CacheTable::<i32, i32>::builder("loader_declines")
    .data_loader(|key: &i32, _args: &[&dyn Any]| {
      (*key % 2 == 0).then(|| CacheItem::new(*key, Duration::ZERO, *key))
    })
    .build()
    .unwrap();

  assert_eq!(table.value(&3).unwrap_err(), CacheError::KeyNotFound);
  assert!(table.value(&4).is_ok());
  assert_eq!(table.count(), 1);
  assert_eq!(table.metrics().loads, 1);
}

#[test]
fn test_loader_receives_extra_arguments() {
  let table = CacheTable::<String, String>::builder("loader_args")
    .data_loader(|key: &String, args: &[&dyn Any]| {
      let suffix = args.first()?.downcast_ref::<&str>()?;
      Some(CacheItem::new(
        key.clone(),
        Duration::ZERO,
        format!("{key}-{suffix}"),
      ))
    })
    .build()
    .unwrap();

  let key = "user".to_string();
  assert!(table.value(&key).is_err(), "no argument, nothing to load");

  let item = table.value_with(&key, &[&"admin"]).unwrap();
  assert_eq!(item.data(), "user-admin");

  // Once stored, the arguments no longer matter.
  let item = table.value_with(&key, &[&42_u32]).unwrap();
  assert_eq!(item.data(), "user-admin");
}

#[test]
fn test_loaded_item_expires() {
  let table = CacheTable::<u32, u32>::builder("loader_expiring")
    .data_loader(|key: &u32, _args: &[&dyn Any]| {
      Some(CacheItem::new(*key, Duration::from_millis(30), *key))
    })
    .build()
    .unwrap();

  table.value(&1).unwrap();
  assert!(wait_until(Duration::from_secs(2), || !table.exists(&1)));
  assert_eq!(table.metrics().expirations, 1);
}

#[test]
fn test_loader_item_runs_added_callbacks() {
  let added = Arc::new(AtomicUsize::new(0));
  let table = CacheTable::<u32, u32>::builder("loader_added_callback")
    .data_loader(|key: &u32, _args: &[&dyn Any]| Some(CacheItem::new(*key, Duration::ZERO, 0)))
    .added_item_callback({
      let added = added.clone();
      move |_| {
        added.fetch_add(1, Ordering::SeqCst);
      }
    })
    .build()
    .unwrap();

  table.value(&7).unwrap();
  table.value(&7).unwrap();
  assert_eq!(added.load(Ordering::SeqCst), 1);
}

#[test]
fn test_set_and_remove_loader_at_runtime() {
  let table = CacheTable::<u32, u32>::new("loader_runtime").unwrap();
  assert!(table.value(&1).is_err());

  table.set_data_loader(|key: &u32, _args: &[&dyn Any]| Some(CacheItem::new(*key, Duration::ZERO, key + 1)));
  assert_eq!(*table.value(&1).unwrap().data(), 2);

  table.remove_data_loader();
  assert!(table.value(&2).is_err());
  assert!(table.value(&1).is_ok(), "already loaded items stay");
}

#[test]
fn test_loaded_item_is_stored_under_requested_key() {
  let load_count = Arc::new(AtomicUsize::new(0));
  let table = CacheTable::<&str, i32>::builder("loader_rekey")
    .data_loader({
      let load_count = load_count.clone();
      move |_key, _args| {
        load_count.fetch_add(1, Ordering::SeqCst);
        Some(CacheItem::new("other", Duration::ZERO, 7))
      }
    })
    .build()
    .unwrap();

  let item = table.value(&"wanted").unwrap();
  assert_eq!(*item.key(), "wanted");
  assert!(table.exists(&"wanted"));
  assert!(!table.exists(&"other"));

  let again = table.value(&"wanted").unwrap();
  assert_eq!(*again.data(), 7);
  assert_eq!(load_count.load(Ordering::SeqCst), 1, "second lookup is a hit");
  assert_eq!(table.metrics().hits, 1);
}
