mod common;

use common::build_test_table;
use fibre_cachetable::{BuildError, CacheError, CacheTable};
use std::time::Duration;

#[test]
fn test_add_and_value() {
  let table = build_test_table::<String>("basic_add_and_value");

  let added = table.add("key", Duration::ZERO, "value".to_string());
  assert_eq!(added.key(), &"key");
  assert_eq!(added.access_count(), 0);

  let item = table.value(&"key").unwrap();
  assert_eq!(item.data(), "value");
  assert_eq!(item.access_count(), 1);
  assert!(item.accessed_on() >= item.created_on());
  assert_eq!(table.count(), 1);
}

#[test]
fn test_value_of_missing_key() {
  let table = build_test_table::<i32>("basic_missing");
  assert_eq!(table.value(&"nope").unwrap_err(), CacheError::KeyNotFound);
  assert_eq!(table.metrics().misses, 1);
}

#[test]
fn test_readd_replaces_value() {
  let table = build_test_table::<i32>("basic_readd");
  table.add("key", Duration::ZERO, 1);
  table.add("key", Duration::ZERO, 2);

  assert_eq!(table.count(), 1);
  assert_eq!(*table.value(&"key").unwrap().data(), 2);
}

#[test]
fn test_delete() {
  let table = build_test_table::<i32>("basic_delete");
  table.add("a", Duration::ZERO, 1);
  table.add("b", Duration::ZERO, 2);

  let removed = table.delete(&"a").unwrap();
  assert_eq!(*removed.data(), 1);
  assert_eq!(table.count(), 1);
  assert!(!table.exists(&"a"));

  assert_eq!(table.delete(&"a").unwrap_err(), CacheError::KeyNotFound);
  assert_eq!(table.metrics().deletions, 1);
}

#[test]
fn test_count_tracks_adds_and_deletes() {
  let table = CacheTable::<u32, u32>::new("basic_count").unwrap();
  for i in 0..100 {
    table.add(i, Duration::ZERO, i);
  }
  let mut deleted = 0;
  for i in (0..100).step_by(3) {
    if table.delete(&i).is_ok() {
      deleted += 1;
    }
  }
  // Deleting an absent key changes nothing.
  assert!(table.delete(&1_000).is_err());
  assert_eq!(table.count(), 100 - deleted);
}

#[test]
fn test_exists_does_not_keep_alive() {
  let table = build_test_table::<i32>("basic_exists");
  let item = table.add("key", Duration::ZERO, 1);

  assert!(table.exists(&"key"));
  assert!(!table.exists(&"other"));
  assert_eq!(item.access_count(), 0);
  assert_eq!(item.accessed_on(), item.created_on());
}

#[test]
fn test_not_found_add() {
  let table = build_test_table::<i32>("basic_not_found_add");
  assert!(table.not_found_add("key", Duration::ZERO, 1));
  assert!(!table.not_found_add("key", Duration::ZERO, 2));

  assert_eq!(*table.value(&"key").unwrap().data(), 1);
  assert_eq!(table.metrics().inserts, 1);
}

#[test]
fn test_flush() {
  let table = build_test_table::<i32>("basic_flush");
  table.add("a", Duration::ZERO, 1);
  table.add("b", Duration::from_secs(60), 2);

  table.flush();

  assert_eq!(table.count(), 0);
  assert_eq!(table.cleanup_interval(), Duration::ZERO);
  assert!(table.value(&"b").is_err());

  // The table keeps working after a flush.
  table.add("c", Duration::ZERO, 3);
  assert_eq!(table.count(), 1);
}

#[test]
fn test_foreach_visits_every_item() {
  let table = CacheTable::<u32, u32>::new("basic_foreach").unwrap();
  for i in 0..10 {
    table.add(i, Duration::ZERO, i * 10);
  }

  let mut seen = Vec::new();
  table.foreach(|key, item| {
    assert_eq!(*item.data(), key * 10);
    seen.push(*key);
  });
  seen.sort_unstable();
  assert_eq!(seen, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_foreach_callback_may_use_the_table() {
  let table = CacheTable::<u32, u32>::new("basic_foreach_reentrant").unwrap();
  table.add(1, Duration::ZERO, 1);
  table.add(2, Duration::ZERO, 2);

  table.foreach(|key, _| {
    table.delete(key).unwrap();
  });
  assert_eq!(table.count(), 0);
}

#[test]
fn test_most_accessed() {
  let table = build_test_table::<i32>("basic_most_accessed");
  table.add("cold", Duration::ZERO, 0);
  table.add("warm", Duration::ZERO, 1);
  table.add("hot", Duration::ZERO, 2);

  for _ in 0..5 {
    table.value(&"hot").unwrap();
  }
  for _ in 0..2 {
    table.value(&"warm").unwrap();
  }

  let top: Vec<&str> = table
    .most_accessed(2)
    .iter()
    .map(|item| *item.key())
    .collect();
  assert_eq!(top, vec!["hot", "warm"]);
  assert_eq!(table.most_accessed(10).len(), 3);
  assert!(table.most_accessed(0).is_empty());
}

#[test]
fn test_metrics() {
  let table = build_test_table::<i32>("basic_metrics");
  table.add("a", Duration::ZERO, 1);
  table.value(&"a").unwrap();
  table.value(&"a").unwrap();
  let _ = table.value(&"b");
  table.delete(&"a").unwrap();

  let metrics = table.metrics();
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.hits, 2);
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.deletions, 1);
  assert_eq!(metrics.expirations, 0);
  assert!((metrics.hit_ratio - 2.0 / 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_table_name() {
  let table = build_test_table::<i32>("basic_name");
  assert_eq!(table.name(), "basic_name");
  assert_eq!(table.clone().name(), "basic_name");
}

#[test]
fn test_empty_name_is_rejected() {
  let result = CacheTable::<u32, u32>::new("");
  assert!(matches!(result, Err(BuildError::EmptyName)));
}
