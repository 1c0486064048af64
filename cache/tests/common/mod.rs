#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

use fibre_cachetable::CacheTable;

/// Routes the tables' `tracing` output to the test harness.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

pub fn build_test_table<V>(name: &str) -> CacheTable<&'static str, V>
where
  V: Send + Sync + 'static,
{
  init_tracing();
  CacheTable::new(name).unwrap()
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
  let start = Instant::now();
  while start.elapsed() < timeout {
    if condition() {
      return true;
    }
    thread::sleep(Duration::from_millis(1));
  }
  condition()
}
