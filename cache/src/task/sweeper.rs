use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};

/// The pending work of a sweeper. There is only ever one deadline.
#[derive(Debug, Default)]
struct Schedule {
  /// When the armed timer fires. `None` while dormant.
  deadline: Option<Instant>,
  /// A sweep was requested to run as soon as possible.
  rerun: bool,
  stopped: bool,
}

#[derive(Debug, Default)]
struct Timer {
  schedule: Mutex<Schedule>,
  wakeup: Condvar,
}

impl Timer {
  /// Blocks until a sweep is due. Returns `false` once the sweeper is stopped.
  fn wait_for_sweep(&self) -> bool {
    let mut schedule = self.schedule.lock();
    loop {
      if schedule.stopped {
        return false;
      }
      if schedule.rerun {
        schedule.rerun = false;
        schedule.deadline = None;
        return true;
      }
      match schedule.deadline {
        Some(deadline) if Instant::now() >= deadline => {
          schedule.deadline = None;
          return true;
        }
        Some(deadline) => {
          self.wakeup.wait_until(&mut schedule, deadline);
        }
        None => self.wakeup.wait(&mut schedule),
      }
    }
  }
}

/// The single expiration timer of a cache table.
///
/// A dedicated thread sleeps until the armed deadline passes or a sweep is
/// requested, then runs the sweep closure. The sweep re-arms the timer itself,
/// so callers that trigger a sweep never run it on their own thread.
#[derive(Debug, Default)]
pub(crate) struct Sweeper {
  timer: Arc<Timer>,
  handle: OnceCell<JoinHandle<()>>, // Detached; the thread exits once stopped.
}

impl Sweeper {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Spawns the sweeper thread for `table_name`. Later calls are no-ops.
  ///
  /// `sweep` returns `false` when its table is gone, which ends the thread.
  pub(crate) fn start<F>(&self, table_name: &str, sweep: F) -> io::Result<()>
  where
    F: Fn() -> bool + Send + 'static,
  {
    if self.handle.get().is_some() {
      return Ok(());
    }
    let timer = self.timer.clone();

    let handle = thread::Builder::new()
      .name(format!("fibre-sweep-{table_name}"))
      .spawn(move || {
        while timer.wait_for_sweep() {
          if !sweep() {
            break;
          }
        }
      })?;

    let _ = self.handle.set(handle);
    Ok(())
  }

  /// Arms the timer to fire at `deadline`, replacing any pending deadline.
  pub(crate) fn arm_at(&self, deadline: Instant) {
    self.timer.schedule.lock().deadline = Some(deadline);
    self.timer.wakeup.notify_one();
  }

  /// Arms the timer to fire `interval` from now.
  #[cfg(test)]
  pub(crate) fn arm(&self, interval: std::time::Duration) {
    self.arm_at(Instant::now() + interval);
  }

  /// Cancels the pending deadline and any requested sweep, leaving the
  /// sweeper dormant.
  pub(crate) fn disarm(&self) {
    let mut schedule = self.timer.schedule.lock();
    schedule.deadline = None;
    schedule.rerun = false;
  }

  /// Requests a sweep as soon as possible.
  ///
  /// The request survives a concurrent `arm_at`, so a sweep that is already
  /// running cannot swallow it.
  pub(crate) fn trigger(&self) {
    self.timer.schedule.lock().rerun = true;
    self.timer.wakeup.notify_one();
  }

  pub(crate) fn is_armed(&self) -> bool {
    self.timer.schedule.lock().deadline.is_some()
  }

  /// Signals the sweeper thread to stop.
  pub(crate) fn stop(&self) {
    self.timer.schedule.lock().stopped = true;
    self.timer.wakeup.notify_one();
  }
}
