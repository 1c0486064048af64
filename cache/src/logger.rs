use std::fmt;

/// A sink for a table's diagnostic lines.
///
/// Every line is also emitted as a `tracing` event, so a sink is only needed
/// when a caller wants the lines routed somewhere of its own.
pub trait LogSink: Send + Sync {
  fn log(&self, line: &str);
}

impl<F> LogSink for F
where
  F: Fn(&str) + Send + Sync,
{
  fn log(&self, line: &str) {
    self(line)
  }
}

/// Emits one diagnostic line for `table`, to `tracing` and to the optional sink.
pub(crate) fn emit(table: &str, sink: Option<&dyn LogSink>, args: fmt::Arguments<'_>) {
  tracing::debug!(table, "{}", args);
  if let Some(sink) = sink {
    sink.log(&args.to_string());
  }
}
