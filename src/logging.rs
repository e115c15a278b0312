//! Boundary-controlled logging.
//!
//! Hosts drive log verbosity through `safebridge_set_log_level` instead of
//! environment variables, since the library is usually loaded into a process
//! the host does not control. The first call installs a `tracing` subscriber
//! with a reloadable filter; later calls just swap the filter. Alongside the
//! console output a bounded in-process buffer keeps the most recent lines so
//! hosts without stderr access can pull them back through
//! `safebridge_get_logs`.

use crate::error::BridgeError;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Layer, Registry};

static RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Lines retained by the log buffer; older lines are evicted first
const LOG_BUFFER_CAP: usize = 256;

static LOG_BUFFER: Mutex<VecDeque<String>> = Mutex::new(VecDeque::new());

fn push_line(line: String) {
    let mut buf = LOG_BUFFER.lock().unwrap_or_else(|e| e.into_inner());
    if buf.len() == LOG_BUFFER_CAP {
        buf.pop_front();
    }
    buf.push_back(line);
}

/// Snapshot of the most recent log lines, oldest first. Empty until the
/// first `set_log_level` call installs the subscriber.
pub fn recent_logs() -> Vec<String> {
    let buf = LOG_BUFFER.lock().unwrap_or_else(|e| e.into_inner());
    buf.iter().cloned().collect()
}

/// Layer feeding formatted events into the bounded buffer.
struct BufferLayer;

impl<S: tracing::Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut line = format!("{} {}", meta.level(), meta.target());
        event.record(&mut LineVisitor(&mut line));
        push_line(line);
    }
}

struct LineVisitor<'a>(&'a mut String);

impl Visit for LineVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, " {value:?}");
        } else {
            let _ = write!(self.0, " {}={value:?}", field.name());
        }
    }
}

/// Set the active log filter, e.g. `"info"`, `"debug"`, or a full
/// `EnvFilter` directive like `"safebridge=trace"`.
///
/// Installing the subscriber can fail if the host process already set a
/// global default; that is reported as a backend error rather than ignored.
pub fn set_log_level(spec: &str) -> Result<(), BridgeError> {
    let filter = EnvFilter::try_new(spec)
        .map_err(|e| BridgeError::InvalidOptions(format!("log filter: {e}")))?;

    if let Some(handle) = RELOAD_HANDLE.get() {
        return handle.reload(filter).map_err(BridgeError::backend);
    }

    let (layer, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(layer)
        .with(BufferLayer)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(BridgeError::backend)?;

    // Lost race with another thread initializing: the subscriber installed
    // above won, so keep its handle.
    let _ = RELOAD_HANDLE.set(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_rejected() {
        let err = set_log_level("this is not [ a filter").unwrap_err();
        assert!(matches!(err, BridgeError::InvalidOptions(_)));
    }

    #[test]
    fn test_log_buffer_evicts_oldest() {
        for i in 0..2 * LOG_BUFFER_CAP {
            push_line(format!("buffer marker {i}"));
        }
        let logs = recent_logs();
        assert!(logs.len() <= LOG_BUFFER_CAP);
        let last = format!("buffer marker {}", 2 * LOG_BUFFER_CAP - 1);
        assert!(logs.iter().any(|l| l.contains(&last)));
        assert!(!logs.iter().any(|l| l == "buffer marker 0"));
    }

    #[test]
    fn test_set_then_reload() {
        // First call installs, second reloads; both succeed unless some other
        // test harness already claimed the global subscriber.
        if set_log_level("info").is_ok() {
            assert!(set_log_level("debug").is_ok());
        }
    }
}
