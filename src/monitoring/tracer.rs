/*!
 * Operation Tracing
 * Subscriber setup and per-operation spans using the tracing crate
 *
 * Every facade operation opens an [`OpSpan`] carrying a trace id so that the
 * per-branch events it emits (skips, clones, broadcast failures) can be
 * correlated in the log.
 */

use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::core::errors::PoolResult;
use crate::core::limits::SLOW_OPERATION_MS;
use crate::core::types::Caller;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - POOLFS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("POOLFS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    // A subscriber may already be installed (tests, embedding)
    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if installed.is_ok() {
        info!(json = use_json, "tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span around one pool operation
pub struct OpSpan {
    span: Span,
    start: Instant,
    op: &'static str,
    trace_id: String,
}

impl OpSpan {
    pub fn new(op: &'static str, path: &Path, caller: Caller) -> Self {
        let trace_id = generate_trace_id();
        let span = span!(
            Level::DEBUG,
            "op",
            trace_id = %trace_id,
            op,
            path = %path.display(),
            uid = caller.uid,
            gid = caller.gid,
            pid = caller.pid,
            branch = tracing::field::Empty,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            op,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Enter the span on the current thread
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the branch an operation settled on
    pub fn record_branch(&self, root: &Path) {
        self.span.record("branch", tracing::field::display(root.display()));
    }

    /// Record the outcome; failures carry their errno
    pub fn record_result<T>(&self, result: &PoolResult<T>) {
        match result {
            Ok(_) => {
                self.span.record("result", "ok");
            }
            Err(e) => {
                self.span.record("result", "error");
                self.span.record("errno", e.errno());
                debug!(parent: &self.span, error = %e, "{} failed", self.op);
            }
        }
    }
}

impl Drop for OpSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        self.span.record("duration_us", elapsed.as_micros() as u64);

        if elapsed.as_millis() > SLOW_OPERATION_MS {
            warn!(
                parent: &self.span,
                op = self.op,
                duration_ms = elapsed.as_millis() as u64,
                slow = true,
                "slow operation detected"
            );
        }
    }
}

/// Helper to open an operation span
#[inline]
pub fn span_op(op: &'static str, path: &Path, caller: Caller) -> OpSpan {
    OpSpan::new(op, path, caller)
}
