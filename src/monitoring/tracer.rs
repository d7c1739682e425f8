/*!
 * Structured Tracing
 * Tracing setup and per-call spans for guarded filesystem operations
 *
 * Features:
 * - Trace ID per guarded call for log correlation
 * - JSON-formatted logs for structured parsing
 * - Slow-call warnings when a span closes
 */

use crate::core::limits::SLOW_CALL_THRESHOLD;
use std::time::{Duration, Instant};
use tracing::{debug, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing on stderr
///
/// Stdout is reserved for command output and the worker protocol.
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SAFEFS_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("SAFEFS_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one guarded call, retries included
pub struct OperationSpan {
    span: Span,
    start: Instant,
    trace_id: String,
    operation: &'static str,
    slow_threshold: Duration,
}

impl OperationSpan {
    pub fn new(operation: &'static str, isolation: &'static str, reference: &str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::INFO,
            "guarded_call",
            trace_id = %trace_id,
            operation,
            isolation,
            reference,
            result = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
            operation,
            slow_threshold: SLOW_CALL_THRESHOLD,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Record the call result
    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    /// Enter the span context; guard threads pick it up from here
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for OperationSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_ms", duration.as_millis() as u64);

        if duration > self.slow_threshold {
            warn!(
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow guarded call"
            );
        } else {
            debug!(
                trace_id = %self.trace_id,
                operation = self.operation,
                duration_us = duration.as_micros() as u64,
                "guarded call completed"
            );
        }
    }
}

/// Helper to create an operation span
#[inline]
pub fn span_operation(operation: &'static str, isolation: &'static str, reference: &str) -> OperationSpan {
    OperationSpan::new(operation, isolation, reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_are_unique() {
        assert_ne!(generate_trace_id(), generate_trace_id());
        assert_eq!(generate_trace_id().len(), 36);
    }

    #[test]
    fn test_span_lifecycle() {
        let span = span_operation("file_size", "thread", "job-7");
        assert_eq!(span.trace_id().len(), 36);
        {
            let _entered = span.enter();
            span.record_result(true);
        }
        drop(span);
    }
}
