/*!
 * Monitoring
 * Guard counters and structured tracing
 */

mod metrics;
mod tracer;

pub use metrics::{GuardMetrics, GuardStats};
pub use tracer::{generate_trace_id, init_tracing, span_operation, OperationSpan};
