/*!
 * Timeout Policies
 * Per-operation budgets and retry-on-timeout for process-guarded calls
 */

mod config;
mod retry;

pub use config::{RetryConfig, TimeoutConfig};
pub use retry::{RetryPolicy, RetryState};
