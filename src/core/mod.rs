/*!
 * Core Module
 * Error types, timeout guards and shared limits
 */

pub mod errors;
pub mod guard;
pub mod limits;

// Re-export for convenience
pub use errors::*;
pub use guard::{
    FailureCause, GuardOutcome, SoftTimeout, StatusPayload, ThreadTimeoutGuard, TimeoutContext,
    TimeoutSpec,
};
