/*!
 * Process Isolation
 * Hard-timeout execution of filesystem operations in worker processes
 */

mod supervisor;
mod types;
pub mod worker;
mod worker_supervisor;

pub use supervisor::{ProcessSupervisor, StatusSupervisor, SupervisorError};
pub use types::WorkerConfig;
pub use worker_supervisor::WorkerSupervisor;
