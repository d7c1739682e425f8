/*!
 * Process subsystem tests entry point
 */

#[cfg(unix)]
#[path = "process/worker_process_test.rs"]
mod worker_process_test;
