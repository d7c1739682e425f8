/*!
 * Guard tests entry point
 */

#[path = "guard/thread_guard_test.rs"]
mod thread_guard_test;

#[path = "guard/retry_test.rs"]
mod retry_test;
