//! Logging for compile and guard operations
//!
//! `init(profile)` installs the subscriber once per process; later calls are
//! no-ops. The `log_op_*` macros emit start, end and error events that share the
//! `component`, `op` and `event` fields, so a site's compile can be followed
//! from its start event to the evaluator kind it produced. Tests swap the
//! subscriber for an in-memory capture.
//!
//! ```rust
//! use keyforge_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
