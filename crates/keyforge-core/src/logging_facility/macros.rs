//! Operation events for compile and guard runs.
//!
//! Every event carries `component`, `op` and an `event` marker from
//! [`crate::types::schema`]. Start and end are debug-level since they fire once
//! per call site; failures are errors.

/// `op.start`, plus any extra fields.
///
/// ```
/// # use keyforge_core::log_op_start;
/// log_op_start!("compile", site = "OrderService::place", template = "o_{id}");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_START,
            $($($field)*)?
        );
    };
}

/// `op.end` with the elapsed milliseconds.
///
/// ```
/// # use keyforge_core::log_op_end;
/// log_op_end!("compile", duration_ms = 0, evaluator = "constant");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        );
    };
}

/// `op.end_error`. `$err` is anything convertible into `KfError`; its kind,
/// stable code and template (when known) are attached.
///
/// ```
/// # use keyforge_core::log_op_error;
/// # use keyforge_core::errors::KeyForgeError;
/// log_op_error!("compile", KeyForgeError::EmptyTemplate, duration_ms = 1, site = "Svc::run");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let kf_err: $crate::errors::KfError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?kf_err.kind(),
            err_code = kf_err.code(),
            err_template = kf_err.template().unwrap_or_default(),
            $($($field)*)?
        );
    }};
}
