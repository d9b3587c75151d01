//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names identical across every log site.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_INVOCATION_ID: &str = "invocation_id";

// Compilation identifiers
pub const FIELD_SITE: &str = "site";
pub const FIELD_TEMPLATE: &str = "template";
pub const FIELD_EVALUATOR: &str = "evaluator";

// Guard driver
pub const FIELD_RESOURCE_INDEX: &str = "resource_index";
pub const FIELD_RESOURCE_COUNT: &str = "resource_count";
pub const FIELD_PHASE: &str = "phase";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
