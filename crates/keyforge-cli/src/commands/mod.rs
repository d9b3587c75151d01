pub mod classify;
pub mod eval;
