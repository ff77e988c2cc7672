//! Dial metrics.
//!
//! # Metrics
//! - `rpc_dial_attempts_total` (counter): individual connect + handshake attempts, by outcome
//! - `rpc_dial_results_total` (counter): orchestrated dials, by mode and result
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; the host application installs the recorder
//! - Outcome labels come from `DialError::kind`, keeping cardinality bounded

/// Record the outcome of one low-level attempt (`"success"` or an error kind).
pub fn record_dial_attempt(outcome: &'static str) {
    metrics::counter!("rpc_dial_attempts_total", "outcome" => outcome).increment(1);
}

/// Record the final result of an orchestrated dial.
pub fn record_dial_result(fail_fast: bool, result: &'static str) {
    let mode = if fail_fast { "fail_fast" } else { "retry" };
    metrics::counter!("rpc_dial_results_total", "mode" => mode, "result" => result).increment(1);
}
