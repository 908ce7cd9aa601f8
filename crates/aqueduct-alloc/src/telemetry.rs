// SPDX-License-Identifier: Apache-2.0

// Telemetry helpers for JSONL logging when the `telemetry` feature is enabled.
// Manually formats JSON to avoid non-deterministic serde_json dependency.

/// Soft duration budget for one allocation run, microseconds. Runs over
/// budget are flagged in the emitted event, never aborted.
#[cfg(feature = "telemetry")]
pub const ALLOCATION_BUDGET_MICROS: u128 = 5_000_000;

#[cfg(feature = "telemetry")]
fn ts_micros() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros()
}

/// Emits an allocation-complete telemetry event.
///
/// Logs the point counts and elapsed wall time as a JSON line to stdout
/// when the `telemetry` feature is enabled. Best-effort: I/O errors are
/// ignored and timestamps fall back to 0 on clock errors.
#[cfg(feature = "telemetry")]
pub fn allocation_complete(points: usize, connected: usize, elapsed_micros: u128) {
    use std::io::Write as _;
    // Manually format JSON to avoid serde_json dependency
    let mut out = std::io::stdout().lock();
    let _ = write!(
        out,
        r#"{{"timestamp_micros":{},"event":"allocation_complete","points":{},"connected":{},"elapsed_micros":{},"over_budget":{}}}"#,
        ts_micros(),
        points,
        connected,
        elapsed_micros,
        elapsed_micros > ALLOCATION_BUDGET_MICROS
    );
    let _ = out.write_all(b"\n");
}
