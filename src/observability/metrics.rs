//! Counters and gauges for the identity core, emitted through the `metrics`
//! facade. Exporter wiring is the embedding application's concern; these
//! helpers only emit through whatever recorder the host installed.

use metrics::{counter, gauge};

/// Record an authentication attempt outcome.
///
/// `status` is one of: success, invalid_credentials, account_disabled,
/// session_not_found, session_expired.
pub fn record_authentication(status: &str) {
    let labels = [("status", status.to_string())];
    counter!("auth_attempts_total", &labels).increment(1);
}

/// Record an action token being created.
pub fn record_action_token_created() {
    counter!("action_tokens_created_total").increment(1);
}

/// Record an action token being revoked after use.
pub fn record_action_token_revoked() {
    counter!("action_tokens_revoked_total").increment(1);
}

/// Record expired action tokens removed by a purge sweep.
pub fn record_action_tokens_purged(count: u64) {
    counter!("action_tokens_purged_total").increment(count);
}

/// Record a session being created.
pub fn record_session_created() {
    counter!("sessions_created_total").increment(1);
}

/// Record a session being ended (logout or expiry sweep).
pub fn record_session_ended(count: u64) {
    counter!("sessions_ended_total").increment(count);
}

/// Update the active session gauge.
pub fn set_active_sessions(count: usize) {
    gauge!("sessions_active").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_helpers_do_not_panic_without_recorder() {
        // The metrics facade no-ops when no recorder is installed.
        record_authentication("success");
        record_action_token_created();
        record_action_token_revoked();
        record_action_tokens_purged(3);
        record_session_created();
        record_session_ended(1);
        set_active_sessions(7);
    }
}
