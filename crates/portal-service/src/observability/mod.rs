//! Metrics for the Portal API.
//!
//! All metrics follow Prometheus naming conventions:
//! - `portal_` prefix
//! - `_total` suffix for counters
//!
//! Labels are bounded to prevent cardinality explosion: every `outcome` /
//! `status` label takes a small fixed set of values chosen in code.

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the process-wide Prometheus recorder and return the handle used
/// to render `/metrics`.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a signup attempt outcome.
///
/// Metric: `portal_signups_total`
/// Labels: `outcome` (success, already_exists, weak_password, invalid_email)
pub fn record_signup(outcome: &str) {
    counter!("portal_signups_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a login attempt outcome.
///
/// Metric: `portal_logins_total`
/// Labels: `outcome` (success, failure)
///
/// Failure reasons are deliberately not labeled: login failures are
/// indistinguishable to callers and the metrics keep the same property.
pub fn record_login(outcome: &str) {
    counter!("portal_logins_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record an email verification outcome.
///
/// Metric: `portal_verifications_total`
/// Labels: `outcome` (success, invalid)
pub fn record_verification(outcome: &str) {
    counter!("portal_verifications_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a bearer token validation result.
///
/// Metric: `portal_token_validations_total`
/// Labels: `status` (success, error)
pub fn record_token_validation(status: &str) {
    counter!("portal_token_validations_total", "status" => status.to_string()).increment(1);
}

/// Record an outbound verification email delivery result.
///
/// Metric: `portal_email_deliveries_total`
/// Labels: `status` (success, error, disabled)
pub fn record_email_delivery(status: &str) {
    counter!("portal_email_deliveries_total", "status" => status.to_string()).increment(1);
}
