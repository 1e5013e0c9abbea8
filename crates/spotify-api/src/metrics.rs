//! Request engine counters
//!
//! - `spotify_requests_total` (counter): label `status`
//! - `spotify_retries_total` (counter): label `reason` (`forbidden`, `status`, `transport`)
//! - `spotify_token_refreshes_total` (counter)
//!
//! Without an installed recorder these are no-ops.

pub fn record_response(status: u16) {
    metrics::counter!("spotify_requests_total", "status" => status.to_string()).increment(1);
}

pub fn record_retry(reason: &'static str) {
    metrics::counter!("spotify_retries_total", "reason" => reason).increment(1);
}

pub fn record_refresh() {
    metrics::counter!("spotify_token_refreshes_total").increment(1);
}
