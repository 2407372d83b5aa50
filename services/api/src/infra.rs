use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use toolworks::workflows::rental::{StaticRateTable, DAILY_LATE_FEE_RATE};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Default rates used when no external rate source is wired in.
pub(crate) fn default_rate_table() -> StaticRateTable {
    StaticRateTable::new().with_rate(DAILY_LATE_FEE_RATE, 3_000)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
