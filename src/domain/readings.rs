// Display-ready readings derived from a snapshot
use super::telemetry::MetricSnapshot;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How exact ties are rounded when trimming decimals. Rounding looks at the
/// exact binary value, so 1.45 (stored as 1.4499...) becomes 1.4 in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingMode {
    /// Ties away from zero: 12.25 -> 12.3
    #[default]
    HalfUp,
    /// Ties to even: 12.25 -> 12.2
    HalfEven,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

// None for NaN, infinities and magnitudes beyond 96 bits.
fn round_exact(value: f64, decimals: u32, mode: RoundingMode) -> Option<Decimal> {
    Decimal::from_f64_retain(value)
        .map(|exact| exact.round_dp_with_strategy(decimals, mode.strategy()))
}

pub fn round_to(value: f64, decimals: u32, mode: RoundingMode) -> f64 {
    round_exact(value, decimals, mode)
        .and_then(|rounded| rounded.to_f64())
        .unwrap_or(value)
}

pub fn format_fixed(value: f64, decimals: u32, mode: RoundingMode) -> String {
    match round_exact(value, decimals, mode) {
        Some(rounded) => format!("{:.*}", decimals as usize, rounded),
        None => format!("{:.*}", decimals as usize, value),
    }
}

pub fn format_uptime(uptime_seconds: u64) -> String {
    format!("{}m {}s", uptime_seconds / 60, uptime_seconds % 60)
}

/// Theoretical hash rate in GH/s from clock and core counts.
pub fn expected_hash_rate(snapshot: &MetricSnapshot) -> u64 {
    let cores = snapshot.small_core_count as f64 * snapshot.asic_count as f64;
    (snapshot.frequency * (cores / 1000.0)).floor().max(0.0) as u64
}

/// Stats page for pools that publish one per payout address.
pub fn pool_quick_link(stratum_url: &str, stratum_user: &str) -> Option<String> {
    let address = stratum_user.split('.').next().unwrap_or_default();
    if address.is_empty() {
        return None;
    }
    if stratum_url.contains("public-pool.io") {
        Some(format!("https://web.public-pool.io/#/app/{address}"))
    } else if stratum_url.contains("ocean.xyz") {
        Some(format!("https://ocean.xyz/stats/{address}"))
    } else if stratum_url.contains("solo.d-central.tech") {
        Some(format!("https://solo.d-central.tech/#/app/{address}"))
    } else if stratum_url.contains("solo.ckpool.org") {
        Some(format!("https://solo.ckpool.org/users/{address}"))
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readings {
    pub hash_rate_ths: String,
    pub expected_hash_rate_ghs: u64,
    pub temp_c: String,
    pub power_w: String,
    pub voltage_v: String,
    pub current_a: String,
    pub core_voltage_v: String,
    pub core_voltage_actual_v: String,
    pub uptime: String,
    pub best_diff: String,
    pub asic_model: String,
    pub autotune_preset: String,
    pub quick_link: Option<String>,
    pub captured_at_ms: i64,
}

impl Readings {
    pub fn from_snapshot(snapshot: &MetricSnapshot, mode: RoundingMode) -> Self {
        Self {
            hash_rate_ths: format_fixed(snapshot.hash_rate / 1000.0, 2, mode),
            expected_hash_rate_ghs: expected_hash_rate(snapshot),
            temp_c: format_fixed(snapshot.temp, 1, mode),
            power_w: format_fixed(snapshot.power, 1, mode),
            voltage_v: format_fixed(snapshot.voltage / 1000.0, 1, mode),
            current_a: format_fixed(snapshot.current / 1000.0, 1, mode),
            core_voltage_v: format_fixed(snapshot.core_voltage / 1000.0, 2, mode),
            core_voltage_actual_v: format_fixed(snapshot.core_voltage_actual / 1000.0, 2, mode),
            uptime: format_uptime(snapshot.uptime_seconds),
            best_diff: format_fixed(snapshot.best_diff, 0, mode),
            asic_model: snapshot.asic_model.clone(),
            autotune_preset: capitalize(&snapshot.autotune_preset),
            quick_link: pool_quick_link(&snapshot.stratum_url, &snapshot.stratum_user),
            captured_at_ms: snapshot.captured_at_ms,
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
