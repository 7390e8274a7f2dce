// Telemetry domain models
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire payload of the device's system info endpoint.
///
/// Only `hashRate`, `temp` and `power` are required; everything else falls
/// back to its default when older firmware leaves it out.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub hash_rate: f64,
    pub temp: f64,
    pub power: f64,
    #[serde(default)]
    pub voltage: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub core_voltage: f64,
    #[serde(default)]
    pub core_voltage_actual: f64,
    #[serde(default)]
    pub frequency: f64,
    #[serde(default)]
    pub small_core_count: u32,
    #[serde(default)]
    pub asic_count: u32,
    #[serde(default, deserialize_with = "deserialize_difficulty")]
    pub best_diff: f64,
    #[serde(default)]
    pub uptime_seconds: u64,
    #[serde(default, rename = "stratumURL")]
    pub stratum_url: String,
    #[serde(default)]
    pub stratum_user: String,
    #[serde(default, rename = "ASICModel")]
    pub asic_model: String,
    #[serde(default, rename = "autotune_preset")]
    pub autotune_preset: String,
    #[serde(default)]
    pub mac_addr: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub fanspeed: f64,
    #[serde(default)]
    pub fanrpm: f64,
    #[serde(default)]
    pub status: String,
}

/// One point-in-time read of the device. Built once per successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// GH/s
    pub hash_rate: f64,
    /// °C
    pub temp: f64,
    /// W
    pub power: f64,
    /// mV
    pub voltage: f64,
    /// mA
    pub current: f64,
    /// mV
    pub core_voltage: f64,
    /// mV
    pub core_voltage_actual: f64,
    /// MHz
    pub frequency: f64,
    pub small_core_count: u32,
    pub asic_count: u32,
    pub best_diff: f64,
    pub uptime_seconds: u64,
    pub fanspeed: f64,
    pub fanrpm: f64,
    pub stratum_url: String,
    pub stratum_user: String,
    pub asic_model: String,
    pub autotune_preset: String,
    pub mac_addr: String,
    pub hostname: String,
    pub ip_address: String,
    pub status: String,
    pub captured_at_ms: i64,
}

impl MetricSnapshot {
    pub fn from_device_info(info: DeviceInfo, captured_at_ms: i64) -> Self {
        Self {
            hash_rate: info.hash_rate,
            temp: info.temp,
            power: info.power,
            voltage: info.voltage,
            current: info.current,
            core_voltage: info.core_voltage,
            core_voltage_actual: info.core_voltage_actual,
            frequency: info.frequency,
            small_core_count: info.small_core_count,
            asic_count: info.asic_count,
            best_diff: info.best_diff,
            uptime_seconds: info.uptime_seconds,
            fanspeed: info.fanspeed,
            fanrpm: info.fanrpm,
            stratum_url: info.stratum_url,
            stratum_user: info.stratum_user,
            asic_model: info.asic_model,
            autotune_preset: info.autotune_preset,
            mac_addr: info.mac_addr,
            hostname: info.hostname,
            ip_address: info.ip_address,
            status: info.status,
            captured_at_ms,
        }
    }

    /// Parse a raw payload and stamp it with the capture time.
    pub fn from_json(body: &str, captured_at_ms: i64) -> serde_json::Result<Self> {
        let info: DeviceInfo = serde_json::from_str(body)?;
        Ok(Self::from_device_info(info, captured_at_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self { timestamp_ms, value }
    }
}

/// Chartable metrics. Each one maps a snapshot to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    HashRate,
    Temperature,
    Power,
    Voltage,
    Current,
    CoreVoltage,
    Frequency,
    FanRpm,
    Uptime,
    BestDiff,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::HashRate,
        Metric::Temperature,
        Metric::Power,
        Metric::Voltage,
        Metric::Current,
        Metric::CoreVoltage,
        Metric::Frequency,
        Metric::FanRpm,
        Metric::Uptime,
        Metric::BestDiff,
    ];

    pub fn value(&self, snapshot: &MetricSnapshot) -> f64 {
        match self {
            Metric::HashRate => snapshot.hash_rate,
            Metric::Temperature => snapshot.temp,
            Metric::Power => snapshot.power,
            Metric::Voltage => snapshot.voltage,
            Metric::Current => snapshot.current,
            Metric::CoreVoltage => snapshot.core_voltage_actual,
            Metric::Frequency => snapshot.frequency,
            Metric::FanRpm => snapshot.fanrpm,
            Metric::Uptime => snapshot.uptime_seconds as f64,
            Metric::BestDiff => snapshot.best_diff,
        }
    }

    pub fn sample(&self, snapshot: &MetricSnapshot) -> Sample {
        Sample::new(snapshot.captured_at_ms, self.value(snapshot))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::HashRate => "hash-rate",
            Metric::Temperature => "temperature",
            Metric::Power => "power",
            Metric::Voltage => "voltage",
            Metric::Current => "current",
            Metric::CoreVoltage => "core-voltage",
            Metric::Frequency => "frequency",
            Metric::FanRpm => "fan-rpm",
            Metric::Uptime => "uptime",
            Metric::BestDiff => "best-diff",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::HashRate => "GH/s",
            Metric::Temperature => "°C",
            Metric::Power => "W",
            Metric::Voltage | Metric::CoreVoltage => "mV",
            Metric::Current => "mA",
            Metric::Frequency => "MHz",
            Metric::FanRpm => "RPM",
            Metric::Uptime => "s",
            Metric::BestDiff => "",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Firmware versions disagree on `bestDiff`: some send a number, others a
/// pre-formatted string such as "4.29G".
fn deserialize_difficulty<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_difficulty(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid difficulty: {s}"))),
    }
}

/// Parse a difficulty with an optional SI suffix (k, M, G, T, P, E).
pub fn parse_difficulty(text: &str) -> Option<f64> {
    let text = text.trim();
    let (digits, multiplier) = match text.chars().last()? {
        'k' | 'K' => (&text[..text.len() - 1], 1e3),
        'M' => (&text[..text.len() - 1], 1e6),
        'G' => (&text[..text.len() - 1], 1e9),
        'T' => (&text[..text.len() - 1], 1e12),
        'P' => (&text[..text.len() - 1], 1e15),
        'E' => (&text[..text.len() - 1], 1e18),
        _ => (text, 1.0),
    };
    digits.trim().parse::<f64>().ok().map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "hashRate": 1234.5,
        "temp": 61.25,
        "power": 12.34567,
        "voltage": 5123,
        "current": 2450,
        "coreVoltage": 1200,
        "coreVoltageActual": 1187,
        "frequency": 525,
        "smallCoreCount": 894,
        "asicCount": 1,
        "bestDiff": 1520000,
        "uptimeSeconds": 3725,
        "stratumURL": "public-pool.io",
        "stratumUser": "bc1qexample.worker1",
        "ASICModel": "BM1366",
        "autotune_preset": "balanced",
        "macAddr": "AA:BB:CC:DD:EE:FF",
        "hostname": "bitaxe",
        "ipAddress": "192.168.1.40",
        "fanspeed": 65,
        "fanrpm": 4100,
        "status": "mining"
    }"#;

    #[test]
    fn test_parse_full_payload() {
        let snapshot = MetricSnapshot::from_json(PAYLOAD, 1_700_000_000_000).unwrap();
        assert_eq!(snapshot.hash_rate, 1234.5);
        assert_eq!(snapshot.stratum_url, "public-pool.io");
        assert_eq!(snapshot.asic_model, "BM1366");
        assert_eq!(snapshot.autotune_preset, "balanced");
        assert_eq!(snapshot.uptime_seconds, 3725);
        assert_eq!(snapshot.captured_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let snapshot =
            MetricSnapshot::from_json(r#"{"hashRate": 1.0, "temp": 40, "power": 9}"#, 0).unwrap();
        assert_eq!(snapshot.voltage, 0.0);
        assert!(snapshot.hostname.is_empty());
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        assert!(MetricSnapshot::from_json(r#"{"temp": 40, "power": 9}"#, 0).is_err());
        assert!(MetricSnapshot::from_json("not json", 0).is_err());
    }

    #[test]
    fn test_best_diff_accepts_suffixed_strings() {
        let snapshot = MetricSnapshot::from_json(
            r#"{"hashRate": 1.0, "temp": 40, "power": 9, "bestDiff": "4.5G"}"#,
            0,
        )
        .unwrap();
        assert_eq!(snapshot.best_diff, 4.5e9);
        assert_eq!(parse_difficulty("812"), Some(812.0));
        assert_eq!(parse_difficulty("1.5k"), Some(1500.0));
        assert_eq!(parse_difficulty("abc"), None);
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert!("hashrate".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_sample_uses_capture_time() {
        let snapshot = MetricSnapshot::from_json(PAYLOAD, 42).unwrap();
        let sample = Metric::Uptime.sample(&snapshot);
        assert_eq!(sample, Sample::new(42, 3725.0));
    }
}
