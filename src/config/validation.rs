//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Unknown keys never break a config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `AppConfig`.
///
/// Maintained by hand to match the structs in app_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [detector]
        "detector",
        "detector.window_capacity",
        "detector.threshold",
        // [stream]
        "stream",
        "stream.seed",
        "stream.seasonal_frequency",
        "stream.noise_std_dev",
        "stream.spike_probability",
        "stream.spike_magnitude",
        // [driver]
        "driver",
        "driver.tick_delay_ms",
        "driver.max_ticks",
        // [anomaly_log]
        "anomaly_log",
        "anomaly_log.path",
        "anomaly_log.append",
        // [server]
        "server",
        "server.enabled",
        "server.addr",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        // Tie-break on the key itself so the suggestion doesn't depend on
        // HashSet iteration order.
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Parse errors are left to the serde pass.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed `AppConfig`.
///
/// Returns (errors, warnings): errors are values the detector or generator
/// cannot run with and must prevent startup; warnings are legal but
/// suspicious.
pub fn validate_ranges(config: &super::AppConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let d = &config.detector;
    if d.window_capacity == 0 {
        errors.push("detector.window_capacity must be > 0".to_string());
    } else if d.window_capacity < 10 {
        warnings.push(ValidationWarning {
            field: "detector.window_capacity".to_string(),
            message: format!(
                "detector.window_capacity = {} is very small; window statistics will be noisy",
                d.window_capacity
            ),
            suggestion: None,
        });
    }

    if !d.threshold.is_finite() || d.threshold <= 0.0 {
        errors.push(format!(
            "detector.threshold = {} must be a finite number > 0",
            d.threshold
        ));
    } else if d.threshold < 1.0 {
        warnings.push(ValidationWarning {
            field: "detector.threshold".to_string(),
            message: format!(
                "detector.threshold = {:.2} will flag a large share of ordinary samples",
                d.threshold
            ),
            suggestion: None,
        });
    }

    let s = &config.stream;
    if !s.seasonal_frequency.is_finite() {
        errors.push(format!(
            "stream.seasonal_frequency = {} must be finite",
            s.seasonal_frequency
        ));
    }
    if !s.noise_std_dev.is_finite() || s.noise_std_dev < 0.0 {
        errors.push(format!(
            "stream.noise_std_dev = {} must be a finite number >= 0",
            s.noise_std_dev
        ));
    }
    if !(0.0..=1.0).contains(&s.spike_probability) {
        errors.push(format!(
            "stream.spike_probability = {} must be within [0, 1]",
            s.spike_probability
        ));
    }
    if !s.spike_magnitude.is_finite() {
        errors.push(format!(
            "stream.spike_magnitude = {} must be finite",
            s.spike_magnitude
        ));
    }

    if config.driver.max_ticks == Some(0) {
        errors.push("driver.max_ticks must be > 0 when set".to_string());
    }
    if config.driver.tick_delay_ms > 60_000 {
        warnings.push(ValidationWarning {
            field: "driver.tick_delay_ms".to_string(),
            message: format!(
                "driver.tick_delay_ms = {} is over a minute per sample",
                config.driver.tick_delay_ms
            ),
            suggestion: None,
        });
    }

    if config.anomaly_log.path.as_os_str().is_empty() {
        errors.push("anomaly_log.path must not be empty".to_string());
    }

    if config.server.enabled && config.server.addr.parse::<std::net::SocketAddr>().is_err() {
        errors.push(format!(
            "server.addr = '{}' is not a valid HOST:PORT socket address",
            config.server.addr
        ));
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("treshold", "threshold"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [detector]
            window_capacity = 50
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"detector".to_string()));
        assert!(keys.contains(&"detector.window_capacity".to_string()));
    }

    #[test]
    fn test_typo_warns_with_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
[detector]
treshold = 2.0
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "detector.treshold");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("detector.threshold"));
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("completely_unrelated_section_name = 1\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].suggestion.is_none());
    }

    #[test]
    fn test_valid_config_zero_warnings() {
        let warnings = validate_unknown_keys(
            r#"
[detector]
window_capacity = 200
threshold = 3.5

[stream]
seed = 7
noise_std_dev = 0.25

[driver]
tick_delay_ms = 10
max_ticks = 1000

[anomaly_log]
path = "out.log"
append = true

[server]
enabled = false
addr = "0.0.0.0:9000"
"#,
        );
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_range_errors_collected() {
        let mut config = AppConfig::default();
        config.detector.threshold = -1.0;
        config.stream.spike_probability = 1.5;
        config.stream.noise_std_dev = f64::NAN;
        let (errors, _) = validate_ranges(&config);
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn test_small_window_is_warning_not_error() {
        let mut config = AppConfig::default();
        config.detector.window_capacity = 5;
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_bad_server_addr_only_checked_when_enabled() {
        let mut config = AppConfig::default();
        config.server.addr = "not-an-address".to_string();
        assert_eq!(validate_ranges(&config).0.len(), 1);

        config.server.enabled = false;
        assert!(validate_ranges(&config).0.is_empty());
    }
}
