use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::Deserialize;
use std::time::Duration;

pub const REDACTED: &str = "<redacted>";

/// Reads a number of milliseconds.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let ms: u64 = Deserialize::deserialize(deserializer)?;
    Ok(Duration::from_millis(ms))
}

/// Writes a duration back as a number of milliseconds.
pub fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Hides a secret when settings are printed.
pub fn serialize_redacted<S>(secret: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secret {
        Some(_) => serializer.serialize_some(REDACTED),
        None => serializer.serialize_none(),
    }
}

pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Deserialize, Serialize)]
    struct Settings {
        #[serde(
            deserialize_with = "deserialize_duration",
            serialize_with = "serialize_duration"
        )]
        timeout: Duration,
        #[serde(default, serialize_with = "serialize_redacted")]
        password: Option<String>,
        #[serde(default = "default_true")]
        enabled: bool,
    }

    #[test]
    fn should_read_milliseconds_and_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "timeout": 1500 }"#).unwrap();
        assert_eq!(settings.timeout, Duration::from_millis(1500));
        assert_eq!(settings.password, None);
        assert!(settings.enabled);
    }

    #[test]
    fn should_redact_secrets_when_serializing() {
        let settings = Settings {
            timeout: Duration::from_secs(2),
            password: Some("hunter2".to_string()),
            enabled: false,
        };

        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["timeout"], 2000);
        assert_eq!(json["password"], REDACTED);
    }
}
