use serde::{Deserialize, Serialize};

/// A single sensor reading as returned by the plant backend.
///
/// Wire field names are the backend's Spanish originals (`valor`, `estado`,
/// `fecha_hora`); `timestamp` is accepted as an alias since some endpoints
/// use it instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "valor")]
    pub value: Option<f64>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(
        rename = "fecha_hora",
        alias = "timestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_parses_wire_names() {
        let r: SensorReading =
            serde_json::from_str(r#"{"valor": 0.045, "estado": "ok", "fecha_hora": "2026-08-23T10:00:00"}"#)
                .unwrap();
        assert_eq!(r.value, Some(0.045));
        assert_eq!(r.status.as_deref(), Some("ok"));
        assert!(r.timestamp.is_some());
    }

    #[test]
    fn reading_accepts_timestamp_alias_and_null_value() {
        let r: SensorReading =
            serde_json::from_str(r#"{"valor": null, "timestamp": "2026-08-23T10:00:00"}"#).unwrap();
        assert_eq!(r.value, None);
        assert!(r.timestamp.is_some());
    }
}
