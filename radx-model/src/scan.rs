use serde::{Deserialize, Serialize};

/// One detected finding: a free-form name plus a confidence percentage kept
/// as the string the detector printed (e.g. `"65%"`). No numeric parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    #[serde(default)]
    pub anomaly_name: String,
    #[serde(default)]
    pub percentage: String,
}

impl Anomaly {
    pub fn new(anomaly_name: impl Into<String>, percentage: impl Into<String>) -> Self {
        Self {
            anomaly_name: anomaly_name.into(),
            percentage: percentage.into(),
        }
    }

    /// Substitute the documented placeholders for missing fields.
    pub fn normalized(self) -> Self {
        Self {
            anomaly_name: if self.anomaly_name.trim().is_empty() {
                "Unknown".to_string()
            } else {
                self.anomaly_name
            },
            percentage: if self.percentage.trim().is_empty() {
                "0%".to_string()
            } else {
                self.percentage
            },
        }
    }

    /// The two-entry example list stored when a save supplies no anomalies,
    /// kept so saved records always have the documented shape.
    pub fn default_findings() -> Vec<Anomaly> {
        vec![
            Anomaly::new("Fracture", "65%"),
            Anomaly::new("crack", "50%"),
        ]
    }

    /// Normalize a caller-supplied list, falling back to
    /// [`Anomaly::default_findings`] when none (or an empty list) was given.
    pub fn normalize_list(anomalies: Option<Vec<Anomaly>>) -> Vec<Anomaly> {
        match anomalies {
            Some(list) if !list.is_empty() => {
                list.into_iter().map(Anomaly::normalized).collect()
            }
            _ => Anomaly::default_findings(),
        }
    }
}

/// One scan history entry: the stored image URL plus its findings.
///
/// `imageUrl` doubles as the record key for rename/delete. Nothing enforces
/// uniqueness; operations keyed on it hit every matching entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub image_url: String,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
}

impl ScanRecord {
    pub fn new(image_url: impl Into<String>, anomalies: Vec<Anomaly>) -> Self {
        Self {
            image_url: image_url.into(),
            anomalies,
        }
    }
}
