use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle status of a privileged row (admin user or business)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Pending,
    Suspended,
    /// Missing, null or unrecognised status
    Unknown,
}

impl RecordStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("active") => RecordStatus::Active,
            Some("pending") => RecordStatus::Pending,
            Some("suspended") => RecordStatus::Suspended,
            _ => RecordStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Pending => "pending",
            RecordStatus::Suspended => "suspended",
            RecordStatus::Unknown => "unknown",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Unknown
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RecordStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(RecordStatus::parse(raw.as_deref()))
    }
}
