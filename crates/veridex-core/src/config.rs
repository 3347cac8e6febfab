// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable settings for a pipeline runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Optional deadline applied to every stage. A stage that exceeds it is
    /// treated exactly like a failed stage (step marked failed, run
    /// continues). `None` means stages may run unbounded.
    #[serde(with = "duration_millis_opt", default)]
    pub stage_deadline: Option<Duration>,
    /// Enable audit trail logging.
    pub audit_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_deadline: None,
            audit_enabled: true,
        }
    }
}

/// Serde adapter for `Option<Duration>` as whole milliseconds.
mod duration_millis_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_deadline() {
        let config = PipelineConfig::default();
        assert!(config.stage_deadline.is_none());
        assert!(config.audit_enabled);
    }

    #[test]
    fn deadline_round_trips_through_json() {
        let config = PipelineConfig {
            stage_deadline: Some(Duration::from_millis(2500)),
            audit_enabled: false,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stage_deadline, Some(Duration::from_millis(2500)));
        assert!(!back.audit_enabled);
    }
}
