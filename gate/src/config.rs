use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voicegate_authn::AuthConfig;
use voicegate_trust::TrustConfig;
use voicegate_voiceprint::VoiceprintConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config: read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config: parse: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("config: invalid: {0}")]
    Invalid(String),

    #[error("config: logging: {0}")]
    Logging(String),
}

/// Where trust signals for authorization come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMode {
    /// Signals recorded at login are reused for every request on the
    /// session. Signals on a request are used only when none were captured.
    #[default]
    Captured,
    /// Every request must carry fresh signals.
    PerCall,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub assessment: AssessmentMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// redb file holding voice prints. Unset keeps prints in memory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `info` or `voicegate=debug,warn`.
    /// `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// Full configuration, usually loaded from a YAML file:
///
/// ```yaml
/// voiceprint:
///   threshold: 0.85
/// auth:
///   session_ttl_minutes: 30
/// trust:
///   noise_threshold: 0.3
/// gate:
///   assessment: captured
/// storage:
///   path: /var/lib/voicegate/prints.redb
/// log:
///   level: info
/// ```
///
/// Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub voiceprint: VoiceprintConfig,
    pub auth: AuthConfig,
    pub trust: TrustConfig,
    pub gate: GateConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl Config {
    /// Reads, parses and validates a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        let cfg: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.voiceprint
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.auth
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.trust
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.log.level.trim().is_empty() {
            return Err(ConfigError::Invalid("log.level must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_is_default() {
        let cfg = Config::from_yaml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.gate.assessment, AssessmentMode::Captured);
        assert_eq!(cfg.voiceprint.threshold, 0.85);
        assert_eq!(cfg.auth.session_ttl_minutes, 30);
        assert_eq!(cfg.trust.high_value_threshold, 25_000.0);
        assert!(cfg.storage.path.is_none());
    }

    #[test]
    fn sections_override_independently() {
        let cfg = Config::from_yaml(
            r#"
voiceprint:
  threshold: 0.9
auth:
  otp_length: 8
trust:
  default_transaction_limit: 5000
gate:
  assessment: per_call
storage:
  path: /tmp/prints.redb
log:
  level: debug
"#,
        )
        .unwrap();
        assert_eq!(cfg.voiceprint.threshold, 0.9);
        assert_eq!(cfg.voiceprint.update_weight, 0.1);
        assert_eq!(cfg.auth.otp_length, 8);
        assert_eq!(cfg.auth.otp_max_attempts, 3);
        assert_eq!(cfg.trust.default_transaction_limit, 5_000.0);
        assert_eq!(cfg.gate.assessment, AssessmentMode::PerCall);
        assert_eq!(cfg.storage.path.as_deref(), Some(Path::new("/tmp/prints.redb")));
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for doc in [
            "voiceprint:\n  update_weight: 0\n",
            "voiceprint:\n  update_weight: 1.5\n",
            "auth:\n  otp_max_attempts: 0\n",
            "auth:\n  otp_length: 0\n",
            "trust:\n  noise_threshold: .nan\n",
            "log:\n  level: ''\n",
        ] {
            assert!(
                matches!(Config::from_yaml(doc), Err(ConfigError::Invalid(_))),
                "accepted: {doc}"
            );
        }
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        assert!(matches!(
            Config::from_yaml("gate:\n  assessment: sometimes\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "gate:\n  assessment: per_call").unwrap();
        let cfg = Config::load(f.path()).unwrap();
        assert_eq!(cfg.gate.assessment, AssessmentMode::PerCall);

        assert!(matches!(
            Config::load("/nonexistent/voicegate.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
