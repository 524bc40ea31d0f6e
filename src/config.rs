//! Deployment configuration loaded from YAML.
//!
//! Every field is optional; anything omitted falls back to the defaults of
//! the standard results sheet (`Name`, `Total Marks`, `Attendance` and three
//! subject columns).

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_SUBJECTS: &[&str] = &[
    "Graphics & Multimedia",
    "Computer Networks",
    "Internet of Things",
];
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_REPORT_FILE: &str = "student_report.csv";

const DEFAULT_ADMIN_IDENTITY: &str = "admin";
// sha256("admin123"), the legacy placeholder secret.
const DEFAULT_ADMIN_SECRET_SHA256: &str =
    "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldNames {
    pub name: String,
    pub total: String,
    pub attendance: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            total: "Total Marks".to_string(),
            attendance: "Attendance".to_string(),
        }
    }
}

/// Administrator identity and the SHA-256 digest of its secret.
///
/// This is a placeholder gate for a single-operator tool, not an
/// authentication boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdminCredential {
    pub identity: String,
    pub secret_sha256: String,
}

impl Default for AdminCredential {
    fn default() -> Self {
        Self {
            identity: DEFAULT_ADMIN_IDENTITY.to_string(),
            secret_sha256: DEFAULT_ADMIN_SECRET_SHA256.to_string(),
        }
    }
}

impl AdminCredential {
    pub fn from_secret(identity: &str, secret: &str) -> Self {
        Self {
            identity: identity.to_string(),
            secret_sha256: digest_secret(secret),
        }
    }

    pub fn verify(&self, identity: &str, secret: &str) -> bool {
        identity == self.identity
            && digest_secret(secret).eq_ignore_ascii_case(self.secret_sha256.trim())
    }
}

pub fn digest_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreSettings {
    pub directory: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub fields: FieldNames,
    pub subjects: Vec<String>,
    pub admin: AdminCredential,
    pub store: StoreSettings,
    pub top_n: usize,
    pub report_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fields: FieldNames::default(),
            subjects: DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect(),
            admin: AdminCredential::default(),
            store: StoreSettings::default(),
            top_n: DEFAULT_TOP_N,
            report_file: DEFAULT_REPORT_FILE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: AppConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing config YAML {path:?}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing config YAML")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.top_n > 0, "top_n must be at least 1");
        ensure!(
            !self.admin.identity.trim().is_empty(),
            "admin.identity cannot be empty"
        );
        let digest = self.admin.secret_sha256.trim();
        ensure!(
            digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()),
            "admin.secret_sha256 must be a 64 digit hex SHA-256 digest"
        );
        for (field, value) in [
            ("fields.name", &self.fields.name),
            ("fields.total", &self.fields.total),
            ("fields.attendance", &self.fields.attendance),
        ] {
            ensure!(!value.trim().is_empty(), "{field} cannot be empty");
        }
        ensure!(
            self.subjects.iter().all(|s| !s.trim().is_empty()),
            "subject names cannot be empty"
        );
        ensure!(
            !self.report_file.trim().is_empty(),
            "report_file cannot be empty"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_credential_accepts_placeholder_secret_only() {
        let admin = AdminCredential::default();
        assert!(admin.verify("admin", "admin123"));
        assert!(!admin.verify("admin", "admin1234"));
        assert!(!admin.verify("Admin", "admin123"));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: AppConfig =
            serde_yaml::from_str("subjects: [Maths]\nfields:\n  total: Score\n").unwrap();
        assert_eq!(config.subjects, vec!["Maths".to_string()]);
        assert_eq!(config.fields.total, "Score");
        assert_eq!(config.fields.name, "Name");
        assert_eq!(config.top_n, DEFAULT_TOP_N);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_malformed_digest_and_zero_top_n() {
        let mut config = AppConfig::default();
        config.admin.secret_sha256 = "abc".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.top_n = 0;
        assert!(config.validate().is_err());
    }
}
