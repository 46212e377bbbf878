// dbbackup/src/config/mod.rs
use std::collections::HashMap;
use std::env;

use crate::errors::{BackupError, Result};

/// Immutable application configuration, read from the environment once at
/// startup and passed by parameter everywhere else.
#[derive(Debug, Clone)]
pub struct Settings {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub s3_region: String,
    pub s3_bucket: String,
    /// Connection URIs of the databases to back up, in configured order.
    pub targets: Vec<String>,
    pub run_on_startup: bool,
    /// Five-field cron expression, if scheduled backups are wanted.
    pub cron: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&env::vars().collect())
    }

    fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| BackupError::Config(format!("{key} must be set")))
        };

        let targets = vars
            .get("DATABASES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let run_on_startup = vars
            .get("RUN_ON_STARTUP")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let cron = vars
            .get("CRON")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Settings {
            aws_access_key_id: required("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            s3_region: required("AWS_S3_REGION")?,
            s3_bucket: required("AWS_S3_BUCKET")?,
            targets,
            run_on_startup,
            cron,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        [
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_S3_REGION", "eu-west-1"),
            ("AWS_S3_BUCKET", "backups"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn loads_required_settings_with_defaults() -> Result<()> {
        let settings = Settings::from_vars(&base_vars())?;

        assert_eq!(settings.aws_access_key_id, "AKIAEXAMPLE");
        assert_eq!(settings.s3_region, "eu-west-1");
        assert_eq!(settings.s3_bucket, "backups");
        assert!(settings.targets.is_empty());
        assert!(!settings.run_on_startup);
        assert!(settings.cron.is_none());
        Ok(())
    }

    #[test]
    fn missing_required_variable_is_a_config_error() {
        let mut vars = base_vars();
        vars.remove("AWS_S3_BUCKET");

        match Settings::from_vars(&vars) {
            Err(BackupError::Config(msg)) => assert!(msg.contains("AWS_S3_BUCKET")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn empty_required_variable_is_a_config_error() {
        let mut vars = base_vars();
        vars.insert("AWS_SECRET_ACCESS_KEY".to_string(), "  ".to_string());

        assert!(matches!(
            Settings::from_vars(&vars),
            Err(BackupError::Config(_))
        ));
    }

    #[test]
    fn database_list_is_split_and_trimmed() -> Result<()> {
        let mut vars = base_vars();
        vars.insert(
            "DATABASES".to_string(),
            " mysql://u:p@h/db1 , ,postgresql://u:p@h/db2 ".to_string(),
        );

        let settings = Settings::from_vars(&vars)?;
        assert_eq!(
            settings.targets,
            vec!["mysql://u:p@h/db1", "postgresql://u:p@h/db2"]
        );
        Ok(())
    }

    #[test]
    fn run_on_startup_accepts_boolean_like_values() -> Result<()> {
        for (value, expected) in [
            ("true", true),
            ("TRUE", true),
            ("1", true),
            ("yes", true),
            ("false", false),
            ("0", false),
            ("banana", false),
        ] {
            let mut vars = base_vars();
            vars.insert("RUN_ON_STARTUP".to_string(), value.to_string());
            assert_eq!(
                Settings::from_vars(&vars)?.run_on_startup,
                expected,
                "value: {value}"
            );
        }
        Ok(())
    }

    #[test]
    fn blank_cron_is_treated_as_absent() -> Result<()> {
        let mut vars = base_vars();
        vars.insert("CRON".to_string(), "   ".to_string());

        assert!(Settings::from_vars(&vars)?.cron.is_none());
        Ok(())
    }
}
