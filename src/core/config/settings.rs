use std::path::PathBuf;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_class_passwords, parse_cors_origins,
    parse_environment, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    ApiSettings, AuthSettings, ConfigError, CorsSettings, ExamSettings, RuntimeSettings,
    SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings, StorageSettings,
    TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("KIEMTRA_HOST", "0.0.0.0");
        let port = env_or_default("KIEMTRA_PORT", "3000");

        let environment =
            parse_environment(env_optional("KIEMTRA_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("KIEMTRA_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Kiemtra API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let data_dir = PathBuf::from(env_or_default("DATA_DIR", "data"));
        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None if strict_config => return Err(ConfigError::MissingSecret("SECRET_KEY")),
            None => load_or_create_secret_key(&data_dir),
        };

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "720"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let default_time_minutes =
            parse_u32("DEFAULT_TIME_MINUTES", env_or_default("DEFAULT_TIME_MINUTES", "45"))?;

        let teacher_password = env_or_default("TEACHER_PASSWORD", "");
        let class_passwords = parse_class_passwords(env_optional("CLASS_PASSWORDS"))?;

        let log_level = env_or_default("KIEMTRA_LOG_LEVEL", "info");
        let json = env_optional("KIEMTRA_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            storage: StorageSettings { data_dir, max_upload_size_mb },
            exam: ExamSettings { default_time_minutes },
            auth: AuthSettings { teacher_password, class_passwords },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn exam(&self) -> &ExamSettings {
        &self.exam
    }

    pub(crate) fn auth(&self) -> &AuthSettings {
        &self.auth
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if self.exam.default_time_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DEFAULT_TIME_MINUTES",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.auth.teacher_password.is_empty() {
            return Err(ConfigError::MissingSecret("TEACHER_PASSWORD"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn strict_mode_without_secret_key_fails_before_writing_key_file() {
        let _lock = test_support::env_lock().await;
        let dir = tempfile::tempdir().expect("tempdir");
        test_support::set_test_env(dir.path());
        std::env::remove_var("SECRET_KEY");
        std::env::set_var("KIEMTRA_STRICT_CONFIG", "1");

        let result = Settings::load();

        std::env::remove_var("KIEMTRA_STRICT_CONFIG");
        assert!(matches!(result, Err(ConfigError::MissingSecret("SECRET_KEY"))));
        assert!(!dir.path().join(".secret_key").exists());
    }

    #[tokio::test]
    async fn relaxed_mode_without_secret_key_persists_generated_key() {
        let _lock = test_support::env_lock().await;
        let dir = tempfile::tempdir().expect("tempdir");
        test_support::set_test_env(dir.path());
        std::env::remove_var("SECRET_KEY");
        std::env::remove_var("KIEMTRA_STRICT_CONFIG");

        let settings = Settings::load().expect("settings");

        assert!(!settings.security().secret_key.is_empty());
        assert!(dir.path().join(".secret_key").exists());
    }
}
