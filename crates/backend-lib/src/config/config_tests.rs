use super::*;
use figment::Jail;

const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef-test";

fn valid_settings() -> Settings {
    Settings {
        jwt_secret: Secret::new(TEST_SECRET),
        ..Settings::default()
    }
}

#[test]
fn test_settings_validation() {
    assert!(valid_settings().validate().is_ok());

    // No secret: there is no fallback key
    assert!(Settings::default().validate().is_err());

    let mut invalid = valid_settings();
    invalid.jwt_secret = Secret::new("short");
    assert!(invalid.validate().is_err());

    let mut invalid = valid_settings();
    invalid.log_level = "invalid".to_string();
    assert!(invalid.validate().is_err());

    let mut invalid = valid_settings();
    invalid.password_requirements.min_length = 4;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_secret_is_redacted() {
    let settings = valid_settings();
    let debug = format!("{settings:?}");
    assert!(!debug.contains(TEST_SECRET));
    assert!(debug.contains("redacted"));
}

#[test]
fn test_secure_cookies_only_in_production() {
    let mut settings = valid_settings();
    assert!(!settings.secure_cookies());
    settings.environment = Environment::Production;
    assert!(settings.secure_cookies());
}

#[test]
fn test_load_settings() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file(
            "config.toml",
            r#"
            bind_addr = "127.0.0.1:4000"
            data_dir = "test_data"
            log_level = "debug"
            "#,
        )?;
        jail.set_env("FOLIO_LOG_LEVEL", "warn");
        jail.set_env("FOLIO_JWT_SECRET", TEST_SECRET);

        let settings = Settings::load().map_err(|e| e.to_string())?;
        assert_eq!(settings.bind_addr.to_string(), "127.0.0.1:4000");
        assert_eq!(settings.data_dir, PathBuf::from("test_data"));
        // Environment variable takes precedence
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.jwt_secret.expose(), TEST_SECRET);
        assert_eq!(settings.environment, Environment::Development);
        Ok(())
    });
}

#[test]
fn test_load_accepts_bare_jwt_secret() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.set_env("JWT_SECRET", TEST_SECRET);
        jail.set_env("FOLIO_ENVIRONMENT", "production");

        let settings = Settings::load().map_err(|e| e.to_string())?;
        assert_eq!(settings.jwt_secret.expose(), TEST_SECRET);
        assert!(settings.secure_cookies());
        Ok(())
    });
}

#[test]
fn test_load_fails_without_secret() {
    Jail::expect_with(|jail| {
        jail.clear_env();
        jail.create_file("custom.toml", r#"log_level = "info""#)?;

        let result = Settings::load_from("custom.toml");
        assert!(matches!(result, Err(AppError::Config(_))));
        Ok(())
    });
}
