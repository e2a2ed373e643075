//! Integration tests for config

#[cfg(test)]
mod tests {
    use satdl_config::*;
    use satdl_types::{ColorChoice, OutputFormat};
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "SATDL_OUTPUT",
            "SATDL_COLOR",
            "SATDL_AUTO_VERIFY",
            "SATDL_INTERVAL_SECS",
            "SATDL_SPACING_MS",
            "SATDL_STATE_PATH",
        ] {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[polling]
auto_verify = true
interval_secs = 120

[paths]
state_path = "/tmp/satdl/requests.json"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert!(config.polling.auto_verify);
        assert_eq!(config.polling.interval(), Duration::from_secs(120));
        // Unset fields keep their defaults
        assert_eq!(config.polling.spacing(), Duration::from_millis(500));
        assert_eq!(
            config.state_path(),
            std::path::PathBuf::from("/tmp/satdl/requests.json")
        );
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[polling]\ninterval_secs = 0").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from_file(&dir.path().join("absent.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.polling.interval_secs = 60;
        config.save_to(&path).await.unwrap();

        let loaded = Config::load_from_file(&path).await.unwrap();
        assert_eq!(loaded.polling.interval_secs, 60);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.polling.auto_verify);
        assert_eq!(config.polling.interval(), Duration::from_secs(300));
        assert_eq!(config.polling.status_timeout(), Duration::from_secs(30));
        assert!(config.credentials_path().ends_with("satdl/credentials.json"));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("SATDL_OUTPUT", "json");
        std::env::set_var("SATDL_COLOR", "always");
        std::env::set_var("SATDL_AUTO_VERIFY", "yes");
        std::env::set_var("SATDL_SPACING_MS", "250");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.general.color, ColorChoice::Always);
        assert!(config.polling.auto_verify);
        assert_eq!(config.polling.spacing_ms, 250);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("SATDL_INTERVAL_SECS", "often");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }
}
