//! Integration tests for config

#[cfg(test)]
mod tests {
    use modsync_config::*;
    use modsync_types::{ColorChoice, OutputFormat};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: &[&str] = &[
        "MODSYNC_OUTPUT",
        "MODSYNC_COLOR",
        "MODSYNC_POLL_BOUND",
        "MODSYNC_TICK_INTERVAL_MS",
        "MODSYNC_ALWAYS_SKIP",
        "MODSYNC_PROJECT_ROOT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
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

[install]
poll_bound = 20
tick_interval_ms = 10
always_skip_package = "base"
git_branch = "develop"

[paths]
project_root = "/srv/project"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.install.poll_bound, 20);
        assert_eq!(config.install.tick_interval_ms, 10);
        assert_eq!(config.install.always_skip_package, "base");
        assert_eq!(config.install.git_branch, "develop");
        // Unset keys keep their defaults
        assert_eq!(config.install.git_remote, "origin");
        assert_eq!(config.project_root(), PathBuf::from("/srv/project"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/modsync.toml")).await;
        assert!(matches!(
            result,
            Err(modsync_errors::Error::Config(
                modsync_errors::ConfigError::NotFound { .. }
            ))
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MODSYNC_OUTPUT", "json");
        std::env::set_var("MODSYNC_COLOR", "always");
        std::env::set_var("MODSYNC_POLL_BOUND", "7");
        std::env::set_var("MODSYNC_ALWAYS_SKIP", "core.common");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.install.poll_bound, 7);
        assert_eq!(config.install.always_skip_package, "core.common");

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MODSYNC_POLL_BOUND", "soon");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        clear_env();
    }

    #[test]
    fn test_zero_interval_from_env_fails_validation() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("MODSYNC_TICK_INTERVAL_MS", "0");
        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let rendered = Config::default().to_toml_string().unwrap();
        assert!(rendered.contains("poll_bound = 100"));
    }
}
