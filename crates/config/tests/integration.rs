//! Integration tests for config

#[cfg(test)]
mod tests {
    use sprout_config::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "json"

[solver]
preference = "installed"
bootstrap_package = "prelude"
max_backjumps = 2000
max_trace_entries = 8

[environment]
os = "linux"
compiler = "ghc-9.6"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.solver.preference, PreferenceKind::Installed);
        assert_eq!(config.solver.bootstrap_package, "prelude");
        assert_eq!(config.solver.max_backjumps, Some(2000));
        assert_eq!(config.solver.max_trace_entries, 8);

        let env = config.environment();
        assert_eq!(env.os, "linux");
        assert_eq!(env.compiler, "ghc-9.6");
        assert_eq!(env.arch, std::env::consts::ARCH);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[solver]\nmax_backjumps = 10").unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.solver.max_backjumps, Some(10));
        assert_eq!(config.solver.preference, PreferenceKind::Newest);
        assert_eq!(config.solver.bootstrap_package, "base");
        assert_eq!(config.general.default_output, OutputFormat::Plain);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from_file(&dir.path().join("absent.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[solver\npreference = ").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());

        let mut bad_value = NamedTempFile::new().unwrap();
        writeln!(bad_value, "[solver]\npreference = \"oldest\"").unwrap();
        assert!(Config::load_from_file(bad_value.path()).await.is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.solver.max_backjumps = Some(42);
        config.environment.os = Some("freebsd".to_string());

        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.solver, config.solver);
        assert_eq!(parsed.environment.os.as_deref(), Some("freebsd"));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("SPROUT_OUTPUT");
        std::env::remove_var("SPROUT_PREFERENCE");

        std::env::set_var("SPROUT_OUTPUT", "json");
        std::env::set_var("SPROUT_PREFERENCE", "installed");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.solver.preference, PreferenceKind::Installed);

        std::env::remove_var("SPROUT_OUTPUT");
        std::env::remove_var("SPROUT_PREFERENCE");
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();

        std::env::remove_var("SPROUT_OUTPUT");
        std::env::set_var("SPROUT_OUTPUT", "invalid");

        let mut config = Config::default();
        let result = config.merge_env();
        assert!(result.is_err());

        std::env::remove_var("SPROUT_OUTPUT");
    }
}
