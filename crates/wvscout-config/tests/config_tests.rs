#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use wvscout_config::ConfigLoader;
    use wvscout_config::schema::*;

    // ── Default tests ──────────────────────────────────────────

    #[test]
    fn test_discovery_config_defaults() {
        let config = DiscoveryConfig::default();
        assert!(config.device_socket.is_none());
        assert!(config.ensure_webviews_have_pages);
        assert!(config.enable_details_collection);
        assert!(config.devtools_port.is_none());
        assert_eq!(config.wait_for_webview_ms, 0);
        assert!(!config.chrome_session);
        assert!(!config.port_exhaustion_fatal);
        assert_eq!(config.listening_flags, "00010000");
        assert_eq!(config.listening_state, "01");
        assert_eq!(config.probe_timeout_ms, 2000);
        assert_eq!(config.cache_capacity, 100);
    }

    #[test]
    fn test_port_guard_defaults() {
        let config = PortGuardConfig::default();
        assert_eq!(config.base_port, 10900);
        assert_eq!(config.port_window, 100);
        assert_eq!(config.timeout_secs, 7);
        assert!(config.try_recovery);
        assert!(config.lock_path.ends_with("android_devtools_port_guard"));
    }

    #[test]
    fn test_device_and_logging_defaults() {
        let config = ScoutConfig::default();
        assert_eq!(config.device.adb_path, "adb");
        assert_eq!(config.device.adb_host, "127.0.0.1");
        assert_eq!(config.device.command_timeout_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    // ── TOML tests ─────────────────────────────────────────────

    #[test]
    fn test_config_toml_roundtrip() {
        let config = ScoutConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored: ScoutConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.port_guard.base_port, config.port_guard.base_port);
        assert_eq!(restored.discovery.listening_flags, config.discovery.listening_flags);
    }

    #[test]
    fn test_partial_toml_applies_defaults() {
        let toml_str = r#"
[discovery]
device_socket = "chrome_devtools_remote"
devtools_port = 12000
"#;
        let config: ScoutConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.discovery.device_socket.as_deref(), Some("chrome_devtools_remote"));
        assert_eq!(config.discovery.devtools_port, Some(12000));
        // Defaults should fill in
        assert!(config.discovery.ensure_webviews_have_pages);
        assert_eq!(config.port_guard.port_window, 100);
        assert_eq!(config.device.adb_path, "adb");
    }

    // ── Validation tests ───────────────────────────────────────

    #[test]
    fn test_default_config_is_valid() {
        let warnings = ScoutConfig::default().validate().unwrap();
        assert!(
            warnings
                .iter()
                .all(|w| w.severity != WarningSeverity::Error)
        );
    }

    #[test]
    fn test_port_window_overflow_is_error() {
        let mut config = ScoutConfig::default();
        config.discovery.devtools_port = Some(65500);
        let err = config.validate().unwrap_err();
        assert!(err.contains("discovery.devtools_port"));
    }

    #[test]
    fn test_zero_devtools_port_is_error() {
        let mut config = ScoutConfig::default();
        config.discovery.devtools_port = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.contains("discovery.devtools_port"));
        assert!(!err.contains("privileged"));
    }

    #[test]
    fn test_zero_probe_timeout_is_error() {
        let mut config = ScoutConfig::default();
        config.discovery.probe_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cache_capacity_is_error() {
        let mut config = ScoutConfig::default();
        config.discovery.cache_capacity = 0;
        assert!(config.validate().unwrap_err().contains("cache_capacity"));
    }

    #[test]
    fn test_device_socket_with_at_is_error() {
        let mut config = ScoutConfig::default();
        config.discovery.device_socket = Some("@chrome_devtools_remote".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_odd_listening_flags_warn() {
        let mut config = ScoutConfig::default();
        config.discovery.listening_flags = "10000".into();
        let warnings = config.validate().unwrap();
        assert!(
            warnings
                .iter()
                .any(|w| w.field == "discovery.listening_flags"
                    && w.severity == WarningSeverity::Warning)
        );
    }

    #[test]
    fn test_warning_display_includes_hint() {
        let w = ConfigWarning {
            field: "discovery.cache_capacity".into(),
            message: "cache capacity is 0".into(),
            severity: WarningSeverity::Error,
            hint: Some("Set to e.g. 100".into()),
        };
        let s = w.to_string();
        assert!(s.contains("discovery.cache_capacity"));
        assert!(s.contains("Set to e.g. 100"));
    }

    // ── Override tests ─────────────────────────────────────────

    #[test]
    fn test_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("WVSCOUT_DEVICE_SERIAL", "emulator-5554"),
            ("WVSCOUT_DEVICE_SOCKET", "chrome_devtools_remote"),
            ("WVSCOUT_DEVTOOLS_PORT", "12100"),
            ("WVSCOUT_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();
        let config = ConfigLoader::apply_overrides(ScoutConfig::default(), |k| {
            vars.get(k).map(|v| v.to_string())
        });
        assert_eq!(config.device.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(config.discovery.device_socket.as_deref(), Some("chrome_devtools_remote"));
        assert_eq!(config.discovery.devtools_port, Some(12100));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_android_serial_is_fallback_only() {
        let lookup = |k: &str| (k == "ANDROID_SERIAL").then(|| "from-env".to_string());

        let config = ConfigLoader::apply_overrides(ScoutConfig::default(), lookup);
        assert_eq!(config.device.serial.as_deref(), Some("from-env"));

        let mut file_config = ScoutConfig::default();
        file_config.device.serial = Some("from-file".into());
        let config = ConfigLoader::apply_overrides(file_config, lookup);
        assert_eq!(config.device.serial.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let lookup = |k: &str| (k == "WVSCOUT_DEVTOOLS_PORT").then(|| "not-a-port".to_string());
        let config = ConfigLoader::apply_overrides(ScoutConfig::default(), lookup);
        assert!(config.discovery.devtools_port.is_none());
    }

    #[test]
    fn test_empty_socket_override_clears_filter() {
        let mut base = ScoutConfig::default();
        base.discovery.device_socket = Some("chrome_devtools_remote".into());
        let lookup = |k: &str| (k == "WVSCOUT_DEVICE_SOCKET").then(String::new);
        let config = ConfigLoader::apply_overrides(base, lookup);
        assert!(config.discovery.device_socket.is_none());
    }

    // ── ConfigLoader tests ─────────────────────────────────────

    #[test]
    fn test_config_loader_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("wvscout.toml");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(
            f,
            r#"
[discovery]
ensure_webviews_have_pages = false
cache_capacity = 10

[port_guard]
base_port = 20000
port_window = 50
"#
        )
        .unwrap();

        let loader = ConfigLoader::load(Some(config_path.as_path())).unwrap();
        let config = loader.get();
        assert!(!config.discovery.ensure_webviews_have_pages);
        assert_eq!(config.discovery.cache_capacity, 10);
        assert_eq!(config.port_guard.base_port, 20000);
        assert_eq!(config.port_guard.port_window, 50);
        assert_eq!(loader.path(), config_path.as_path());
    }

    #[test]
    fn test_config_loader_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("wvscout.toml");
        std::fs::write(&config_path, "[discovery]\nprobe_timeout_ms = 0\n").unwrap();
        assert!(ConfigLoader::load(Some(config_path.as_path())).is_err());
    }

    #[test]
    fn test_config_loader_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("wvscout.toml");
        std::fs::write(&config_path, "[discovery\n").unwrap();
        let err = ConfigLoader::load(Some(config_path.as_path())).err().unwrap();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_config_loader_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("absent.toml");
        let loader = ConfigLoader::load(Some(config_path.as_path())).unwrap();
        assert_eq!(loader.get().port_guard.base_port, 10900);
    }

    #[test]
    fn test_config_loader_from_toml() {
        let loader = ConfigLoader::from_toml("[logging]\nformat = \"json\"\n").unwrap();
        assert_eq!(loader.get().logging.format, "json");
    }
}
