use pollprobe::{ConfigError, Provider, SelectorConfig, acquire, release};

// Runs as a single test: the strategy is resolved once per process.
#[test]
fn test_installed_config_drives_resolution() {
    let _ = env_logger::builder().is_test(true).try_init();

    SelectorConfig::new()
        .provider(Provider::platform_default())
        .oneshot(false)
        .install()
        .expect("first install must succeed");

    let selector = acquire().unwrap();
    assert_eq!(selector.backend(), Provider::platform_default().as_str());
    release();

    assert_eq!(
        SelectorConfig::new().install(),
        Err(ConfigError::AlreadyResolved)
    );
}
