//! Assertion helpers for the persona error taxonomy

/// Assert that a result failed with a configuration error matching a pattern
#[macro_export]
macro_rules! assert_config_error {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err(err) => {
                let config = err.as_configuration();
                assert!(
                    matches!(config, Some($pattern)),
                    "Expected configuration error {}, got {:?}",
                    stringify!($pattern),
                    err
                )
            }
            Ok(value) => panic!("Expected configuration error, got Ok({:?})", value),
        }
    };
}

/// Assert that a result failed with a usage error matching a pattern
#[macro_export]
macro_rules! assert_usage_error {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err(err) => {
                let usage = err.as_usage();
                assert!(
                    matches!(usage, Some($pattern)),
                    "Expected usage error {}, got {:?}",
                    stringify!($pattern),
                    err
                )
            }
            Ok(value) => panic!("Expected usage error, got Ok({:?})", value),
        }
    };
}

/// Assert that a result failed with a storage error
#[macro_export]
macro_rules! assert_storage_error {
    ($result:expr) => {
        match $result {
            Err(err) => assert!(err.is_storage(), "Expected storage error, got {:?}", err),
            Ok(value) => panic!("Expected storage error, got Ok({:?})", value),
        }
    };
}
