//! Tests for error construction, messages and classification

#[cfg(test)]
mod tests {
    use snowpore::algorithm::pipeline::Stage;
    use snowpore::io::error::{SnowError, configuration_error, invalid_input};
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;

    // Tests that helper constructors fill the right variant
    // Verified by building every helper as a configuration error
    #[test]
    fn test_helpers_classify_errors() {
        let config = configuration_error("sigma", &-1.0, &"must not be negative");
        assert!(config.is_configuration());
        assert_eq!(config.stage(), None);

        let input = invalid_input(Stage::Validation, &"empty field");
        assert!(!input.is_configuration());
        assert_eq!(input.stage(), Some(Stage::Validation));
    }

    // Tests message formatting of each variant family
    // Verified by omitting the path from file error messages
    #[test]
    fn test_messages_include_context() {
        let config = configuration_error("threads", &0, &"needs a thread");
        assert_eq!(
            config.to_string(),
            "Invalid configuration 'threads' = '0': needs a thread"
        );

        let input = invalid_input(Stage::DistanceTransform, &"bad shape");
        assert_eq!(input.to_string(), "Invalid input at distance transform: bad shape");

        let fs = SnowError::FileSystem {
            path: PathBuf::from("out/net.json"),
            operation: "create file",
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = fs.to_string();
        assert!(message.contains("create file"));
        assert!(message.contains("out/net.json"));
    }

    // Tests that wrapped errors stay reachable through the source chain
    // Verified by removing the source attribute from the io variant
    #[test]
    fn test_sources_are_preserved() {
        let fs = SnowError::FileSystem {
            path: PathBuf::from("x"),
            operation: "open file",
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(fs.source().map(ToString::to_string), Some("gone".to_string()));

        let parse = serde_json::from_str::<u32>("nope").err();
        let serialization = parse.map(|source| SnowError::Serialization {
            path: PathBuf::from("tables.json"),
            source,
        });
        assert!(serialization.is_some_and(|e| e.source().is_some()));
    }

    // Tests conversion of io errors through the question mark operator
    // Verified by removing the From implementation
    #[test]
    fn test_io_errors_convert() {
        let converted = SnowError::from(io::Error::other("disk full"));
        assert!(matches!(converted, SnowError::FileSystem { .. }));
        assert!(converted.to_string().contains("disk full"));
    }
}
