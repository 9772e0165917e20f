//! Integration tests for error types

#[cfg(test)]
mod tests {
    use sprout_errors::*;

    #[test]
    fn test_error_conversion() {
        let index_err = IndexError::UndeclaredFlag {
            package: "zlib".into(),
            version: "1.3.0".into(),
            flag: "bundled".into(),
        };
        let err: Error = index_err.into();
        assert!(matches!(err, Error::Index(_)));
        assert_eq!(err.user_code(), Some("index.undeclared_flag"));
    }

    #[test]
    fn test_error_display() {
        let err = ResolverError::Unsatisfiable {
            conflicts: vec!["p".into(), "q".into()],
            trace: vec![],
        };
        assert_eq!(
            err.to_string(),
            "could not resolve dependencies: conflict between p, q"
        );
    }

    #[test]
    fn test_unsatisfiable_message_includes_trace() {
        let err = ResolverError::Unsatisfiable {
            conflicts: vec!["r".into()],
            trace: vec!["rejecting r-1.0.0: p requires >=2.0.0".into()],
        };
        let message = err.user_message();
        assert!(message.contains("rejecting r-1.0.0"));
        assert!(Error::from(err).is_unsatisfiable());
    }

    #[test]
    fn test_error_clone() {
        let err = ResolverError::UnknownTarget { name: "jq".into() };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err: Error = io_err.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_version_error_codes() {
        let err: Error = VersionError::InvalidConstraint {
            input: "=>1.0".into(),
        }
        .into();
        assert_eq!(err.user_code(), Some("version.invalid_range"));
        assert!(err.user_hint().is_some());
    }

    #[test]
    fn test_semver_error_conversion() {
        let parse_err = semver::Version::parse("not-a-version").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Version(VersionError::ParseError { .. })));
    }
}
