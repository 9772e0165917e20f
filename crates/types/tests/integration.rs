//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sprout_types::*;
    use std::str::FromStr;

    #[test]
    fn test_version_spec_complex() {
        let spec = VersionSpec::from_str(">=1.2.0,<2.0.0,!=1.5.0").unwrap();

        assert!(!spec.matches(&Version::parse("1.1.9").unwrap()));
        assert!(spec.matches(&Version::parse("1.2.0").unwrap()));
        assert!(spec.matches(&Version::parse("1.4.9").unwrap()));
        assert!(!spec.matches(&Version::parse("1.5.0").unwrap())); // Excluded
        assert!(spec.matches(&Version::parse("1.5.1").unwrap()));
        assert!(spec.matches(&Version::parse("1.9.9").unwrap()));
        assert!(!spec.matches(&Version::parse("2.0.0").unwrap()));
    }

    #[test]
    fn test_package_spec_with_complex_version() {
        let spec = PackageSpec::parse("libfoo>=2.0,<3.0,!=2.5.0").unwrap();
        assert_eq!(spec.name, PackageName::new("libfoo"));

        let v = Version::parse("2.5.0").unwrap();
        assert!(!spec.version_spec.matches(&v));

        let v = Version::parse("2.4.9").unwrap();
        assert!(spec.version_spec.matches(&v));
    }

    #[test]
    fn test_pinfo_json_roundtrip() {
        let info = PInfo::library(vec![FlaggedDep::Flagged {
            flag: FlagName::new("threaded"),
            if_true: vec![FlaggedDep::Simple(Dependency::library("pthreads"))],
            if_false: vec![],
        }])
        .with_flag("threaded", FlagInfo::automatic(true))
        .with_component(Component::Executable("tool".into()), false);

        let json = serde_json::to_string(&info).unwrap();
        let back: PInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }

    fn version_strategy() -> impl Strategy<Value = Version> {
        (0u64..5, 0u64..5, 0u64..5).prop_map(|(a, b, c)| Version::new(a, b, c))
    }

    proptest! {
        #[test]
        fn prop_range_is_intersection(
            low in version_strategy(),
            high in version_strategy(),
            candidate in version_strategy(),
        ) {
            let both = VersionSpec::from_str(&format!(">={low},<{high}")).unwrap();
            prop_assert_eq!(both.matches(&candidate), candidate >= low && candidate < high);
        }

        #[test]
        fn prop_spec_display_parses_back(low in version_strategy(), skip in version_strategy()) {
            let spec = VersionSpec::from_str(&format!(">={low},!={skip}")).unwrap();
            let reparsed = VersionSpec::from_str(&spec.to_string()).unwrap();
            prop_assert_eq!(reparsed, spec);
        }
    }
}
