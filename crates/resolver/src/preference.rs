//! Order in which instances of a package are tried

use sprout_config::PreferenceKind;
use sprout_types::{Instance, Qpn};
use std::cmp::Ordering;

/// Injected comparator over candidate instances
///
/// `Ordering::Less` means `a` is tried before `b`. Implementations must be
/// total and deterministic.
pub trait Preference: Send + Sync {
    fn order(&self, qpn: &Qpn, a: &Instance, b: &Instance) -> Ordering;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Highest version first; installed before source on equal versions
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferNewest;

impl Preference for PreferNewest {
    fn order(&self, _qpn: &Qpn, a: &Instance, b: &Instance) -> Ordering {
        b.version.cmp(&a.version).then_with(|| a.cmp(b))
    }

    fn name(&self) -> &'static str {
        "newest"
    }
}

/// Installed instances first, then highest version
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferInstalled;

impl Preference for PreferInstalled {
    fn order(&self, qpn: &Qpn, a: &Instance, b: &Instance) -> Ordering {
        b.is_installed()
            .cmp(&a.is_installed())
            .then_with(|| PreferNewest.order(qpn, a, b))
    }

    fn name(&self) -> &'static str {
        "installed"
    }
}

/// Policy selected in configuration
#[must_use]
pub fn from_kind(kind: PreferenceKind) -> Box<dyn Preference> {
    match kind {
        PreferenceKind::Newest => Box::new(PreferNewest),
        PreferenceKind::Installed => Box::new(PreferInstalled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_types::Version;

    fn sorted(pref: &dyn Preference) -> Vec<String> {
        let qpn = Qpn::toplevel("zlib");
        let mut instances = vec![
            Instance::source(Version::new(1, 2, 0)),
            Instance::installed(Version::new(1, 2, 0), "zlib-1.2"),
            Instance::source(Version::new(1, 3, 0)),
            Instance::installed(Version::new(1, 1, 0), "zlib-1.1"),
        ];
        instances.sort_by(|a, b| pref.order(&qpn, a, b));
        instances.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_prefer_newest() {
        assert_eq!(
            sorted(&PreferNewest),
            vec![
                "1.3.0",
                "1.2.0/installed-zlib-1.2",
                "1.2.0",
                "1.1.0/installed-zlib-1.1"
            ]
        );
    }

    #[test]
    fn test_prefer_installed() {
        assert_eq!(
            sorted(&PreferInstalled),
            vec![
                "1.2.0/installed-zlib-1.2",
                "1.1.0/installed-zlib-1.1",
                "1.3.0",
                "1.2.0"
            ]
        );
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(from_kind(PreferenceKind::Installed).name(), "installed");
        assert_eq!(from_kind(PreferenceKind::Newest).name(), "newest");
    }
}
