//! Qualification of dependencies into resolution roles

use crate::index::Index;
use serde::{Deserialize, Serialize};
use sprout_types::flagged::flatten;
use sprout_types::{DepKind, Dependency, PackageName, Qpn, Qualifier};
use tracing::debug;

/// Global options controlling how dependencies are qualified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyOptions {
    /// Keep a single shared copy of the bootstrap package in every role
    pub base_shim: bool,
    /// Resolve build-script and build-tool dependencies independently
    pub setup_independent: bool,
}

impl Default for QualifyOptions {
    fn default() -> Self {
        Self {
            base_shim: false,
            setup_independent: true,
        }
    }
}

/// Derive the qualification options for an index
///
/// `base_shim` is set when any installed instance depends on `bootstrap`,
/// ignoring conditions. `setup_independent` is always on.
#[must_use]
pub fn derive_qualify_options(index: &Index, bootstrap: &PackageName) -> QualifyOptions {
    let base_shim = index.entries().any(|(_, instance, info)| {
        instance.is_installed() && flatten(&info.deps).iter().any(|dep| dep.name == *bootstrap)
    });
    let options = QualifyOptions {
        base_shim,
        setup_independent: true,
    };
    debug!(?options, bootstrap = %bootstrap, "derived qualify options");
    options
}

/// Qualified name a dependency of `parent` resolves under
#[must_use]
pub fn qualify_dependency(
    options: &QualifyOptions,
    bootstrap: &PackageName,
    parent: &Qpn,
    dep: &Dependency,
) -> Qpn {
    if options.base_shim && dep.name == *bootstrap {
        return Qpn::toplevel(dep.name.clone());
    }
    let qualifier = match dep.kind {
        DepKind::Setup if options.setup_independent => Qualifier::Setup(parent.name.clone()),
        DepKind::BuildTool if options.setup_independent => {
            Qualifier::Exe(parent.name.clone(), dep.name.clone())
        }
        _ => parent.qualifier.clone(),
    };
    Qpn::new(qualifier, dep.name.clone())
}
