//! Checks applied to an instance before it is chosen

use crate::conflict::{Conflict, ConflictKind, ConflictSet, Var};
use crate::constraint::ConstraintKind;
use crate::state::{Requirement, SearchState};
use sprout_types::{Instance, PInfo, Qpn};

/// Check an instance of `qpn` against user constraints and every
/// requirement recorded so far
///
/// Returns the conflict of the first violated rule.
pub(crate) fn validate_instance(
    state: &SearchState,
    constraints: &[ConstraintKind],
    qpn: &Qpn,
    instance: &Instance,
    info: &PInfo,
) -> Option<Conflict> {
    constraints
        .iter()
        .find_map(|constraint| check_user_constraint(constraint, qpn, instance))
        .or_else(|| {
            state
                .requirements(qpn)
                .iter()
                .find_map(|requirement| check_requirement(requirement, qpn, instance, info))
        })
}

/// User constraints are global, so a violation depends on no decision but
/// the package itself
fn check_user_constraint(
    constraint: &ConstraintKind,
    qpn: &Qpn,
    instance: &Instance,
) -> Option<Conflict> {
    let satisfied = match constraint {
        ConstraintKind::Version(spec) => spec.matches(&instance.version),
        ConstraintKind::Installed => instance.is_installed(),
        ConstraintKind::Source => !instance.is_installed(),
        ConstraintKind::Flag(..) | ConstraintKind::Stanzas(_) => true,
    };
    (!satisfied).then(|| {
        Conflict::leaf(
            qpn.clone(),
            ConflictKind::UserConstraint {
                instance: instance.clone(),
                constraint: constraint.clone(),
            },
            ConflictSet::singleton(Var::Package(qpn.clone())),
        )
    })
}

/// Check one dependency against the instance chosen (or about to be chosen)
/// for its target
pub(crate) fn check_requirement(
    requirement: &Requirement,
    target: &Qpn,
    instance: &Instance,
    info: &PInfo,
) -> Option<Conflict> {
    let dependency = &requirement.dependency;
    let kind = if !dependency.requirement.admits(instance) {
        ConflictKind::Requirement {
            instance: instance.clone(),
            requirement: dependency.requirement.clone(),
            required_by: requirement.from.clone(),
            required_by_instance: requirement.from_instance.clone(),
        }
    } else if !info.provides(&dependency.component) {
        ConflictKind::ComponentUnavailable {
            instance: instance.clone(),
            component: dependency.component.clone(),
            required_by: requirement.from.clone(),
            required_by_instance: requirement.from_instance.clone(),
        }
    } else {
        return None;
    };

    let set = requirement.path.with(Var::Package(target.clone()));
    Some(Conflict::leaf(target.clone(), kind, set))
}

/// A requirement on a stanza component arriving after that stanza of the
/// target was disabled
pub(crate) fn check_stanza(
    state: &SearchState,
    requirement: &Requirement,
    target: &Qpn,
) -> Option<Conflict> {
    let component = &requirement.dependency.component;
    let stanza = component.stanza()?;
    if state.stanza(target, stanza) != Some(false) {
        return None;
    }

    let set = requirement
        .path
        .with(Var::Package(target.clone()))
        .with(Var::Stanza(target.clone(), stanza));
    Some(Conflict::leaf(
        target.clone(),
        ConflictKind::StanzaDisabled {
            stanza,
            component: component.clone(),
            required_by: requirement.from.clone(),
            required_by_instance: requirement.from_instance.clone(),
        },
        set,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_types::{Component, Dependency, OptionalStanza, Version, VersionSpec};

    fn requirement(dep: Dependency) -> Requirement {
        let from = Qpn::toplevel("app");
        Requirement {
            dependency: dep,
            from: from.clone(),
            from_instance: Instance::source(Version::new(1, 0, 0)),
            path: ConflictSet::singleton(Var::Package(from)),
        }
    }

    #[test]
    fn test_requirement_range() {
        let lib = Qpn::toplevel("lib");
        let req = requirement(Dependency::range(
            "lib",
            ">=2.0".parse::<VersionSpec>().unwrap(),
        ));
        let info = PInfo::library(vec![]);

        assert!(check_requirement(&req, &lib, &Instance::source(Version::new(2, 1, 0)), &info)
            .is_none());

        let conflict =
            check_requirement(&req, &lib, &Instance::source(Version::new(1, 0, 0)), &info)
                .unwrap();
        assert!(conflict.set.contains(&Var::Package(lib)));
        assert!(conflict.set.contains(&Var::Package(Qpn::toplevel("app"))));
        assert!(matches!(
            conflict.trace[0].kind,
            ConflictKind::Requirement { .. }
        ));
    }

    #[test]
    fn test_requirement_component() {
        let tool = Qpn::toplevel("alex");
        let req = requirement(
            Dependency::library("alex").with_component(Component::Executable("alex".into())),
        );
        let no_exe = PInfo::library(vec![]);
        let conflict =
            check_requirement(&req, &tool, &Instance::source(Version::new(3, 0, 0)), &no_exe)
                .unwrap();
        assert!(matches!(
            conflict.trace[0].kind,
            ConflictKind::ComponentUnavailable { .. }
        ));

        let with_exe = no_exe.with_component(Component::Executable("alex".into()), true);
        assert!(
            check_requirement(&req, &tool, &Instance::source(Version::new(3, 0, 0)), &with_exe)
                .is_none()
        );
    }

    #[test]
    fn test_suite_requirement_against_disabled_stanza() {
        let lib = Qpn::toplevel("lib");
        let req = requirement(
            Dependency::library("lib").with_component(Component::TestSuite("unit".into())),
        );
        let mut state = SearchState::default();
        state.assign_package(lib.clone(), Instance::source(Version::new(1, 0, 0)));
        assert!(check_stanza(&state, &req, &lib).is_none());

        state.assign_stanza(lib.clone(), OptionalStanza::Tests, false);
        let conflict = check_stanza(&state, &req, &lib).unwrap();
        assert!(conflict
            .set
            .contains(&Var::Stanza(lib.clone(), OptionalStanza::Tests)));
        assert!(conflict.set.contains(&Var::Package(Qpn::toplevel("app"))));

        let library = requirement(Dependency::library("lib"));
        assert!(check_stanza(&state, &library, &lib).is_none());
    }

    #[test]
    fn test_user_constraints() {
        let qpn = Qpn::toplevel("zlib");
        let state = SearchState::default();
        let info = PInfo::library(vec![]);
        let source = Instance::source(Version::new(1, 3, 0));
        let installed = Instance::installed(Version::new(1, 2, 0), "zlib-1.2");

        let only_installed = [ConstraintKind::Installed];
        assert!(validate_instance(&state, &only_installed, &qpn, &source, &info).is_some());
        assert!(validate_instance(&state, &only_installed, &qpn, &installed, &info).is_none());

        let range = [ConstraintKind::Version("<1.3".parse().unwrap())];
        let conflict = validate_instance(&state, &range, &qpn, &source, &info).unwrap();
        assert_eq!(
            conflict.set,
            ConflictSet::singleton(Var::Package(qpn.clone()))
        );
        assert!(validate_instance(&state, &range, &qpn, &installed, &info).is_none());
    }
}
