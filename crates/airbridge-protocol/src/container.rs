//! Version-ordered registry of migration steps.

use std::collections::BTreeMap;

use airbridge_types::Version;

use crate::error::{ProtocolError, Result};
use crate::migration::MigrationStep;

/// Immutable, sorted chain of migration steps.
///
/// Steps are keyed by the major version they migrate *from*. The chain must
/// be contiguous (each step starts at the major the previous one ends at), and
/// its last step's `current_version()` is the canonical version.
pub struct MigrationContainer<T: ?Sized> {
    migrations: BTreeMap<u32, Box<T>>,
    most_recent: Option<Version>,
}

impl<T: ?Sized + MigrationStep> MigrationContainer<T> {
    /// Build a chain from an unordered set of steps.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DuplicateMigration`] when two steps start at
    /// the same major, and [`ProtocolError::InvalidChain`] for dev versions,
    /// steps that skip a major, and gaps.
    pub fn new(steps: Vec<Box<T>>) -> Result<Self> {
        let mut migrations = BTreeMap::new();
        for step in steps {
            let (Some(from), Some(to)) = (step.previous_version().major(), step.current_version().major()) else {
                return Err(invalid(format!(
                    "step {} -> {} uses a dev version",
                    step.previous_version(),
                    step.current_version()
                )));
            };
            if to != from + 1 {
                return Err(invalid(format!(
                    "step {} -> {} must advance exactly one major version",
                    step.previous_version(),
                    step.current_version()
                )));
            }
            if migrations.contains_key(&from) {
                return Err(ProtocolError::DuplicateMigration { major: from });
            }
            migrations.insert(from, step);
        }

        let mut expected: Option<u32> = None;
        for (from, step) in &migrations {
            if let Some(expected) = expected {
                if *from != expected {
                    return Err(invalid(format!(
                        "gap in migration chain: no step from major version {expected}"
                    )));
                }
            }
            expected = step.current_version().major();
        }

        let most_recent = migrations
            .values()
            .next_back()
            .map(|step| step.current_version().clone());

        Ok(Self {
            migrations,
            most_recent,
        })
    }

    /// Canonical version: the `current_version()` of the newest step.
    #[must_use]
    pub fn most_recent_version(&self) -> Option<&Version> {
        self.most_recent.as_ref()
    }

    /// Whether moving between `version` and the canonical version applies at
    /// least one step.
    #[must_use]
    pub fn needs_migration(&self, version: &Version) -> bool {
        match (version.major(), self.canonical_major()) {
            (Some(major), Some(canonical)) => major != canonical,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Move `value` from `source` up to the canonical version.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnsupportedVersion`] when no path exists,
    /// otherwise whatever `apply` returns.
    pub fn upgrade<M>(&self, value: M, source: &Version, apply: impl Fn(&T, M) -> Result<M>) -> Result<M> {
        let Some(steps) = self.select(source)? else {
            return Ok(value);
        };
        steps.into_iter().try_fold(value, |acc, step| apply(step, acc))
    }

    /// Move `value` from the canonical version down to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnsupportedVersion`] when no path exists,
    /// otherwise whatever `apply` returns.
    pub fn downgrade<M>(&self, value: M, target: &Version, apply: impl Fn(&T, M) -> Result<M>) -> Result<M> {
        let Some(steps) = self.select(target)? else {
            return Ok(value);
        };
        steps.into_iter().rev().try_fold(value, |acc, step| apply(step, acc))
    }

    fn canonical_major(&self) -> Option<u32> {
        self.most_recent.as_ref().and_then(Version::major)
    }

    /// Steps between `version` and canonical, ascending. `None` means no-op.
    fn select(&self, version: &Version) -> Result<Option<Vec<&T>>> {
        if !self.needs_migration(version) {
            return Ok(None);
        }
        let unsupported = || ProtocolError::unsupported(version, self.most_recent.as_ref());
        let major = version.major().ok_or_else(unsupported)?;
        if !self.migrations.contains_key(&major) {
            return Err(unsupported());
        }
        Ok(Some(
            self.migrations
                .range(major..)
                .map(|(_, step)| step.as_ref())
                .collect(),
        ))
    }
}

fn invalid(reason: String) -> ProtocolError {
    ProtocolError::InvalidChain { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Step {
        previous: Version,
        current: Version,
    }

    impl MigrationStep for Step {
        fn previous_version(&self) -> &Version {
            &self.previous
        }

        fn current_version(&self) -> &Version {
            &self.current
        }
    }

    fn step(previous: &str, current: &str) -> Box<Step> {
        Box::new(Step {
            previous: Version::parse(previous).unwrap(),
            current: Version::parse(current).unwrap(),
        })
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    /// Records the path a value takes through the chain.
    fn trace(step: &Step, mut path: Vec<String>) -> Result<Vec<String>> {
        path.push(format!("{}->{}", step.previous, step.current));
        Ok(path)
    }

    fn chain() -> MigrationContainer<Step> {
        MigrationContainer::new(vec![step("1.0.0", "2.0.0"), step("0.3.0", "1.0.0"), step("2.0.0", "3.0.0")]).unwrap()
    }

    #[test]
    fn most_recent_is_last_step_current() {
        assert_eq!(chain().most_recent_version(), Some(&v("3.0.0")));
    }

    #[test]
    fn upgrade_walks_steps_ascending() {
        let path = chain().upgrade(Vec::new(), &v("0.2.0"), trace).unwrap();
        assert_eq!(path, vec!["0.3.0->1.0.0", "1.0.0->2.0.0", "2.0.0->3.0.0"]);

        let path = chain().upgrade(Vec::new(), &v("2.1.0"), trace).unwrap();
        assert_eq!(path, vec!["2.0.0->3.0.0"]);
    }

    #[test]
    fn downgrade_walks_steps_descending() {
        let path = chain().downgrade(Vec::new(), &v("1.4.0"), trace).unwrap();
        assert_eq!(path, vec!["2.0.0->3.0.0", "1.0.0->2.0.0"]);
    }

    #[test]
    fn canonical_major_and_dev_are_no_ops() {
        assert!(chain().upgrade(Vec::new(), &v("3.2.1"), trace).unwrap().is_empty());
        assert!(chain().downgrade(Vec::new(), &v("dev"), trace).unwrap().is_empty());
        assert!(!chain().needs_migration(&v("dev")));
    }

    #[test]
    fn newer_than_canonical_is_unsupported() {
        let err = chain().upgrade(Vec::new(), &v("4.0.0"), trace).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedVersion { .. }));
    }

    #[test]
    fn older_than_chain_is_unsupported() {
        let container = MigrationContainer::new(vec![step("1.0.0", "2.0.0")]).unwrap();
        let err = container.downgrade(Vec::new(), &v("0.3.0"), trace).unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedVersion { .. }));
    }

    #[test]
    fn empty_chain_only_accepts_dev() {
        let container: MigrationContainer<Step> = MigrationContainer::new(vec![]).unwrap();
        assert!(container.most_recent_version().is_none());
        assert!(container.upgrade(Vec::new(), &v("dev"), trace).is_ok());
        assert!(container.upgrade(Vec::new(), &v("1.0.0"), trace).is_err());
    }

    #[test]
    fn rejects_duplicate_steps() {
        let result = MigrationContainer::new(vec![step("0.3.0", "1.0.0"), step("0.4.0", "1.1.0")]);
        assert!(matches!(result, Err(ProtocolError::DuplicateMigration { major: 0 })));
    }

    #[test]
    fn rejects_gaps_and_skips() {
        let gap = MigrationContainer::new(vec![step("0.3.0", "1.0.0"), step("2.0.0", "3.0.0")]);
        assert!(matches!(gap, Err(ProtocolError::InvalidChain { .. })));
        let skip = MigrationContainer::new(vec![step("0.3.0", "2.0.0")]);
        assert!(matches!(skip, Err(ProtocolError::InvalidChain { .. })));
        let dev = MigrationContainer::new(vec![step("dev", "1.0.0")]);
        assert!(matches!(dev, Err(ProtocolError::InvalidChain { .. })));
    }
}
