//! Version chain and migration path resolution
//!
//! The chain of supported versions is fixed at configuration time and only ever
//! walked forward. Resolution fails fast on unknown versions instead of
//! guessing the nearest one.

use crate::error::MigrateError;
use crate::rule::MigrationUnit;

/// A registered set of versions and the units bridging them
#[derive(Default)]
pub struct MigrationSet {
    versions: Vec<String>,
    units: Vec<MigrationUnit>,
}

/// Ordered sequence of units bridging a start and target version
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub units: Vec<MigrationUnit>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit keys in application order
    pub fn keys(&self) -> Vec<String> {
        self.units.iter().map(|u| u.key()).collect()
    }
}

impl MigrationSet {
    /// Create a set over an ordered version chain
    pub fn new(versions: &[&str]) -> Self {
        MigrationSet {
            versions: versions.iter().map(|v| v.to_string()).collect(),
            units: Vec::new(),
        }
    }

    /// Register a migration unit. Units for the same version pair apply in
    /// ascending part order regardless of registration order.
    pub fn add_unit(&mut self, unit: MigrationUnit) {
        self.units.push(unit);
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// All registered unit keys, in chain order
    pub fn unit_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for pair in self.versions.windows(2) {
            for unit in self.units_for(&pair[0], &pair[1]) {
                keys.push(unit.key());
            }
        }
        keys
    }

    fn index_of(&self, version: &str) -> Option<usize> {
        self.versions.iter().position(|v| v == version)
    }

    fn units_for(&self, from: &str, to: &str) -> Vec<&MigrationUnit> {
        let mut step: Vec<&MigrationUnit> = self
            .units
            .iter()
            .filter(|u| u.from_version == from && u.to_version == to)
            .collect();
        step.sort_by_key(|u| u.part.unwrap_or(0));
        step
    }

    /// Resolve the ordered unit sequence from `start` to `target`.
    ///
    /// `start == target` yields an empty plan. Backward requests and gaps with
    /// no registered unit are `NoPathFound`; unknown versions are
    /// `InvalidVersion`.
    pub fn resolve(&self, start: &str, target: &str) -> Result<MigrationPlan, MigrateError> {
        let from = self
            .index_of(start)
            .ok_or_else(|| MigrateError::InvalidVersion(start.to_string()))?;
        let to = self
            .index_of(target)
            .ok_or_else(|| MigrateError::InvalidVersion(target.to_string()))?;

        if from == to {
            return Ok(MigrationPlan::default());
        }
        if from > to {
            return Err(MigrateError::NoPathFound {
                from: start.to_string(),
                to: target.to_string(),
            });
        }

        let mut units = Vec::new();
        for pair in self.versions[from..=to].windows(2) {
            let step = self.units_for(&pair[0], &pair[1]);
            if step.is_empty() {
                return Err(MigrateError::NoPathFound {
                    from: pair[0].clone(),
                    to: pair[1].clone(),
                });
            }
            units.extend(step.into_iter().cloned());
        }
        Ok(MigrationPlan { units })
    }
}
