//! TOML scenario files describing a headless session.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use rampart_core::{
    Seconds, StructureKind, StructureProfile, UnitKind, UnitProfile, Vec2, WaveInfo, WaveSet,
    DEFAULT_PREPARATION_SECONDS,
};
use rampart_world::{SpawnSite, WorldConfig, DEFAULT_FLIGHT_TIME, DEFAULT_PREWARM};
use serde::Deserialize;
use thiserror::Error;

/// Complete description of a session: map, catalogs, placements and waves.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub(crate) seed: u64,
    pub(crate) map: MapConfig,
    #[serde(default = "default_preparation")]
    pub(crate) preparation: Seconds,
    #[serde(default)]
    pub(crate) projectiles: ProjectileSettings,
    #[serde(default)]
    pub(crate) units: BTreeMap<UnitKind, UnitProfile>,
    #[serde(default)]
    pub(crate) structures: BTreeMap<StructureKind, StructureProfile>,
    #[serde(default)]
    pub(crate) placements: Vec<Placement>,
    #[serde(default)]
    pub(crate) waves: Vec<WaveInfo>,
}

/// Spawn area and goal of the map.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct MapConfig {
    pub(crate) spawn: Vec2,
    #[serde(default)]
    pub(crate) spawn_radius: f32,
    pub(crate) goal: Vec2,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProjectileSettings {
    #[serde(default = "default_prewarm")]
    pub(crate) prewarm: usize,
    #[serde(default = "default_flight_time")]
    pub(crate) flight_time: Seconds,
}

impl Default for ProjectileSettings {
    fn default() -> Self {
        Self {
            prewarm: default_prewarm(),
            flight_time: default_flight_time(),
        }
    }
}

/// Structure placed during the first preparation phase.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Placement {
    pub(crate) kind: StructureKind,
    pub(crate) position: Vec2,
}

/// Structural problems detected after a scenario parsed.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ScenarioError {
    /// A placement names a structure kind missing from the catalog.
    #[error("placement {index} names unknown structure kind `{kind}`")]
    UnknownStructure {
        /// Zero-based position of the placement in the file.
        index: usize,
        /// Kind named by the placement.
        kind: StructureKind,
    },
    /// The spawn radius cannot describe a disc.
    #[error("spawn radius must be finite and non-negative, got {0}")]
    InvalidSpawnRadius(f32),
    /// A unit kind would spawn without health.
    #[error("unit kind `{0}` must have positive max_health")]
    UnitWithoutHealth(UnitKind),
    /// A structure kind would be built without health.
    #[error("structure kind `{0}` must have positive max_health")]
    StructureWithoutHealth(StructureKind),
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        let radius = self.map.spawn_radius;
        if !radius.is_finite() || radius < 0.0 {
            return Err(ScenarioError::InvalidSpawnRadius(radius));
        }

        if let Some(kind) = self
            .units
            .iter()
            .find_map(|(kind, profile)| (!has_health(profile.max_health)).then_some(kind))
        {
            return Err(ScenarioError::UnitWithoutHealth(kind.clone()));
        }
        if let Some(kind) = self
            .structures
            .iter()
            .find_map(|(kind, profile)| (!has_health(profile.max_health)).then_some(kind))
        {
            return Err(ScenarioError::StructureWithoutHealth(kind.clone()));
        }

        for (index, placement) in self.placements.iter().enumerate() {
            if !self.structures.contains_key(&placement.kind) {
                return Err(ScenarioError::UnknownStructure {
                    index,
                    kind: placement.kind.clone(),
                });
            }
        }

        for (wave, info) in self.waves.iter().enumerate() {
            for group in info
                .groups
                .iter()
                .filter(|group| !self.units.contains_key(&group.kind))
            {
                tracing::warn!(
                    wave,
                    kind = %group.kind,
                    "wave references an unregistered unit kind; its spawns will fail"
                );
            }
        }

        Ok(())
    }

    /// Builds the world configuration, using `seed` for spawn sampling.
    pub(crate) fn world_config(&self, seed: u64) -> WorldConfig {
        if !self.projectiles.flight_time.is_valid() {
            tracing::warn!(
                value = self.projectiles.flight_time.get(),
                "projectile flight time is invalid; using zero"
            );
        }

        WorldConfig {
            waves: WaveSet::new(self.preparation, self.waves.clone()),
            unit_kinds: self.units.clone(),
            structure_kinds: self.structures.clone(),
            spawn_site: SpawnSite::new(self.map.spawn, self.map.spawn_radius),
            goal: self.map.goal,
            seed,
            projectile_prewarm: self.projectiles.prewarm,
            flight_time: self.projectiles.flight_time.to_duration(),
        }
    }
}

fn has_health(max_health: f32) -> bool {
    max_health.is_finite() && max_health > 0.0
}

fn default_preparation() -> Seconds {
    Seconds::new(DEFAULT_PREPARATION_SECONDS)
}

fn default_prewarm() -> usize {
    DEFAULT_PREWARM
}

fn default_flight_time() -> Seconds {
    Seconds::new(DEFAULT_FLIGHT_TIME.as_secs_f32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{AttackType, UnitBehavior};
    use std::time::Duration;

    const SKIRMISH: &str = include_str!("../scenarios/skirmish.toml");

    #[test]
    fn bundled_skirmish_parses() {
        let scenario = Scenario::parse(SKIRMISH).expect("skirmish scenario is valid");

        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.waves.len(), 3);
        assert_eq!(scenario.placements.len(), 3);
        assert_eq!(
            scenario.structures[&StructureKind::new("flak")].attack,
            AttackType::Multi
        );
        assert!(matches!(
            scenario.units[&UnitKind::new("raider")].behavior,
            UnitBehavior::Raider { .. }
        ));

        let config = scenario.world_config(3);
        assert_eq!(config.seed, 3);
        assert_eq!(config.flight_time, Duration::from_millis(500));
        assert_eq!(config.waves.preparation, Seconds::new(3.0));
    }

    #[test]
    fn omitted_sections_use_defaults() {
        let scenario = Scenario::parse(
            r#"
            [map]
            spawn = [0.0, 0.0]
            goal = [10.0, 0.0]
            "#,
        )
        .expect("minimal scenario is valid");

        assert_eq!(scenario.preparation, Seconds::new(DEFAULT_PREPARATION_SECONDS));
        assert_eq!(scenario.projectiles.prewarm, DEFAULT_PREWARM);
        assert_eq!(scenario.world_config(0).flight_time, DEFAULT_FLIGHT_TIME);
        assert!(scenario.waves.is_empty());
        assert_eq!(scenario.map.spawn_radius, 0.0);
    }

    #[test]
    fn unknown_placement_kind_is_rejected() {
        let error = Scenario::parse(
            r#"
            [map]
            spawn = [0.0, 0.0]
            goal = [10.0, 0.0]

            [[placements]]
            kind = "trebuchet"
            position = [1.0, 1.0]
            "#,
        )
        .expect_err("placement references a missing kind");

        assert_eq!(
            error.downcast_ref::<ScenarioError>(),
            Some(&ScenarioError::UnknownStructure {
                index: 0,
                kind: StructureKind::new("trebuchet"),
            })
        );
    }

    #[test]
    fn negative_spawn_radius_is_rejected() {
        let error = Scenario::parse(
            r#"
            [map]
            spawn = [0.0, 0.0]
            spawn_radius = -2.0
            goal = [10.0, 0.0]
            "#,
        )
        .expect_err("radius is negative");

        assert_eq!(
            error.downcast_ref::<ScenarioError>(),
            Some(&ScenarioError::InvalidSpawnRadius(-2.0))
        );
    }

    #[test]
    fn unit_without_health_is_rejected() {
        let error = Scenario::parse(
            r#"
            [map]
            spawn = [0.0, 0.0]
            goal = [10.0, 0.0]

            [units.ghost]
            max_health = 0.0
            speed = 1.0
            behavior = { type = "runner" }
            "#,
        )
        .expect_err("unit has no health");

        assert_eq!(
            error.downcast_ref::<ScenarioError>(),
            Some(&ScenarioError::UnitWithoutHealth(UnitKind::new("ghost")))
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = Scenario::parse(
            r#"
            [map]
            spawn = [0.0, 0.0]
            goal = [10.0, 0.0]
            spawn_radus = 3.0
            "#,
        );
        assert!(result.is_err());
    }
}
