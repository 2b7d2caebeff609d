//! TOML scenario files describing a headless session.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use waypoint_defence_core::{TowerKind, UpgradePath, Vec2};
use waypoint_defence_simulation::SimulationConfig;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Session parameters plus the towers the scripted player builds.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    pub(crate) simulation: SimulationConfig,
    #[serde(default)]
    pub(crate) towers: Vec<TowerPlan>,
}

/// A tower placed right before a given wave is requested.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerPlan {
    pub(crate) kind: TowerKind,
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default = "first_wave")]
    pub(crate) before_wave: u32,
    #[serde(default)]
    pub(crate) upgrades: Vec<UpgradePath>,
}

impl TowerPlan {
    pub(crate) fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Scenario {
    /// Loads and validates the scenario stored at `path`.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        parse_scenario(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }
}

fn default_version() -> u32 {
    SUPPORTED_SCENARIO_VERSION
}

fn first_wave() -> u32 {
    1
}

pub(crate) fn parse_scenario(contents: &str) -> Result<Scenario> {
    let scenario: Scenario =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    if scenario.version != SUPPORTED_SCENARIO_VERSION {
        bail!(
            "unsupported scenario version {}; expected {}",
            scenario.version,
            SUPPORTED_SCENARIO_VERSION
        );
    }

    scenario
        .simulation
        .validate()
        .context("scenario contains an invalid [simulation] table")?;

    for (index, tower) in scenario.towers.iter().enumerate() {
        if tower.before_wave == 0 || tower.before_wave > scenario.simulation.max_waves {
            bail!(
                "tower {index} is scheduled before wave {}, outside 1..={}",
                tower.before_wave,
                scenario.simulation.max_waves
            );
        }
        if tower.upgrades.len() > 3 {
            bail!("tower {index} lists {} upgrades; at most 3", tower.upgrades.len());
        }
    }

    Ok(scenario)
}
