use crate::callgraph::RiskBands;
use crate::matcher::SimilarityWeights;
use crate::topology::{ImpactWeights, OwnershipRules, TopologyOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchscopeConfig {
    pub database: Option<String>,
    #[serde(default)]
    pub similarity: SimilarityWeights,
    #[serde(default)]
    pub impact: ImpactWeights,
    #[serde(default)]
    pub risk: RiskBands,
    #[serde(default)]
    pub ownership: OwnershipRules,
    /// Minimum similarity for a type-flow edge to count as a dependency
    #[serde(default = "default_flow_floor")]
    pub flow_floor: u32,
}

fn default_flow_floor() -> u32 {
    60
}

impl Default for ArchscopeConfig {
    fn default() -> Self {
        Self {
            database: None,
            similarity: SimilarityWeights::default(),
            impact: ImpactWeights::default(),
            risk: RiskBands::default(),
            ownership: OwnershipRules::default(),
            flow_floor: default_flow_floor(),
        }
    }
}

impl ArchscopeConfig {
    /// Database path resolution: an explicit CLI flag wins, then the config
    /// file's `database`, then `./archscope.db`.
    pub fn database_path(&self, cli: Option<PathBuf>) -> PathBuf {
        cli.or_else(|| self.database.clone().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("archscope.db"))
    }

    pub fn topology_options(&self) -> TopologyOptions {
        TopologyOptions {
            ownership: self.ownership.clone(),
            weights: self.impact.clone(),
            flow_floor: self.flow_floor,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("archscope.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".archscope").join("archscope.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<ArchscopeConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: ArchscopeConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &ArchscopeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
