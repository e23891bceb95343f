use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Which table is treated as the true optimal cost per instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundTruth {
    /// Costs proven by unit-weight baseline runs in the corpus.
    #[default]
    Derived,
    /// Costs supplied by a reference file (see [`crate::reference`]).
    Reference,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct AnalysisConfig {
    /// Log file extensions (without the dot); a trailing `.gz` is always accepted.
    #[serde(default = "defaults::extensions")]
    pub extensions: Vec<String>,

    /// Weight at which a bounded search is guaranteed optimal.
    #[serde(default = "defaults::baseline_weight")]
    pub baseline_weight: f64,

    /// Algorithms that never prove optimality, even at the baseline weight.
    #[serde(default = "defaults::greedy_only_algorithms")]
    pub greedy_only_algorithms: Vec<String>,

    /// Algorithms with no suboptimality bound; only the lower quality bound applies.
    #[serde(default = "defaults::unbounded_algorithms")]
    pub unbounded_algorithms: Vec<String>,

    #[serde(default)]
    pub ground_truth: GroundTruth,

    /// Reference costs file, required when `ground_truth = "reference"`.
    #[serde(default)]
    pub reference: Option<PathBuf>,

    #[serde(default)]
    pub statistics: Statistics,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, Default)]
pub struct Statistics {
    /// Blend coefficients to evaluate. When omitted, the epsilons present in
    /// the result dataset are used.
    #[serde(default)]
    pub epsilons: Option<Vec<f64>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extensions: defaults::extensions(),
            baseline_weight: defaults::baseline_weight(),
            greedy_only_algorithms: defaults::greedy_only_algorithms(),
            unbounded_algorithms: defaults::unbounded_algorithms(),
            ground_truth: GroundTruth::default(),
            reference: None,
            statistics: Statistics::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn is_greedy_only(&self, alg: &str) -> bool {
        self.greedy_only_algorithms.iter().any(|a| a == alg)
    }

    pub fn is_unbounded(&self, alg: &str) -> bool {
        self.unbounded_algorithms.iter().any(|a| a == alg)
    }
}

mod defaults {
    pub fn extensions() -> Vec<String> { vec!["out".into(), "txt".into(), "log".into()] }
    pub fn baseline_weight() -> f64 { 1.0 }
    pub fn greedy_only_algorithms() -> Vec<String> { vec!["gbfs".into()] }
    pub fn unbounded_algorithms() -> Vec<String> { vec!["gbfs".into()] }
}
