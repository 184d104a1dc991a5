//! Configuration loading from experiments_config.json
//!
//! A sweep configuration document has two optional sections:
//!
//! ```json
//! {
//!   "defaults": { "drones": [2, 3], "ticks": 50 },
//!   "experiments": [
//!     { "name": "fast", "iterations": 500 },
//!     { "repeats": 5 }
//!   ]
//! }
//! ```
//!
//! Fields resolve in three layers, each field independently:
//! built-in defaults → `defaults` → the experiment entry. A missing document
//! yields a single experiment named `default` built from the built-in layer.
//! Documents ending in `.toml` are read as TOML with the same schema.

use serde::Deserialize;
use serde::de::{self, Deserializer, Visitor};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uavsweep_report::SweepParameters;

/// Name given to the experiment produced when no entries are declared
pub const DEFAULT_EXPERIMENT_NAME: &str = "default";

/// Configuration errors. All of them are fatal and raised before any run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document exists but could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Document path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Invalid JSON, or JSON that does not fit the schema
    #[error("Malformed JSON config {path}: {source}")]
    Json {
        /// Document path
        path: PathBuf,
        /// Parser error
        source: serde_json::Error,
    },

    /// Invalid TOML, or TOML that does not fit the schema
    #[error("Malformed TOML config {path}: {source}")]
    Toml {
        /// Document path
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },

    /// A list field resolved to no values
    #[error("Experiment '{experiment}': `{field}` must not be empty")]
    EmptyList {
        /// Experiment name
        experiment: String,
        /// Offending field
        field: String,
    },

    /// A count that does not fit `0..=u32::MAX`
    #[error("Experiment '{experiment}': `{field}` value {value} is out of range")]
    OutOfRange {
        /// Experiment name
        experiment: String,
        /// Offending field
        field: String,
        /// Value as written
        value: i64,
    },

    /// `repeats` below 1
    #[error("repeats must be at least 1 (experiment '{experiment}' has {repeats})")]
    InvalidRepeats {
        /// Experiment name
        experiment: String,
        /// Value as written
        repeats: i64,
    },

    /// The grid is too large to count
    #[error("Experiment '{experiment}' plans more runs than can be counted")]
    TooManyRuns {
        /// Experiment name
        experiment: String,
    },

    /// Declared instances that do not exist under the project root
    #[error("Instance files not found: {}", .missing.join(", "))]
    MissingInstances {
        /// Each missing instance, once, in first-seen order
        missing: Vec<String>,
    },

    /// An experiment filter named something the configuration lacks
    #[error("No experiment named '{0}' in the configuration")]
    UnknownExperiment(String),
}

/// Integer accepted from a document: integers, finite floats (truncated),
/// numeric strings and booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntValue(pub i64);

impl<'de> Deserialize<'de> for IntValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntVisitor;

        impl<'de> Visitor<'de> for IntVisitor {
            type Value = IntValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an integer, a number or a numeric string")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<IntValue, E> {
                Ok(IntValue(i64::from(v)))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<IntValue, E> {
                Ok(IntValue(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<IntValue, E> {
                i64::try_from(v)
                    .map(IntValue)
                    .map_err(|_| E::custom(format!("integer {} is too large", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<IntValue, E> {
                if v.is_finite() && v.abs() < i64::MAX as f64 {
                    Ok(IntValue(v.trunc() as i64))
                } else {
                    Err(E::custom(format!("{} is not a usable integer", v)))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<IntValue, E> {
                v.trim()
                    .parse::<i64>()
                    .map(IntValue)
                    .map_err(|_| E::custom(format!("'{}' is not an integer", v)))
            }
        }

        deserializer.deserialize_any(IntVisitor)
    }
}

/// Boolean flag accepted from a document: booleans or numbers (non-zero = true).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagValue(pub bool);

impl<'de> Deserialize<'de> for FlagValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagVisitor;

        impl<'de> Visitor<'de> for FlagVisitor {
            type Value = FlagValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<FlagValue, E> {
                Ok(FlagValue(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FlagValue, E> {
                Ok(FlagValue(v != 0))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FlagValue, E> {
                Ok(FlagValue(v != 0))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<FlagValue, E> {
                Ok(FlagValue(v != 0.0))
            }
        }

        deserializer.deserialize_any(FlagVisitor)
    }
}

/// Experiment name: a string, or a number rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameValue(pub String);

impl<'de> Deserialize<'de> for NameValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NameVisitor;

        impl<'de> Visitor<'de> for NameVisitor {
            type Value = NameValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or a number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<NameValue, E> {
                Ok(NameValue(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<NameValue, E> {
                Ok(NameValue(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<NameValue, E> {
                Ok(NameValue(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<NameValue, E> {
                Ok(NameValue(v.to_string()))
            }
        }

        deserializer.deserialize_any(NameVisitor)
    }
}

/// A single value or a list of values; normalized to a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A bare value
    One(T),
    /// A list of values
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Normalize to a list.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v.clone()],
            OneOrMany::Many(vs) => vs.clone(),
        }
    }
}

fn int_list(values: &OneOrMany<IntValue>) -> Vec<i64> {
    values.to_vec().into_iter().map(|v| v.0).collect()
}

/// Partial experiment as written in `defaults` or an `experiments` entry.
/// Absent and `null` fields are both `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExperimentOverrides {
    /// Experiment name (entries only; ignored in `defaults`)
    pub name: Option<NameValue>,
    /// Instance paths relative to the project root
    pub instances: Option<OneOrMany<String>>,
    /// Iteration budgets
    pub iterations: Option<OneOrMany<IntValue>>,
    /// Iteration budgets replacing `iterations` for specific instances
    pub iterations_by_instance: Option<BTreeMap<String, OneOrMany<IntValue>>>,
    /// Drone counts
    pub drones: Option<OneOrMany<IntValue>>,
    /// Tick counts
    pub ticks: Option<OneOrMany<IntValue>>,
    /// Repetitions per combination
    pub repeats: Option<IntValue>,
    /// Forward `--export`
    pub export_data: Option<FlagValue>,
    /// Forward `--times`
    pub include_time_breakdown: Option<FlagValue>,
    /// Write the CSV export
    pub export_csv: Option<FlagValue>,
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SweepDocument {
    /// Middle layer shared by every experiment
    pub defaults: Option<ExperimentOverrides>,
    /// Experiment entries, in run order
    pub experiments: Option<Vec<ExperimentOverrides>>,
}

/// Document syntax, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `serde_json`
    Json,
    /// `toml`
    Toml,
}

impl DocumentFormat {
    /// `.toml` files are TOML; everything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Json,
        }
    }
}

/// A fully-populated but not yet validated experiment body (no name).
///
/// Each layer of the configuration is applied with [`ExperimentTemplate::overlay`],
/// which returns a new template and leaves the receiver untouched. Numbers
/// are kept as written until [`ExperimentTemplate::finish`] range-checks them.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentTemplate {
    /// See [`Experiment::instances`]
    pub instances: Vec<String>,
    /// See [`Experiment::iterations`]
    pub iterations: Vec<i64>,
    /// See [`Experiment::iterations_by_instance`]
    pub iterations_by_instance: BTreeMap<String, Vec<i64>>,
    /// See [`Experiment::drones`]
    pub drones: Vec<i64>,
    /// See [`Experiment::ticks`]
    pub ticks: Vec<i64>,
    /// See [`Experiment::repeats`]
    pub repeats: i64,
    /// See [`Experiment::export_data`]
    pub export_data: bool,
    /// See [`Experiment::include_time_breakdown`]
    pub include_time_breakdown: bool,
    /// See [`Experiment::export_csv`]
    pub export_csv: bool,
}

impl ExperimentTemplate {
    /// Built-in defaults used when neither the document nor an entry sets a field.
    pub fn built_in() -> Self {
        Self {
            instances: [
                "instancias/PSP-UAV_01_a.txt",
                "instancias/PSP-UAV_01_b.txt",
                "instancias/PSP-UAV_02_a.txt",
                "instancias/PSP-UAV_02_b.txt",
                "instancias/PSP-UAV_03_a.txt",
                "instancias/PSP-UAV_03_b.txt",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            iterations: vec![1000, 3000],
            iterations_by_instance: BTreeMap::new(),
            drones: vec![2, 3],
            ticks: vec![50],
            repeats: 3,
            export_data: false,
            include_time_breakdown: false,
            export_csv: true,
        }
    }

    /// Overlay the non-null fields of `layer` onto this template.
    pub fn overlay(&self, layer: &ExperimentOverrides) -> Self {
        Self {
            instances: layer
                .instances
                .as_ref()
                .map(OneOrMany::to_vec)
                .unwrap_or_else(|| self.instances.clone()),
            iterations: layer
                .iterations
                .as_ref()
                .map(int_list)
                .unwrap_or_else(|| self.iterations.clone()),
            iterations_by_instance: layer
                .iterations_by_instance
                .as_ref()
                .map(|map| {
                    map.iter()
                        .map(|(instance, values)| (instance.clone(), int_list(values)))
                        .collect()
                })
                .unwrap_or_else(|| self.iterations_by_instance.clone()),
            drones: layer
                .drones
                .as_ref()
                .map(int_list)
                .unwrap_or_else(|| self.drones.clone()),
            ticks: layer
                .ticks
                .as_ref()
                .map(int_list)
                .unwrap_or_else(|| self.ticks.clone()),
            repeats: layer.repeats.map_or(self.repeats, |r| r.0),
            export_data: layer.export_data.map_or(self.export_data, |f| f.0),
            include_time_breakdown: layer
                .include_time_breakdown
                .map_or(self.include_time_breakdown, |f| f.0),
            export_csv: layer.export_csv.map_or(self.export_csv, |f| f.0),
        }
    }

    /// Validate and name the template, producing an immutable [`Experiment`].
    pub fn finish(&self, name: impl Into<String>) -> Result<Experiment, ConfigError> {
        let name = name.into();

        if self.repeats < 1 {
            return Err(ConfigError::InvalidRepeats {
                experiment: name,
                repeats: self.repeats,
            });
        }
        if self.instances.is_empty() {
            return Err(ConfigError::EmptyList {
                experiment: name,
                field: "instances".to_string(),
            });
        }

        let iterations = to_counts(&name, "iterations", &self.iterations)?;
        let drones = to_counts(&name, "drones", &self.drones)?;
        let ticks = to_counts(&name, "ticks", &self.ticks)?;

        let mut iterations_by_instance = BTreeMap::new();
        for (instance, values) in &self.iterations_by_instance {
            let field = format!("iterations_by_instance[{}]", instance);
            iterations_by_instance.insert(instance.clone(), to_counts(&name, &field, values)?);
        }

        let experiment = Experiment {
            repeats: to_count(&name, "repeats", self.repeats)?,
            name,
            instances: self.instances.clone(),
            iterations,
            iterations_by_instance,
            drones,
            ticks,
            export_data: self.export_data,
            include_time_breakdown: self.include_time_breakdown,
            export_csv: self.export_csv,
        };

        if experiment.checked_run_count().is_none() {
            return Err(ConfigError::TooManyRuns {
                experiment: experiment.name,
            });
        }
        Ok(experiment)
    }
}

fn to_count(experiment: &str, field: &str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange {
        experiment: experiment.to_string(),
        field: field.to_string(),
        value,
    })
}

fn to_counts(experiment: &str, field: &str, values: &[i64]) -> Result<Vec<u32>, ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::EmptyList {
            experiment: experiment.to_string(),
            field: field.to_string(),
        });
    }
    values
        .iter()
        .map(|&v| to_count(experiment, field, v))
        .collect()
}

/// A resolved, validated experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    /// Declared name, or `exp_<n>` / `default`
    pub name: String,
    /// Instance identifiers (paths relative to the project root), in declaration order
    pub instances: Vec<String>,
    /// Iteration budgets for instances without an override
    pub iterations: Vec<u32>,
    /// Per-instance iteration budgets, replacing `iterations`
    pub iterations_by_instance: BTreeMap<String, Vec<u32>>,
    /// Drone counts
    pub drones: Vec<u32>,
    /// Tick counts
    pub ticks: Vec<u32>,
    /// Repetitions per combination, at least 1
    pub repeats: u32,
    /// Forward `--export` to the simulator
    pub export_data: bool,
    /// Forward `--times` and extract the time-breakdown metrics
    pub include_time_breakdown: bool,
    /// Write the per-run CSV next to the text report
    pub export_csv: bool,
}

impl Experiment {
    /// Iteration budgets that apply to `instance`.
    pub fn iterations_for(&self, instance: &str) -> &[u32] {
        self.iterations_by_instance
            .get(instance)
            .map(Vec::as_slice)
            .unwrap_or(&self.iterations)
    }

    /// Number of simulator invocations this experiment performs.
    ///
    /// Saturates at `u64::MAX`; [`ExperimentTemplate::finish`] rejects grids
    /// that large.
    pub fn run_count(&self) -> u64 {
        self.checked_run_count().unwrap_or(u64::MAX)
    }

    fn checked_run_count(&self) -> Option<u64> {
        let per_instance = self.instances.iter().try_fold(0u64, |acc, instance| {
            acc.checked_add(self.iterations_for(instance).len() as u64)
        })?;
        [self.ticks.len() as u64, self.drones.len() as u64, u64::from(self.repeats)]
            .into_iter()
            .try_fold(per_instance, u64::checked_mul)
    }

    /// Parameters echoed in the report header.
    pub fn parameters(&self) -> SweepParameters {
        SweepParameters {
            experiment: self.name.clone(),
            instances: self.instances.clone(),
            iterations: self.iterations.clone(),
            iterations_by_instance: self.iterations_by_instance.clone(),
            drones: self.drones.clone(),
            ticks: self.ticks.clone(),
            repeats: self.repeats,
            export_data: self.export_data,
            include_time_breakdown: self.include_time_breakdown,
            export_csv: self.export_csv,
        }
    }
}

/// Where the experiments came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this document
    File(PathBuf),
    /// No document at the requested path; built-in defaults
    BuiltIn,
}

/// Resolved configuration: one or more experiments, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Experiments in declaration order
    pub experiments: Vec<Experiment>,
    /// Document the experiments were read from
    pub source: ConfigSource,
}

impl SweepConfig {
    /// Load and resolve the document at `path`, or fall back to built-in defaults
    /// when nothing exists there.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Self::built_in();
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = parse_document(&content, DocumentFormat::from_path(path), path)?;

        Ok(Self {
            experiments: resolve(&document)?,
            source: ConfigSource::File(path.to_path_buf()),
        })
    }

    /// The single `default` experiment built from built-in values.
    pub fn built_in() -> Result<Self, ConfigError> {
        Ok(Self {
            experiments: resolve(&SweepDocument::default())?,
            source: ConfigSource::BuiltIn,
        })
    }

    /// Keep only the named experiments, in declaration order.
    ///
    /// An empty filter keeps everything; a name that matches nothing is an error.
    pub fn select(self, names: &[String]) -> Result<Self, ConfigError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.experiments.iter().any(|e| &e.name == *n))
        {
            return Err(ConfigError::UnknownExperiment(unknown.clone()));
        }
        Ok(Self {
            experiments: self
                .experiments
                .into_iter()
                .filter(|e| names.contains(&e.name))
                .collect(),
            source: self.source,
        })
    }
}

/// Parse a document from text.
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    path: &Path,
) -> Result<SweepDocument, ConfigError> {
    match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
        DocumentFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolve a document into experiments.
///
/// Entries without a name are called `exp_<n>` (1-based position); with no
/// entries at all the effective defaults become the `default` experiment.
pub fn resolve(document: &SweepDocument) -> Result<Vec<Experiment>, ConfigError> {
    let built_in = ExperimentTemplate::built_in();
    let defaults = match &document.defaults {
        Some(layer) => built_in.overlay(layer),
        None => built_in,
    };

    let entries = document.experiments.as_deref().unwrap_or_default();
    if entries.is_empty() {
        return Ok(vec![defaults.finish(DEFAULT_EXPERIMENT_NAME)?]);
    }

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let name = entry
                .name
                .as_ref()
                .map(|n| n.0.clone())
                .unwrap_or_else(|| format!("exp_{}", idx + 1));
            defaults.overlay(entry).finish(name)
        })
        .collect()
}

/// Check that every instance of every experiment exists under `root`.
///
/// All missing paths are reported together, each listed once.
pub fn verify_instances(root: &Path, experiments: &[Experiment]) -> Result<(), ConfigError> {
    let mut missing: Vec<String> = Vec::new();
    for instance in experiments.iter().flat_map(|e| e.instances.iter()) {
        if !root.join(instance).exists() && !missing.contains(instance) {
            missing.push(instance.clone());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingInstances { missing })
    }
}

/// Generate the built-in defaults as a JSON document
pub fn default_json() -> String {
    r#"{
  "defaults": {
    "instances": [
      "instancias/PSP-UAV_01_a.txt",
      "instancias/PSP-UAV_01_b.txt",
      "instancias/PSP-UAV_02_a.txt",
      "instancias/PSP-UAV_02_b.txt",
      "instancias/PSP-UAV_03_a.txt",
      "instancias/PSP-UAV_03_b.txt"
    ],
    "iterations": [1000, 3000],
    "iterations_by_instance": {},
    "drones": [2, 3],
    "ticks": [50],
    "repeats": 3,
    "export_data": false,
    "include_time_breakdown": false,
    "export_csv": true
  },
  "experiments": []
}
"#
    .to_string()
}

/// Generate the built-in defaults as a TOML document
pub fn default_toml() -> String {
    r#"# uavsweep configuration
# Add [[experiments]] tables to run several sweeps; each one overrides
# the fields below that it sets.

[defaults]
instances = [
    "instancias/PSP-UAV_01_a.txt",
    "instancias/PSP-UAV_01_b.txt",
    "instancias/PSP-UAV_02_a.txt",
    "instancias/PSP-UAV_02_b.txt",
    "instancias/PSP-UAV_03_a.txt",
    "instancias/PSP-UAV_03_b.txt",
]
iterations = [1000, 3000]
drones = [2, 3]
ticks = [50]
repeats = 3
# Forward --export to the simulator (overwrites exported_data/ on every run)
export_data = false
# Forward --times and collect evaluator/decoder timings
include_time_breakdown = false
export_csv = true

# [defaults.iterations_by_instance]
# "instancias/PSP-UAV_03_b.txt" = [5000]

# [[experiments]]
# name = "more drones"
# drones = [4, 5]
"#
    .to_string()
}
