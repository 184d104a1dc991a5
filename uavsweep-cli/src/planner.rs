//! Sweep Planner
//!
//! Expands a resolved experiment into the ordered list of simulator runs.
//!
//! Ordering is fixed and nested, outermost first:
//! instance (declaration order) → iteration budget (per-instance override if
//! declared) → tick count → drone count → repetition `1..=repeats`.

use crate::config::Experiment;
use std::path::Path;

/// One cell of the sweep grid, one repetition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Instance path as declared, relative to the project root
    pub instance: String,
    /// Iteration budget passed to the solver
    pub iterations: u32,
    /// Simulation ticks
    pub ticks: u32,
    /// Drone count
    pub drones: u32,
    /// 1-based
    pub repeat_index: u32,
    /// Repetitions of this combination
    pub repeats: u32,
}

/// Execution plan for one experiment.
///
/// Runs are produced on demand, so even very large grids cost nothing to plan.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionPlan<'a> {
    experiment: &'a Experiment,
    run_count: u64,
}

impl<'a> ExecutionPlan<'a> {
    /// Number of planned runs.
    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    /// Runs in execution order.
    pub fn runs(&self) -> impl Iterator<Item = RunSpec> + 'a {
        let exp = self.experiment;
        exp.instances.iter().flat_map(move |instance| {
            exp.iterations_for(instance)
                .iter()
                .flat_map(move |&iterations| {
                    exp.ticks.iter().flat_map(move |&ticks| {
                        exp.drones.iter().flat_map(move |&drones| {
                            (1..=exp.repeats).map(move |repeat_index| RunSpec {
                                instance: instance.clone(),
                                iterations,
                                ticks,
                                drones,
                                repeat_index,
                                repeats: exp.repeats,
                            })
                        })
                    })
                })
        })
    }
}

/// Build the execution plan for an experiment.
pub fn build_plan(experiment: &Experiment) -> ExecutionPlan<'_> {
    ExecutionPlan {
        experiment,
        run_count: experiment.run_count(),
    }
}

/// File stem of an instance path: `instancias/PSP-UAV_02_b.txt` → `PSP-UAV_02_b`.
pub fn instance_stem(instance: &str) -> String {
    Path::new(instance)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Variant letter of an instance stem: `a` or `b` after a trailing underscore.
///
/// Any other suffix yields an empty string.
pub fn instance_variant(stem: &str) -> String {
    ["a", "b"]
        .into_iter()
        .find(|v| stem.strip_suffix(v).is_some_and(|rest| rest.ends_with('_')))
        .map(String::from)
        .unwrap_or_default()
}
