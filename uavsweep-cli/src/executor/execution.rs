//! Sweep Execution
//!
//! Runs an experiment's plan one simulator process at a time, in plan order.
//!
//! ## Data Flow
//!
//! ```text
//! ExecutionPlan (from planner)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │    Executor      │  command line → Simulator::invoke → MetricsParser
//! └────────┬─────────┘
//!          │
//!          ▼
//!  RunOutcome (exit code, metrics, captured output)
//! ```
//!
//! A non-zero exit is recorded and the sweep moves on. Failing to start the
//! process, or a raised stop flag, ends the sweep with an error.

use crate::config::Experiment;
use crate::metrics::MetricsParser;
use crate::planner::{ExecutionPlan, RunSpec, instance_stem, instance_variant};
use crate::supervisor::{Simulator, SupervisorError, is_interrupt_exit};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uavsweep_report::{Metric, MetricValues, RunOutcome, format_metric_value};

/// Execute sweep plans against the simulator
pub struct Executor<P> {
    simulator: Simulator,
    parser: P,
    stop: Arc<AtomicBool>,
    show_progress: bool,
}

impl<P: MetricsParser> Executor<P> {
    /// Create an executor; raising `stop` ends the sweep before the next run.
    pub fn new(simulator: Simulator, parser: P, stop: Arc<AtomicBool>) -> Self {
        Self {
            simulator,
            parser,
            stop,
            show_progress: true,
        }
    }

    /// Hide the progress bar (tests, non-interactive use).
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// The simulator runs are sent to.
    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Execute every run of the plan, in order.
    pub fn execute(
        &self,
        experiment: &Experiment,
        plan: &ExecutionPlan<'_>,
    ) -> Result<Vec<RunOutcome>, SupervisorError> {
        let pb = if self.show_progress {
            ProgressBar::new(plan.run_count())
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut outcomes = Vec::new();
        for run in plan.runs() {
            pb.set_message(format!(
                "{} d={} T={}",
                file_name(&run.instance),
                run.drones,
                run.ticks
            ));
            let outcome = match self.execute_single(experiment, &run) {
                Ok(outcome) => outcome,
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            };
            outcomes.push(outcome);
            pb.inc(1);
        }

        pb.finish_with_message("Complete");
        Ok(outcomes)
    }

    /// Execute a single run
    fn execute_single(
        &self,
        experiment: &Experiment,
        run: &RunSpec,
    ) -> Result<RunOutcome, SupervisorError> {
        self.check_stop()?;

        let command = self.simulator.command_line(
            run,
            experiment.export_data,
            experiment.include_time_breakdown,
        );

        tracing::info!(
            "Running {} | drones={} | iter={} | T={} | run {}/{} | exp={}",
            file_name(&run.instance),
            run.drones,
            run.iterations,
            run.ticks,
            run.repeat_index,
            run.repeats,
            experiment.name
        );

        let output = self.simulator.invoke(&command)?;

        // Ctrl-C reaches the child too, possibly before the handler runs;
        // its result is discarded.
        self.check_stop()?;
        if is_interrupt_exit(output.exit_code) {
            return Err(SupervisorError::Interrupted);
        }

        let metrics = if output.exit_code == 0 {
            self.parser
                .parse(&output.stdout, experiment.include_time_breakdown)
        } else {
            tracing::debug!("Exit code {} for {}", output.exit_code, command.join(" "));
            MetricValues::new()
        };

        tracing::info!(
            "  --> solution={} | time={}s | T={} | collisions={}",
            metric_or_na(&metrics, Metric::Urgencia),
            metric_or_na(&metrics, Metric::TiempoEjecucion),
            run.ticks,
            metric_or_na(&metrics, Metric::Colisiones)
        );

        let instance_stem = instance_stem(&run.instance);
        let instance_variant = instance_variant(&instance_stem);

        Ok(RunOutcome {
            experiment: experiment.name.clone(),
            instance: run.instance.clone(),
            instance_stem,
            instance_variant,
            drones: run.drones,
            iterations: run.iterations,
            ticks: run.ticks,
            repeat_index: run.repeat_index,
            exit_code: output.exit_code,
            metrics,
            stdout: output.stdout,
            stderr: output.stderr,
            command,
        })
    }

    fn check_stop(&self) -> Result<(), SupervisorError> {
        if self.stop.load(Ordering::SeqCst) {
            Err(SupervisorError::Interrupted)
        } else {
            Ok(())
        }
    }
}

fn file_name(instance: &str) -> String {
    Path::new(instance)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| instance.to_string())
}

fn metric_or_na(metrics: &MetricValues, metric: Metric) -> String {
    metrics
        .get(&metric)
        .map(|v| format_metric_value(*v))
        .unwrap_or_else(|| "NA".to_string())
}
