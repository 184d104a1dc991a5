//! Integration tests for uavsweep
//!
//! These tests drive the `uavsweep` binary end to end against a fake
//! simulator shell script inside a temporary project root.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};
use uavsweep::CSV_HEADERS;

/// Prints the metric lines the real solver prints. Urgency is minus the
/// drone count. Instances ending in `_b.txt` fail when `fail_b` is set.
fn fake_simulator(fail_b: bool) -> String {
    let fail = if fail_b {
        "case \"$1\" in *_b.txt) echo \"cannot load $1\" >&2; exit 1;; esac\n"
    } else {
        ""
    };
    format!(
        "#!/bin/sh\n\
         echo \"$@\" >> \"$(dirname \"$0\")/invocations.log\"\n\
         {fail}\
         echo \"Urgencia acumulada: -$2\"\n\
         echo \"Tiempo de ejecución: 0.5 segundos\"\n\
         echo \"Colisiones detectadas: 0\"\n\
         for arg in \"$@\"; do\n\
           if [ \"$arg\" = \"--times\" ]; then\n\
             echo \"Tiempo acumulado Evaluador: 0.25 segundos\"\n\
             echo \"Tiempo acumulado Decodificador: 0.125 segundos\"\n\
           fi\n\
         done\n"
    )
}

struct Project {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Project {
    fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        fs::create_dir_all(root.join("inst")).unwrap();
        fs::write(root.join("inst/map_01_a.txt"), "map a").unwrap();
        fs::write(root.join("inst/map_01_b.txt"), "map b").unwrap();

        fs::create_dir_all(root.join("scripts")).unwrap();
        fs::write(root.join("scripts/experiments_config.json"), config).unwrap();

        Self { _dir: dir, root }
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn install_simulator(&self, fail_b: bool) {
        write_executable(&self.root().join("PSP-UAV"), &fake_simulator(fail_b));
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_uavsweep"))
            .arg("--root")
            .arg(self.root())
            .args(args)
            .output()
            .unwrap()
    }

    fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.root().join("invocations.log"))
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Report files written so far, sorted by name.
    fn reports(&self, extension: &str) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.root().join("experiments")) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == extension))
            .collect();
        files.sort();
        files
    }
}

fn write_executable(path: &Path, script: &str) {
    fs::write(path, script).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const SWEEP: &str = r#"{
  "defaults": {
    "instances": ["inst/map_01_a.txt", "inst/map_01_b.txt"],
    "iterations": 10,
    "drones": [2, 3],
    "ticks": [5],
    "repeats": 2
  },
  "experiments": [{ "name": "Sweep #1" }]
}"#;

/// Test a full sweep: grid order, report sections, CSV rows
#[test]
fn test_full_sweep() {
    let project = Project::new(SWEEP);
    project.install_simulator(false);

    let output = project.run(&[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    // 2 instances × 1 iteration × 1 tick × 2 drones × 2 repeats
    let invocations = project.invocations();
    assert_eq!(invocations.len(), 8);
    let root = project.root().display().to_string();
    assert_eq!(
        invocations[0],
        format!("{}/inst/map_01_a.txt 2 10 5", root)
    );
    assert_eq!(
        invocations[2],
        format!("{}/inst/map_01_a.txt 3 10 5", root)
    );
    assert_eq!(
        invocations[4],
        format!("{}/inst/map_01_b.txt 2 10 5", root)
    );

    let texts = project.reports("txt");
    let csvs = project.reports("csv");
    assert_eq!(texts.len(), 1);
    assert_eq!(csvs.len(), 1);

    let name = texts[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("run_"), "{}", name);
    assert!(name.ends_with("_sweep_1.txt"), "{}", name);
    assert_eq!(csvs[0], texts[0].with_extension("csv"));

    let text = fs::read_to_string(&texts[0]).unwrap();
    assert!(text.contains("| Experiment: Sweep #1\n"));
    assert!(text.contains("=== Individual results ===\n"));
    assert!(text.contains("[inst/map_01_a.txt] drones=3 iter=10 T=5 rep=2/2\n"));
    assert!(text.contains(
        "[inst/map_01_a.txt] drones=3 iter=10 T=5 runs=2\n\
         avg_urgencia: -3.000000\n\
         avg_colisiones: 0.000000\n\
         avg_tiempo_ejecucion: 0.500000\n"
    ));

    let csv = fs::read_to_string(&csvs[0]).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 9);
    assert_eq!(lines[0], CSV_HEADERS.join(","));
    assert_eq!(
        lines[1],
        "Sweep #1,inst/map_01_a.txt,map_01_a,a,2,10,5,1,0,-2.0,0.0,0.5,,"
    );
    assert_eq!(
        lines[8],
        "Sweep #1,inst/map_01_b.txt,map_01_b,b,3,10,5,2,0,-3.0,0.0,0.5,,"
    );

    let console = stdout(&output);
    assert!(console.contains("Using configuration from:"));
    assert!(console.contains("Report saved to:"));
    assert!(console.contains("CSV saved to:"));
    assert!(console.contains("8 runs: 8 successful, 0 failed"));
}

/// Test that failing runs are recorded without metrics and the sweep continues
#[test]
fn test_failed_runs_are_recorded() {
    let project = Project::new(SWEEP);
    project.install_simulator(true);

    let output = project.run(&[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.invocations().len(), 8);

    let csv = fs::read_to_string(&project.reports("csv")[0]).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[5],
        "Sweep #1,inst/map_01_b.txt,map_01_b,b,2,10,5,1,1,,,,,"
    );

    let text = fs::read_to_string(&project.reports("txt")[0]).unwrap();
    assert!(text.contains("exit_code: 1\nNo metrics could be extracted"));
    assert!(text.contains("stderr:\ncannot load"));
    // The failing group has a header but no averages.
    assert!(text.contains("[inst/map_01_b.txt] drones=2 iter=10 T=5 runs=2\n\n"));

    assert!(stdout(&output).contains("8 runs: 4 successful, 4 failed"));
}

/// Test per-instance iterations, the time breakdown and CSV opt-out
#[test]
fn test_overrides_and_time_breakdown() {
    let config = r#"{
      "defaults": {
        "instances": "inst/map_01_a.txt",
        "iterations": [10, 20],
        "iterations_by_instance": { "inst/map_01_a.txt": 99 },
        "drones": 4,
        "ticks": 7,
        "repeats": 1,
        "include_time_breakdown": true,
        "export_data": true,
        "export_csv": false
      }
    }"#;
    let project = Project::new(config);
    project.install_simulator(false);

    let output = project.run(&[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let invocations = project.invocations();
    assert_eq!(invocations.len(), 1);
    assert!(invocations[0].ends_with("inst/map_01_a.txt 4 99 7 --export --times"));

    assert!(project.reports("csv").is_empty());
    let text = fs::read_to_string(&project.reports("txt")[0]).unwrap();
    assert!(text.contains("| Experiment: default\n"));
    assert!(text.contains("Per-instance iterations: inst/map_01_a.txt=[99]\n"));
    assert!(text.contains("tiempo_evaluador: 0.25\n"));
    assert!(text.contains("avg_tiempo_decodificador: 0.125000\n"));
}

/// Test that the build step runs once when the binary is missing
#[test]
fn test_build_step_creates_binary() {
    let project = Project::new(SWEEP);
    write_executable(
        &project.root().join("build.sh"),
        &format!(
            "#!/bin/sh\ncat > PSP-UAV <<'SIM'\n{}SIM\nchmod +x PSP-UAV\n",
            fake_simulator(false)
        ),
    );

    let output = project.run(&["--build-command", "sh build.sh"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(project.root().join("PSP-UAV").is_file());
    assert_eq!(project.invocations().len(), 8);
}

/// Test that a failing build aborts before any report is written
#[test]
fn test_failed_build_is_fatal() {
    let project = Project::new(SWEEP);

    let output = project.run(&["--build-command", "false"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Build command 'false' failed"));
    assert!(!project.root().join("experiments").exists());
}

/// Test that Ctrl-C during the build step ends with the interruption exit code
#[test]
fn test_interrupt_during_build() {
    let project = Project::new(SWEEP);
    write_executable(
        &project.root().join("build.sh"),
        "#!/bin/sh\ntouch build.started\nsleep 2\n",
    );

    let child = Command::new(env!("CARGO_BIN_EXE_uavsweep"))
        .arg("--root")
        .arg(project.root())
        .args(["--build-command", "sh build.sh"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let started = project.root().join("build.started");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !started.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(started.exists(), "build step never started");

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(130), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("Execution interrupted by user."));
    assert!(!project.root().join("experiments").exists());
}

/// Test that missing instance files abort before the simulator starts
#[test]
fn test_missing_instances_are_fatal() {
    let config = r#"{ "defaults": { "instances": ["inst/map_01_a.txt", "inst/nope.txt"] } }"#;
    let project = Project::new(config);
    project.install_simulator(false);

    let output = project.run(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("inst/nope.txt"));
    assert!(project.invocations().is_empty());
}

/// Test that repeats below 1 are rejected with a dedicated message
#[test]
fn test_zero_repeats_are_fatal() {
    let project = Project::new(r#"{ "experiments": [{ "name": "z", "repeats": 0 }] }"#);
    project.install_simulator(false);

    let output = project.run(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("repeats must be at least 1"));
    assert!(project.invocations().is_empty());
}

/// Test that a malformed document is fatal
#[test]
fn test_malformed_config_is_fatal() {
    let project = Project::new(r#"{ "defaults": { "drones": ["two"] } }"#);
    project.install_simulator(false);

    let output = project.run(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Malformed JSON config"));
}

/// Test experiment selection
#[test]
fn test_experiment_filter() {
    let config = r#"{
      "defaults": { "instances": "inst/map_01_a.txt", "iterations": 1, "drones": 1, "ticks": 1, "repeats": 1 },
      "experiments": [{ "name": "first" }, { "name": "second", "drones": [5] }]
    }"#;
    let project = Project::new(config);
    project.install_simulator(false);

    let output = project.run(&["-e", "second"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.invocations(), vec![format!(
        "{}/inst/map_01_a.txt 5 1 1",
        project.root().display()
    )]);
    assert_eq!(project.reports("txt").len(), 1);

    let output = project.run(&["-e", "third"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No experiment named 'third'"));
}

/// Test that `list` plans without building or running anything
#[test]
fn test_list_starts_no_process() {
    let project = Project::new(SWEEP);

    let output = project.run(&["--build-command", "false", "list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let console = stdout(&output);
    assert!(console.contains("experiment: Sweep #1 (8 runs)"));
    assert!(console.contains("inst/map_01_a.txt [ok] iterations=[10]"));
    assert!(console.contains("1 experiment(s), 8 runs planned."));
    assert!(!project.root().join("experiments").exists());

    let output = project.run(&["--dry-run"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("8 runs planned."));
}

/// Test that `init` writes a document the harness reads back
#[test]
fn test_init_round_trip() {
    let project = Project::new("{}");
    let target = project.root().join("generated.toml");

    let output = project.run(&["init", "--output", target.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = project.run(&["--config", target.to_str().unwrap(), "list"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let console = stdout(&output);
    assert!(console.contains("experiment: default (72 runs)"));
    assert!(console.contains("instancias/PSP-UAV_01_a.txt [missing]"));

    let output = project.run(&["init", "--output", target.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("already exists"));
}
