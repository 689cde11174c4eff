//! Directory walking and aggregate statistics

use crate::error::TestResult;
use crate::vm_test::{VmTestResults, VmTestRunner};
use emerald_evm::ChainConfig;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Totals across every fixture file of a run
#[derive(Debug, Default)]
pub struct TestStats {
    /// Cases executed
    pub total: usize,
    /// Cases matching their expectation
    pub passed: usize,
    /// Cases that did not
    pub failed: usize,
    /// Wall time of the run
    pub duration: Duration,
    /// `(case, reason)` for each failure
    pub failures: Vec<(String, String)>,
}

impl TestStats {
    /// Empty totals
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one file's results in
    pub fn add_vm_results(&mut self, results: &VmTestResults) {
        self.total += results.total();
        self.passed += results.passed.len();
        self.failed += results.failed.len();
        self.failures.extend(results.failed.iter().cloned());
    }

    /// Share of passing cases in percent; 100 for an empty run
    pub fn pass_rate(&self) -> f64 {
        match self.total {
            0 => 100.0,
            n => self.passed as f64 * 100.0 / n as f64,
        }
    }

    /// Emit totals at info and each failure at warn
    pub fn log_summary(&self) {
        info!(
            total = self.total,
            passed = self.passed,
            failed = self.failed,
            elapsed_ms = self.duration.as_millis() as u64,
            "fixture run finished, {:.1}% passing",
            self.pass_rate()
        );
        self.failures
            .iter()
            .for_each(|(case, reason)| warn!(case = %case, "{}", reason));
    }
}

/// All `.json` files below `dir`, in path order
fn fixture_files(dir: &Path) -> TestResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(next) = pending.pop() {
        for entry in std::fs::read_dir(&next)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Runs fixture trees under one chain configuration
pub struct TestRunner {
    vm_runner: VmTestRunner,
    verbose: bool,
}

impl TestRunner {
    /// Runner for `config`; `verbose` logs per-case outcomes
    pub fn new(config: ChainConfig, verbose: bool) -> Self {
        Self {
            vm_runner: VmTestRunner::new(config, verbose),
            verbose,
        }
    }

    /// Run every fixture file below `dir`. A missing directory is an empty run.
    pub fn run_vm_tests(&self, dir: &Path) -> TestResult<TestStats> {
        let started = Instant::now();
        let mut stats = TestStats::new();

        if !dir.is_dir() {
            warn!(dir = %dir.display(), "fixture directory missing");
            return Ok(stats);
        }

        for file in fixture_files(dir)? {
            let results = self.vm_runner.run_file(&file)?;
            if self.verbose {
                info!(
                    file = %file.display(),
                    passed = results.passed.len(),
                    failed = results.failed.len(),
                    "fixture file done"
                );
            }
            stats.add_vm_results(&results);
        }

        stats.duration = started.elapsed();
        Ok(stats)
    }

    /// Run the `VMTests` subtree of an ethereum/tests checkout
    pub fn run_all(&self, tests_dir: &Path) -> TestResult<TestStats> {
        self.run_vm_tests(&tests_dir.join("VMTests"))
    }
}
