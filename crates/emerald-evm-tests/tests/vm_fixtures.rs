//! Runs the bundled VMTests fixtures

use emerald_evm::ChainConfig;
use emerald_evm_tests::{TestRunner, TestStats};
use std::path::PathBuf;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fixtures(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn assert_all_pass(stats: &TestStats, expected: usize) {
    stats.log_summary();
    assert!(stats.failures.is_empty(), "failures: {:?}", stats.failures);
    assert_eq!(stats.total, expected);
    assert_eq!(stats.passed, expected);
}

#[test]
fn test_frontier_fixtures() {
    init_tracing();
    let runner = TestRunner::new(ChainConfig::frontier(), true);
    let stats = runner.run_all(&fixtures("frontier")).unwrap();
    assert_all_pass(&stats, 10);
}

#[test]
fn test_agharta_fixtures() {
    init_tracing();
    let runner = TestRunner::new(ChainConfig::all_forks(), true);
    let stats = runner.run_all(&fixtures("agharta")).unwrap();
    assert_all_pass(&stats, 3);
}

#[test]
fn test_agharta_opcodes_fail_on_frontier() {
    init_tracing();
    let runner = TestRunner::new(ChainConfig::frontier(), false);
    let stats = runner.run_all(&fixtures("agharta")).unwrap();
    // SHL and the net-metered SSTORE sequence no longer match; REVERT is
    // invalid on Frontier and still fails as expected
    assert_eq!(stats.total, 3);
    assert_eq!(stats.failed, 2);
}
