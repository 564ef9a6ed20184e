//! Smoke test (C8): loads the canonical fixtures through the loader
//! collaborator (C7) and runs them through the scheduling core end-to-end,
//! checking the makespan bound from the canonical Topcuoglu example.
use std::collections::HashMap;
use std::path::Path;

use heft::{schedule_dag, Objective, RankMetric, ScheduleConfig};

#[path = "../src/loader.rs"]
mod loader;

#[test]
fn test_canonical_fixtures_schedule_within_makespan_bound() {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");

    let dag = loader::load_dag(&fixtures.join("canonical_dag.csv")).unwrap();
    let cost = loader::load_cost_model(
        &fixtures.join("canonical_w.csv"),
        &fixtures.join("canonical_c.csv"),
        None,
    )
    .unwrap();

    let config = ScheduleConfig {
        rank_metric: RankMetric::Mean,
        objective: Objective::Eft,
        time_offset: 0.0,
        relabel_nodes: false,
    };

    let result = schedule_dag(&dag, &cost, None, HashMap::new(), &config).unwrap();
    let makespan = result
        .timelines
        .iter()
        .filter_map(|t| t.last())
        .map(|s| s.end)
        .fold(0.0, f64::max);

    assert!(makespan <= 80.0, "makespan {makespan} should be <= 80");
}
