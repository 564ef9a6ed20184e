//! Single-DAG scheduler (C5): drives C3 then a ranked greedy loop over C4,
//! applying one of the objective policies.
use std::collections::HashMap;

use log::{debug, warn};
use petgraph::graph::NodeIndex;

use crate::eft::{compute_eft, SchedulerState};
use crate::error::ScheduleError;
use crate::model::{find_root, CostModel, Dag};
use crate::rank::{compute_ranku, RankMetric};
use crate::timeline::{ProcessorTimeline, Slot};

/// Which quantity the greedy loop minimises when choosing a PE for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    Eft,
    EdpAbs,
    EdpRel,
    Energy,
}

/// The knobs a caller selects before invoking [`schedule_dag`]/
/// [`crate::multi::schedule_workflows`].
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    pub rank_metric: RankMetric,
    pub objective: Objective,
    pub time_offset: f64,
    pub relabel_nodes: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            rank_metric: RankMetric::Mean,
            objective: Objective::Eft,
            time_offset: 0.0,
            relabel_nodes: true,
        }
    }
}

/// `task -> (pe, index_on_pe, prior_task_on_pe)`, built once every task is
/// placed. The third component is `None` when there is no predecessor on
/// the same PE, or that predecessor's duration was zero (§4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleSummary {
    pub pe: usize,
    pub index_on_pe: usize,
    pub prior_on_pe: Option<i32>,
}

pub struct ScheduleResult {
    pub timelines: Vec<ProcessorTimeline>,
    pub scheduled: HashMap<NodeIndex, Slot>,
    pub summary: HashMap<i32, ScheduleSummary>,
}

/// Schedules `dag` onto the PEs described by `cost`, optionally continuing
/// from `timelines` left over from a previous run (§8 property 8 relies on
/// this to make sequential single-DAG scheduling equivalent to a multi-DAG
/// run with `L_SQUE`). `preloaded` lets a caller pin specific nodes to an
/// already-decided slot before the greedy loop runs; those nodes are
/// skipped.
pub fn schedule_dag(
    dag: &Dag,
    cost: &CostModel,
    timelines: Option<Vec<ProcessorTimeline>>,
    preloaded: HashMap<NodeIndex, Slot>,
    config: &ScheduleConfig,
) -> Result<ScheduleResult, ScheduleError> {
    let timelines =
        timelines.unwrap_or_else(|| (0..cost.num_pes()).map(|_| ProcessorTimeline::new()).collect());
    let id_offset = if config.relabel_nodes {
        timelines.iter().map(|t| t.len() as i32).sum()
    } else {
        0
    };

    let root = find_root(dag)?;
    let ranku = compute_ranku(dag, cost, config.rank_metric)?;

    let mut sorted_nodes: Vec<NodeIndex> = dag.node_indices().collect();
    sorted_nodes.sort_by(|&a, &b| ranku[&b].partial_cmp(&ranku[&a]).unwrap());
    if sorted_nodes[0] != root {
        debug!("root node was not first by ranku; a zero-cost placeholder root presumably has ranku 0, rearranging it to the front");
        let idx = sorted_nodes.iter().position(|&n| n == root).unwrap();
        sorted_nodes.swap(0, idx);
    }

    let mut state = SchedulerState {
        cost,
        timelines,
        scheduled: preloaded,
        time_offset: config.time_offset,
        id_offset,
    };

    for node in sorted_nodes {
        if state.scheduled.contains_key(&node) {
            continue;
        }

        let local_id = dag[node].id;
        let candidates: Vec<Slot> = (0..cost.num_pes())
            .map(|proc| compute_eft(&state, dag, node, proc, 0))
            .collect::<Result<_, _>>()?;
        let chosen = select_by_objective(&candidates, config.objective, cost, local_id)?;

        debug!(
            "placing task {} on PE {} at [{}, {})",
            chosen.task, chosen.proc, chosen.start, chosen.end
        );
        state.timelines[chosen.proc].insert(chosen);
        state.scheduled.insert(node, chosen);

        if let Some((first, second)) = state.timelines[chosen.proc].check_non_overlap() {
            return Err(ScheduleError::InvariantViolation {
                pe: chosen.proc,
                first_task: first.task,
                first_end: first.end,
                second_task: second.task,
                second_start: second.start,
            });
        }
    }

    let summary = build_summary(&state.timelines);
    Ok(ScheduleResult {
        timelines: state.timelines,
        scheduled: state.scheduled,
        summary,
    })
}

/// Applies the §4.3 objective policy over `candidates` (one per PE, in PE
/// index order) and returns the chosen slot.
pub(crate) fn select_by_objective(
    candidates: &[Slot],
    objective: Objective,
    cost: &CostModel,
    local_id: i32,
) -> Result<Slot, ScheduleError> {
    match objective {
        Objective::Eft => Ok(*candidates
            .iter()
            .reduce(|best, c| if c.end < best.end { c } else { best })
            .expect("at least one PE")),
        Objective::EdpAbs => {
            let power = cost
                .power
                .as_ref()
                .ok_or(ScheduleError::MissingParameter("power"))?;
            Ok(*candidates
                .iter()
                .reduce(|best, c| {
                    let best_edp =
                        (best.end - best.start).powi(2) * power[local_id as usize][best.proc];
                    let c_edp = (c.end - c.start).powi(2) * power[local_id as usize][c.proc];
                    if c_edp < best_edp || (c_edp == best_edp && c.end < best.end) {
                        c
                    } else {
                        best
                    }
                })
                .expect("at least one PE"))
        }
        Objective::EdpRel => {
            let power = cost
                .power
                .as_ref()
                .ok_or(ScheduleError::MissingParameter("power"))?;
            let earliest_start = candidates
                .iter()
                .map(|c| c.start)
                .fold(f64::INFINITY, f64::min);
            Ok(*candidates
                .iter()
                .reduce(|best, c| {
                    let best_edp = (best.end - earliest_start).powi(2)
                        * power[local_id as usize][best.proc];
                    let c_edp =
                        (c.end - earliest_start).powi(2) * power[local_id as usize][c.proc];
                    if c_edp < best_edp || (c_edp == best_edp && c.end < best.end) {
                        c
                    } else {
                        best
                    }
                })
                .expect("at least one PE"))
        }
        Objective::Energy => {
            warn!("ENERGY objective requested but not implemented");
            Err(ScheduleError::NotImplemented("ENERGY"))
        }
    }
}

/// Builds the `task -> (pe, index_on_pe, prior_task_on_pe)` summary map
/// described in §4.3.
pub(crate) fn build_summary(timelines: &[ProcessorTimeline]) -> HashMap<i32, ScheduleSummary> {
    let mut summary = HashMap::new();
    for (pe, timeline) in timelines.iter().enumerate() {
        let slots = timeline.slots();
        for (idx, slot) in slots.iter().enumerate() {
            let prior_on_pe = if idx > 0 && slots[idx - 1].end - slots[idx - 1].start > 0.0 {
                Some(slots[idx - 1].task)
            } else {
                None
            };
            summary.insert(
                slot.task,
                ScheduleSummary {
                    pe,
                    index_on_pe: idx,
                    prior_on_pe,
                },
            );
        }
    }
    summary
}
