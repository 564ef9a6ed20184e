//! EFT estimator (C4): given a node already known to have every predecessor
//! scheduled, finds the earliest feasible placement on a candidate PE.
use std::collections::HashMap;

use log::debug;
use petgraph::graph::NodeIndex;
use petgraph::Direction::Incoming;

use crate::error::ScheduleError;
use crate::model::{CostModel, Dag};
use crate::timeline::{ProcessorTimeline, Slot};

/// The mutable state threaded through the single-DAG scheduler (C5): the
/// cost model, the per-PE timelines, every task placed so far (keyed by its
/// `NodeIndex` in `dag` rather than by the source's offset-arithmetic task
/// id — see §9's note that `(wf_id, local_node_id)` tuples are preferable
/// to the `numExistingJobs` scheme), the ready-time floor, and the id
/// offset applied only when a `Slot`'s `task` field is produced.
pub struct SchedulerState<'a> {
    pub cost: &'a CostModel,
    pub timelines: Vec<ProcessorTimeline>,
    pub scheduled: HashMap<NodeIndex, Slot>,
    pub time_offset: f64,
    pub id_offset: i32,
}

impl<'a> SchedulerState<'a> {
    pub fn new(cost: &'a CostModel, time_offset: f64, id_offset: i32) -> Self {
        Self {
            cost,
            timelines: (0..cost.num_pes())
                .map(|_| ProcessorTimeline::new())
                .collect(),
            scheduled: HashMap::new(),
            time_offset,
            id_offset,
        }
    }

    pub fn with_timelines(cost: &'a CostModel, time_offset: f64, timelines: Vec<ProcessorTimeline>) -> Self {
        let id_offset = timelines.iter().map(|t| t.len() as i32).sum();
        Self {
            cost,
            timelines,
            scheduled: HashMap::new(),
            time_offset,
            id_offset,
        }
    }
}

/// Computes the earliest-feasible candidate slot for `node` on `proc`.
/// Every predecessor of `node` must already be present in
/// `state.scheduled`, or this fails with `UnscheduledPredecessor`.
pub fn compute_eft(
    state: &SchedulerState,
    dag: &Dag,
    node: NodeIndex,
    proc: usize,
    wf_id: usize,
) -> Result<Slot, ScheduleError> {
    let local_id = dag[node].id;
    let global_id = local_id + state.id_offset;
    let mut ready = state.time_offset;

    for pred in dag.neighbors_directed(node, Incoming) {
        let pred_slot = state.scheduled.get(&pred).ok_or_else(|| {
            ScheduleError::UnscheduledPredecessor {
                node: global_id,
                predecessor: dag[pred].id + state.id_offset,
            }
        })?;
        let edge_weight = dag[dag.find_edge(pred, node).expect("edge must exist")];
        let t = if state.cost.communication[pred_slot.proc][proc] == 0.0 {
            pred_slot.end
        } else {
            pred_slot.end
                + edge_weight / state.cost.communication[pred_slot.proc][proc]
                + state.cost.startup[pred_slot.proc]
        };
        if t > ready {
            ready = t;
        }
    }

    let exec_time = state.cost.computation[local_id as usize][proc];
    let start = find_insertion_start(&state.timelines[proc], ready, exec_time);
    Ok(Slot::new(global_id, start, start + exec_time, proc, wf_id))
}

/// First-fit search over the gaps of `timeline`: a virtual slot `(0, 0)` at
/// the front and a virtual slot starting at `+inf` at the back guarantee a
/// fit is always found. Returns the chosen start time.
fn find_insertion_start(timeline: &ProcessorTimeline, ready: f64, duration: f64) -> f64 {
    let mut gap_lo = 0.0;
    for slot in timeline.iterate() {
        let candidate = ready.max(gap_lo);
        if candidate + duration <= slot.start {
            debug!("insertion slot found at {candidate} before job {}", slot.task);
            return candidate;
        }
        gap_lo = slot.end;
    }
    let candidate = ready.max(gap_lo);
    debug!("insertion slot found at {candidate} (end of timeline)");
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeData;

    fn cost_two_pe() -> CostModel {
        CostModel::new(
            vec![vec![10.0, 10.0]],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec![0.0, 0.0],
        )
    }

    #[test]
    fn test_insertion_gap_search_fits_between_slots() {
        let cost = cost_two_pe();
        let mut state = SchedulerState::new(&cost, 0.0, 0);
        state.timelines[0].insert(Slot::new(10, 0.0, 10.0, 0, 0));
        state.timelines[0].insert(Slot::new(11, 30.0, 40.0, 0, 0));

        let start = find_insertion_start(&state.timelines[0], 5.0, 15.0);
        assert_eq!(start, 10.0);
        assert!(start + 15.0 <= 30.0);
    }

    #[test]
    fn test_insertion_gap_search_empty_timeline() {
        let cost = cost_two_pe();
        let state = SchedulerState::new(&cost, 3.0, 0);
        let start = find_insertion_start(&state.timelines[0], 3.0, 5.0);
        assert_eq!(start, 3.0);
    }

    #[test]
    fn test_compute_eft_free_communication_uses_predecessor_end() {
        let cost = CostModel::new(vec![vec![5.0], vec![5.0]], vec![vec![0.0]], vec![0.0]);
        let mut dag = Dag::new();
        let n0 = dag.add_node(NodeData::new(0));
        let n1 = dag.add_node(NodeData::new(1));
        dag.add_edge(n0, n1, 100.0);

        let mut state = SchedulerState::new(&cost, 0.0, 0);
        state.scheduled.insert(n0, Slot::new(0, 0.0, 5.0, 0, 0));

        let slot = compute_eft(&state, &dag, n1, 0, 0).unwrap();
        assert_eq!(slot.start, 5.0);
        assert_eq!(slot.end, 10.0);
    }

    #[test]
    fn test_compute_eft_pays_communication_cost_across_pes() {
        let cost = CostModel::new(
            vec![vec![5.0, 5.0], vec![5.0, 5.0]],
            vec![vec![0.0, 2.0], vec![2.0, 0.0]],
            vec![1.0, 1.0],
        );
        let mut dag = Dag::new();
        let n0 = dag.add_node(NodeData::new(0));
        let n1 = dag.add_node(NodeData::new(1));
        dag.add_edge(n0, n1, 10.0);

        let mut state = SchedulerState::new(&cost, 0.0, 0);
        state.scheduled.insert(n0, Slot::new(0, 0.0, 5.0, 0, 0));

        // Same PE: no communication cost.
        let same_pe = compute_eft(&state, &dag, n1, 0, 0).unwrap();
        assert_eq!(same_pe.start, 5.0);

        // Cross PE: end(5) + weight(10)/C(2) + L(1) = 5 + 5 + 1 = 11.
        let cross_pe = compute_eft(&state, &dag, n1, 1, 0).unwrap();
        assert_eq!(cross_pe.start, 11.0);
    }

    #[test]
    fn test_compute_eft_rejects_unscheduled_predecessor() {
        let cost = cost_two_pe();
        let mut dag = Dag::new();
        let n0 = dag.add_node(NodeData::new(0));
        let n1 = dag.add_node(NodeData::new(1));
        dag.add_edge(n0, n1, 1.0);
        let state = SchedulerState::new(&cost, 0.0, 0);

        let err = compute_eft(&state, &dag, n1, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::UnscheduledPredecessor {
                node: 1,
                predecessor: 0
            }
        ));
    }

    #[test]
    fn test_id_offset_shifts_only_output_task_id() {
        let cost = cost_two_pe();
        let mut dag = Dag::new();
        let n0 = dag.add_node(NodeData::new(0));
        let state = SchedulerState::new(&cost, 0.0, 100);

        let slot = compute_eft(&state, &dag, n0, 0, 0).unwrap();
        assert_eq!(slot.task, 100);
        assert_eq!(slot.end - slot.start, 10.0);
    }
}
