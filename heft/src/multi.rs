//! Multi-DAG scheduler (C6): orders several independent workflows against
//! each other, then interleaves their per-DAG ranked node lists round-robin
//! before placing every node with C4 under the `EFT` objective only.
use std::collections::{HashMap, VecDeque};

use petgraph::graph::NodeIndex;

use crate::eft::{compute_eft, SchedulerState};
use crate::error::ScheduleError;
use crate::model::{find_root, masked_mean, CostModel, Dag};
use crate::rank::{compute_ranku, RankMetric};
use crate::scheduler::{build_summary, select_by_objective, Objective, ScheduleSummary};
use crate::timeline::{ProcessorTimeline, Slot};

/// One workflow's DAG and cost model, keyed externally by `wf_id`.
pub struct Workflow {
    pub dag: Dag,
    pub cost: CostModel,
}

/// Cross-workflow ordering strategy (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiStrategy {
    SComp,
    LComp,
    SComm,
    LComm,
    SRank,
    LRank,
    SSque,
    LSque,
}

pub struct MultiScheduleResult {
    pub timelines: Vec<ProcessorTimeline>,
    pub scheduled: HashMap<(usize, NodeIndex), Slot>,
    pub summary: HashMap<i32, ScheduleSummary>,
}

/// Schedules every workflow in `workflows` onto a shared set of PEs, ordering
/// workflows by `strategy` and interleaving their ranked node lists
/// round-robin (§4.4). Every placement uses the `EFT` objective, matching
/// the source's multi-DAG behaviour.
pub fn schedule_workflows(
    workflows: &HashMap<usize, Workflow>,
    strategy: MultiStrategy,
    rank_metric: RankMetric,
) -> Result<MultiScheduleResult, ScheduleError> {
    if workflows.is_empty() {
        return Ok(MultiScheduleResult {
            timelines: Vec::new(),
            scheduled: HashMap::new(),
            summary: HashMap::new(),
        });
    }

    let mut wf_ids: Vec<usize> = workflows.keys().copied().collect();
    wf_ids.sort_unstable();

    let num_pes = workflows[&wf_ids[0]].cost.num_pes();
    let total_v: usize = workflows.values().map(|w| w.cost.num_tasks()).sum();

    let mut ranku_by_wf: HashMap<usize, HashMap<NodeIndex, f64>> = HashMap::new();
    let mut sorted_nodes_by_wf: HashMap<usize, VecDeque<NodeIndex>> = HashMap::new();
    let mut id_offset_by_wf: HashMap<usize, i32> = HashMap::new();
    let mut running_offset = 0i32;

    for &wf in &wf_ids {
        let data = &workflows[&wf];
        let ranku = compute_ranku(&data.dag, &data.cost, rank_metric)?;
        let root = find_root(&data.dag)?;

        let mut nodes: Vec<NodeIndex> = data.dag.node_indices().collect();
        nodes.sort_by(|&a, &b| ranku[&b].partial_cmp(&ranku[&a]).unwrap());
        if nodes[0] != root {
            let idx = nodes.iter().position(|&n| n == root).unwrap();
            nodes.swap(0, idx);
        }

        id_offset_by_wf.insert(wf, running_offset);
        running_offset += data.cost.num_tasks() as i32;
        sorted_nodes_by_wf.insert(wf, nodes.into());
        ranku_by_wf.insert(wf, ranku);
    }

    let mut ordered = wf_ids.clone();
    ordered.sort_by(|&a, &b| {
        let ka = workflow_key(&workflows[&a], a, strategy, &ranku_by_wf[&a]);
        let kb = workflow_key(&workflows[&b], b, strategy, &ranku_by_wf[&b]);
        match strategy {
            MultiStrategy::LComp
            | MultiStrategy::LComm
            | MultiStrategy::LRank
            | MultiStrategy::LSque => kb.partial_cmp(&ka).unwrap(),
            _ => ka.partial_cmp(&kb).unwrap(),
        }
    });

    let mut global_sequence: Vec<(usize, NodeIndex)> = Vec::with_capacity(total_v);
    loop {
        let mut emitted_any = false;
        for &wf in &ordered {
            if let Some(node) = sorted_nodes_by_wf.get_mut(&wf).unwrap().pop_front() {
                global_sequence.push((wf, node));
                emitted_any = true;
            }
        }
        if !emitted_any {
            break;
        }
    }

    let mut timelines: Vec<ProcessorTimeline> = (0..num_pes).map(|_| ProcessorTimeline::new()).collect();
    let mut scheduled_by_wf: HashMap<usize, HashMap<NodeIndex, Slot>> =
        wf_ids.iter().map(|&wf| (wf, HashMap::new())).collect();
    let mut combined: HashMap<(usize, NodeIndex), Slot> = HashMap::with_capacity(total_v);

    for (wf, node) in global_sequence {
        let data = &workflows[&wf];
        let state = SchedulerState {
            cost: &data.cost,
            timelines,
            scheduled: scheduled_by_wf.remove(&wf).unwrap(),
            time_offset: 0.0,
            id_offset: id_offset_by_wf[&wf],
        };

        let local_id = data.dag[node].id;
        let candidates: Vec<Slot> = (0..num_pes)
            .map(|proc| compute_eft(&state, &data.dag, node, proc, wf))
            .collect::<Result<_, _>>()?;
        let chosen = select_by_objective(&candidates, Objective::Eft, &data.cost, local_id)?;

        let SchedulerState {
            timelines: mut new_timelines,
            scheduled: mut new_scheduled,
            ..
        } = state;
        new_timelines[chosen.proc].insert(chosen);
        if let Some((first, second)) = new_timelines[chosen.proc].check_non_overlap() {
            return Err(ScheduleError::InvariantViolation {
                pe: chosen.proc,
                first_task: first.task,
                first_end: first.end,
                second_task: second.task,
                second_start: second.start,
            });
        }
        new_scheduled.insert(node, chosen);
        combined.insert((wf, node), chosen);

        scheduled_by_wf.insert(wf, new_scheduled);
        timelines = new_timelines;
    }

    let summary = build_summary(&timelines);
    Ok(MultiScheduleResult {
        timelines,
        scheduled: combined,
        summary,
    })
}

fn workflow_key(
    data: &Workflow,
    wf_id: usize,
    strategy: MultiStrategy,
    ranku: &HashMap<NodeIndex, f64>,
) -> f64 {
    match strategy {
        MultiStrategy::SComp | MultiStrategy::LComp => {
            let flat: Vec<f64> = data.cost.computation.iter().flatten().copied().collect();
            masked_mean(&flat)
        }
        MultiStrategy::SComm | MultiStrategy::LComm => {
            let weights: Vec<f64> = data.dag.edge_weights().copied().collect();
            if weights.is_empty() {
                0.0
            } else {
                weights.iter().sum::<f64>() / weights.len() as f64
            }
        }
        MultiStrategy::SRank | MultiStrategy::LRank => {
            let root = find_root(&data.dag).expect("validated earlier");
            ranku[&root]
        }
        MultiStrategy::SSque | MultiStrategy::LSque => wf_id as f64,
    }
}
