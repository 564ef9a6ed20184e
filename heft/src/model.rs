//! DAG & cost model (C1): an immutable representation of one application DAG
//! and the cost vectors that drive every other component. Everything in this
//! module is read-only once constructed; mutation happens only in the
//! scheduler state (`scheduler`/`multi`) that borrows these types.
use crate::error::ScheduleError;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::Direction::{Incoming, Outgoing};
use serde_derive::{Deserialize, Serialize};

/// One task node. The DAG's node weight; edge weights carry the per-edge
/// data volume (`weight` in the spec), kept separate from `avgweight` which
/// is derived from the cost model rather than stored on the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: i32,
}

impl NodeData {
    pub fn new(id: i32) -> Self {
        Self { id }
    }
}

/// A DAG of tasks; edge weight is the data volume moved along that edge.
pub type Dag = Graph<NodeData, f64>;

/// `V x Q` execution-cost matrix, `Q x Q` communication-cost matrix, startup
/// costs, and the optional energy-aware power table. `+inf` entries in
/// `computation`/`power` mean "forbidden" and must be masked out of every
/// mean/min/max reduction (see [`masked_mean`], [`masked_min`], [`masked_max`]).
#[derive(Debug, Clone)]
pub struct CostModel {
    pub computation: Vec<Vec<f64>>,
    pub communication: Vec<Vec<f64>>,
    pub startup: Vec<f64>,
    pub power: Option<Vec<Vec<f64>>>,
}

impl CostModel {
    pub fn new(
        computation: Vec<Vec<f64>>,
        communication: Vec<Vec<f64>>,
        startup: Vec<f64>,
    ) -> Self {
        Self {
            computation,
            communication,
            startup,
            power: None,
        }
    }

    pub fn with_power(mut self, power: Vec<Vec<f64>>) -> Self {
        self.power = Some(power);
        self
    }

    pub fn num_tasks(&self) -> usize {
        self.computation.len()
    }

    pub fn num_pes(&self) -> usize {
        self.communication.len()
    }

    /// Mean of the off-diagonal `communication` entries plus the mean of
    /// `startup`, used to turn per-edge data volumes into `avgweight`.
    pub fn avg_communication(&self) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for (p, row) in self.communication.iter().enumerate() {
            for (q, &c) in row.iter().enumerate() {
                if p != q {
                    sum += c;
                    count += 1;
                }
            }
        }
        let avg_comm = if count == 0 { 0.0 } else { sum / count as f64 };
        let avg_startup = if self.startup.is_empty() {
            0.0
        } else {
            self.startup.iter().sum::<f64>() / self.startup.len() as f64
        };
        avg_comm + avg_startup
    }

    /// `weight / avgC`, the `avgweight` quantity used by `MEAN`/`EDP` ranking.
    pub fn edge_avgweight(&self, weight: f64) -> f64 {
        weight / self.avg_communication()
    }
}

/// Arithmetic mean of `row`, ignoring `+inf` entries. `+inf` if every entry
/// is `+inf`.
pub fn masked_mean(row: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for &v in row {
        if v.is_finite() {
            sum += v;
            count += 1;
        }
    }
    if count == 0 {
        f64::INFINITY
    } else {
        sum / count as f64
    }
}

/// Index and value of the minimum finite entry of `row`, ties broken by
/// smallest index. `(usize::MAX, +inf)` if every entry is `+inf`.
pub fn masked_argmin(row: &[f64]) -> (usize, f64) {
    let mut best_idx = usize::MAX;
    let mut best_val = f64::INFINITY;
    for (idx, &v) in row.iter().enumerate() {
        if v < best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    (best_idx, best_val)
}

/// Index and value of the maximum finite entry of `row`, ties broken by
/// smallest index. `(usize::MAX, +inf)` if every entry is `+inf` — the row's
/// aggregate is `+inf` regardless of which reduction is used (§9).
pub fn masked_argmax(row: &[f64]) -> (usize, f64) {
    let mut best_idx = usize::MAX;
    let mut best_val = f64::NEG_INFINITY;
    let mut any_finite = false;
    for (idx, &v) in row.iter().enumerate() {
        if v.is_finite() {
            any_finite = true;
            if v > best_val {
                best_val = v;
                best_idx = idx;
            }
        }
    }
    if any_finite {
        (best_idx, best_val)
    } else {
        (usize::MAX, f64::INFINITY)
    }
}

/// The single node with no predecessors. `MalformedDagRoot` if there isn't
/// exactly one.
pub fn find_root(dag: &Dag) -> Result<NodeIndex, ScheduleError> {
    let roots: Vec<NodeIndex> = dag
        .node_indices()
        .filter(|&n| dag.neighbors_directed(n, Incoming).next().is_none())
        .collect();
    if roots.len() != 1 {
        return Err(ScheduleError::MalformedDagRoot { count: roots.len() });
    }
    Ok(roots[0])
}

/// The single node with no successors. `MalformedDagTerminal` if there
/// isn't exactly one.
pub fn find_terminal(dag: &Dag) -> Result<NodeIndex, ScheduleError> {
    let terminals: Vec<NodeIndex> = dag
        .node_indices()
        .filter(|&n| dag.neighbors_directed(n, Outgoing).next().is_none())
        .collect();
    if terminals.len() != 1 {
        return Err(ScheduleError::MalformedDagTerminal {
            count: terminals.len(),
        });
    }
    Ok(terminals[0])
}
