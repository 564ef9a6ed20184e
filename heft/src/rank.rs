//! Upward-rank computer (C3). Assigns every node a `ranku` via a
//! reverse-topological traversal rooted at the DAG's terminal node.
use std::collections::{HashMap, VecDeque};

use log::debug;
use petgraph::graph::NodeIndex;
use petgraph::Direction::{Incoming, Outgoing};

use crate::error::ScheduleError;
use crate::model::{find_terminal, masked_argmax, masked_argmin, masked_mean, CostModel, Dag};

/// Which quantity drives the greedy placement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Mean,
    Worst,
    Best,
    Edp,
}

impl RankMetric {
    /// Parses a rank metric name, case-insensitively. Used where the metric
    /// comes from free-form input (a CLI flag, a config value) rather than
    /// a closed enum already validated by the caller.
    pub fn parse(name: &str) -> Result<Self, ScheduleError> {
        match name.to_ascii_lowercase().as_str() {
            "mean" => Ok(RankMetric::Mean),
            "worst" => Ok(RankMetric::Worst),
            "best" => Ok(RankMetric::Best),
            "edp" => Ok(RankMetric::Edp),
            other => Err(ScheduleError::UnsupportedMetric(other.to_string())),
        }
    }
}

/// Computes `ranku` for every node of `dag` under `metric`. `EDP` requires
/// `cost.power` to be populated.
pub fn compute_ranku(
    dag: &Dag,
    cost: &CostModel,
    metric: RankMetric,
) -> Result<HashMap<NodeIndex, f64>, ScheduleError> {
    if metric == RankMetric::Edp && cost.power.is_none() {
        return Err(ScheduleError::MissingParameter("power"));
    }

    let terminal = find_terminal(dag)?;
    let mut ranku: HashMap<NodeIndex, f64> = HashMap::new();
    let terminal_value = rank_value(dag, cost, metric, terminal, &ranku)?;
    debug!("ranku[{}] = {terminal_value} (terminal)", dag[terminal].id);
    ranku.insert(terminal, terminal_value);

    let mut visit_queue: VecDeque<NodeIndex> =
        dag.neighbors_directed(terminal, Incoming).collect();

    while let Some(mut node) = visit_queue.pop_back() {
        while !node_can_be_processed(dag, node, &ranku) {
            match visit_queue.pop_back() {
                Some(next) => {
                    visit_queue.push_front(node);
                    node = next;
                }
                None => {
                    return Err(ScheduleError::DependencyDeadlock {
                        node: dag[node].id,
                    })
                }
            }
        }

        let value = rank_value(dag, cost, metric, node, &ranku)?;
        debug!("ranku[{}] = {value}", dag[node].id);
        ranku.insert(node, value);

        for pred in dag.neighbors_directed(node, Incoming) {
            if !visit_queue.contains(&pred) {
                visit_queue.push_front(pred);
            }
        }
    }

    Ok(ranku)
}

/// True once every successor of `node` already has a `ranku` assigned. This
/// is the check that prevents the diamond hazard: `C -> A, C -> B, B -> A`
/// must rank `B` before `A`, even though both get queued from `C`.
fn node_can_be_processed(dag: &Dag, node: NodeIndex, ranku: &HashMap<NodeIndex, f64>) -> bool {
    dag.neighbors_directed(node, Outgoing)
        .all(|succ| ranku.contains_key(&succ))
}

fn rank_value(
    dag: &Dag,
    cost: &CostModel,
    metric: RankMetric,
    node: NodeIndex,
    ranku: &HashMap<NodeIndex, f64>,
) -> Result<f64, ScheduleError> {
    let task_id = dag[node].id as usize;
    let w_row = &cost.computation[task_id];
    let successors: Vec<NodeIndex> = dag.neighbors_directed(node, Outgoing).collect();

    match metric {
        RankMetric::Mean => {
            let base = masked_mean(w_row);
            if successors.is_empty() {
                return Ok(base);
            }
            let max_succ = successors
                .iter()
                .map(|&succ| {
                    let weight = dag[dag.find_edge(node, succ).expect("edge must exist")];
                    cost.edge_avgweight(weight) + ranku[&succ]
                })
                .fold(f64::NEG_INFINITY, f64::max);
            Ok(base + max_succ)
        }
        RankMetric::Worst => {
            let (qn, valn) = masked_argmax(w_row);
            if successors.is_empty() {
                return Ok(valn);
            }
            let max_succ = successors
                .iter()
                .map(|&succ| {
                    let succ_id = dag[succ].id as usize;
                    let (qs, _) = masked_argmax(&cost.computation[succ_id]);
                    let comm = communication_cost(cost, qn, qs);
                    comm + ranku[&succ]
                })
                .fold(f64::NEG_INFINITY, f64::max);
            Ok(valn + max_succ)
        }
        RankMetric::Best => {
            let (qn, valn) = masked_argmin(w_row);
            if successors.is_empty() {
                return Ok(valn);
            }
            let min_succ = successors
                .iter()
                .map(|&succ| {
                    let succ_id = dag[succ].id as usize;
                    let (qs, _) = masked_argmin(&cost.computation[succ_id]);
                    let comm = communication_cost(cost, qn, qs);
                    comm + ranku[&succ]
                })
                .fold(f64::INFINITY, f64::min);
            Ok(valn + min_succ)
        }
        RankMetric::Edp => {
            let power_row = &cost
                .power
                .as_ref()
                .ok_or(ScheduleError::MissingParameter("power"))?[task_id];
            let base = masked_mean(w_row).powi(2) * masked_mean(power_row);
            if successors.is_empty() {
                return Ok(base);
            }
            let max_succ = successors
                .iter()
                .map(|&succ| {
                    let weight = dag[dag.find_edge(node, succ).expect("edge must exist")];
                    cost.edge_avgweight(weight) + ranku[&succ]
                })
                .fold(f64::NEG_INFINITY, f64::max);
            Ok(base + max_succ)
        }
    }
}

/// `C[p][q]`, or `+inf` if either PE index is the "no finite entry" sentinel
/// from [`masked_argmax`]/[`masked_argmin`].
fn communication_cost(cost: &CostModel, p: usize, q: usize) -> f64 {
    if p == usize::MAX || q == usize::MAX {
        f64::INFINITY
    } else {
        cost.communication[p][q]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeData;

    /// Topcuoglu 2002's canonical 10-task, 3-PE example.
    fn canonical_cost() -> CostModel {
        CostModel::new(
            vec![
                vec![14.0, 16.0, 9.0],
                vec![13.0, 19.0, 18.0],
                vec![11.0, 13.0, 19.0],
                vec![13.0, 8.0, 17.0],
                vec![12.0, 13.0, 10.0],
                vec![13.0, 16.0, 9.0],
                vec![7.0, 15.0, 11.0],
                vec![5.0, 11.0, 14.0],
                vec![18.0, 12.0, 20.0],
                vec![21.0, 7.0, 16.0],
            ],
            vec![
                vec![0.0, 1.0, 1.0],
                vec![1.0, 0.0, 1.0],
                vec![1.0, 1.0, 0.0],
            ],
            vec![0.0, 0.0, 0.0],
        )
    }

    fn canonical_dag() -> Dag {
        let mut dag = Dag::new();
        let nodes: Vec<_> = (0..10).map(|i| dag.add_node(NodeData::new(i))).collect();
        let edges = [
            (0, 1, 18.0),
            (0, 2, 12.0),
            (0, 3, 9.0),
            (0, 4, 11.0),
            (0, 5, 14.0),
            (1, 7, 19.0),
            (1, 8, 16.0),
            (2, 6, 23.0),
            (3, 7, 27.0),
            (3, 8, 23.0),
            (4, 8, 13.0),
            (4, 9, 15.0),
            (5, 7, 15.0),
            (6, 9, 11.0),
            (7, 9, 17.0),
            (8, 9, 13.0),
        ];
        for (u, v, w) in edges {
            dag.add_edge(nodes[u], nodes[v], w);
        }
        dag
    }

    #[test]
    fn test_mean_ranku_root_is_maximal() {
        let dag = canonical_dag();
        let cost = canonical_cost();
        let ranku = compute_ranku(&dag, &cost, RankMetric::Mean).unwrap();
        let root = NodeIndex::new(0);
        for (&node, &value) in ranku.iter() {
            if node != root {
                assert!(ranku[&root] >= value);
            }
        }
    }

    #[test]
    fn test_ranku_idempotent() {
        let dag = canonical_dag();
        let cost = canonical_cost();
        let first = compute_ranku(&dag, &cost, RankMetric::Mean).unwrap();
        let second = compute_ranku(&dag, &cost, RankMetric::Mean).unwrap();
        for node in dag.node_indices() {
            assert_eq!(first[&node], second[&node]);
        }
    }

    #[test]
    fn test_parse_accepts_known_metrics_case_insensitively() {
        assert_eq!(RankMetric::parse("Mean").unwrap(), RankMetric::Mean);
        assert_eq!(RankMetric::parse("WORST").unwrap(), RankMetric::Worst);
        assert_eq!(RankMetric::parse("best").unwrap(), RankMetric::Best);
        assert_eq!(RankMetric::parse("edp").unwrap(), RankMetric::Edp);
    }

    #[test]
    fn test_parse_rejects_unknown_metric() {
        let err = RankMetric::parse("fastest").unwrap_err();
        assert!(matches!(err, ScheduleError::UnsupportedMetric(m) if m == "fastest"));
    }

    #[test]
    fn test_edp_requires_power() {
        let dag = canonical_dag();
        let cost = canonical_cost();
        assert!(matches!(
            compute_ranku(&dag, &cost, RankMetric::Edp),
            Err(ScheduleError::MissingParameter("power"))
        ));
    }

    #[test]
    fn test_diamond_hazard_does_not_panic() {
        // C -> A, C -> B, B -> A: A must not be ranked before B even though
        // the naive deque order would pop A first.
        let mut dag = Dag::new();
        let a = dag.add_node(NodeData::new(0));
        let b = dag.add_node(NodeData::new(1));
        let c = dag.add_node(NodeData::new(2));
        dag.add_edge(c, a, 1.0);
        dag.add_edge(c, b, 1.0);
        dag.add_edge(b, a, 1.0);
        let cost = CostModel::new(
            vec![vec![1.0], vec![1.0], vec![1.0]],
            vec![vec![0.0]],
            vec![0.0],
        );
        let ranku = compute_ranku(&dag, &cost, RankMetric::Mean).unwrap();
        assert_eq!(ranku.len(), 3);
    }

    #[test]
    fn test_best_metric_propagates_infinity_for_forbidden_successor() {
        let mut dag = Dag::new();
        let a = dag.add_node(NodeData::new(0));
        let b = dag.add_node(NodeData::new(1));
        dag.add_edge(a, b, 1.0);
        let cost = CostModel::new(
            vec![vec![1.0, 2.0], vec![f64::INFINITY, f64::INFINITY]],
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec![0.0, 0.0],
        );
        let ranku = compute_ranku(&dag, &cost, RankMetric::Best).unwrap();
        assert_eq!(ranku[&a], f64::INFINITY);
    }
}
