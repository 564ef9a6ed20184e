//! Shared configuration surface (ambient C10 support): the typed knobs a
//! caller picks before invoking the scheduler, gathered in one place the way
//! the teacher collects a run's parameters ahead of dispatch.
use crate::multi::MultiStrategy;
use crate::rank::RankMetric;
use crate::scheduler::{Objective, ScheduleConfig};

/// The full set of choices needed to drive either the single-DAG (C5) or
/// multi-DAG (C6) path. `strategy` is only consulted by the multi-DAG path.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub rank_metric: RankMetric,
    pub objective: Objective,
    pub strategy: MultiStrategy,
    pub time_offset: f64,
    pub relabel_nodes: bool,
}

impl Config {
    pub fn to_schedule_config(self) -> ScheduleConfig {
        ScheduleConfig {
            rank_metric: self.rank_metric,
            objective: self.objective,
            time_offset: self.time_offset,
            relabel_nodes: self.relabel_nodes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rank_metric: RankMetric::Mean,
            objective: Objective::Eft,
            strategy: MultiStrategy::LSque,
            time_offset: 0.0,
            relabel_nodes: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_schedule_config_preserves_fields() {
        let config = Config {
            rank_metric: RankMetric::Worst,
            objective: Objective::EdpAbs,
            strategy: MultiStrategy::SComp,
            time_offset: 3.0,
            relabel_nodes: false,
        };
        let schedule_config = config.to_schedule_config();
        assert_eq!(schedule_config.rank_metric, RankMetric::Worst);
        assert_eq!(schedule_config.objective, Objective::EdpAbs);
        assert_eq!(schedule_config.time_offset, 3.0);
        assert!(!schedule_config.relabel_nodes);
    }
}
