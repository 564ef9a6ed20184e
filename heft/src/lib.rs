//! HEFT-based DAG scheduling engine.
//!
//! Components map onto the pipeline: [`model`] (C1) and [`timeline`] (C2)
//! are the data layer; [`rank`] (C3) and [`eft`] (C4) are the estimators the
//! greedy placement loop in [`scheduler`] (C5) and [`multi`] (C6) consume.
//! [`log`] and [`util`] carry the ambient result-dump and configuration
//! surface; [`error`] is the single error type threaded through all of it.
pub mod eft;
pub mod error;
pub mod log;
pub mod model;
pub mod multi;
pub mod rank;
pub mod scheduler;
pub mod timeline;
pub mod util;

pub use error::{LoaderError, ScheduleError};
pub use model::{CostModel, Dag, NodeData};
pub use multi::{schedule_workflows, MultiScheduleResult, MultiStrategy, Workflow};
pub use rank::RankMetric;
pub use scheduler::{schedule_dag, Objective, ScheduleConfig, ScheduleResult, ScheduleSummary};
pub use timeline::{ProcessorTimeline, Slot};
pub use util::Config;
