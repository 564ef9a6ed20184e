//! Error kinds surfaced by the scheduling core. Every run is all-or-nothing: on
//! any of these the engine stops and returns, it never retries or partially
//! recovers.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("DAG has {count} root node(s) (nodes with no predecessors), expected exactly 1")]
    MalformedDagRoot { count: usize },

    #[error("DAG has {count} terminal node(s) (nodes with no successors), expected exactly 1")]
    MalformedDagTerminal { count: usize },

    #[error("unsupported rank metric: {0}")]
    UnsupportedMetric(String),

    #[error("missing required parameter `{0}` for the selected metric/objective")]
    MissingParameter(&'static str),

    #[error("objective `{0}` is not implemented")]
    NotImplemented(&'static str),

    #[error("node {node} has unscheduled predecessor {predecessor}")]
    UnscheduledPredecessor { node: i32, predecessor: i32 },

    #[error("node {node} cannot be ranked: its successors form a dependency deadlock")]
    DependencyDeadlock { node: i32 },

    #[error(
        "invariant violation on PE {pe}: job {first_task} ends at {first_end} but its \
         successor {second_task} starts at {second_start}"
    )]
    InvariantViolation {
        pe: usize,
        first_task: i32,
        first_end: f64,
        second_task: i32,
        second_start: f64,
    },

    #[error(transparent)]
    Loader(#[from] LoaderError),
}

/// Failures parsing the CSV matrices the loader collaborator builds
/// [`crate::model::Dag`]/[`crate::model::CostModel`] instances from.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read `{file}`: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },
    #[error("`{file}` row {row} is ragged: expected {expected} columns, found {found}")]
    RaggedRow {
        file: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("`{file}` row {row} has a non-numeric entry: `{value}`")]
    NonNumeric {
        file: String,
        row: usize,
        value: String,
    },
    #[error("`{file}` connectivity matrix has {rows} rows for {cols} columns; expected {cols} or {cols}+1")]
    MalformedConnectivity {
        file: String,
        rows: usize,
        cols: usize,
    },
}
