//! CLI front-end (C8) over the `heft` scheduling core.
mod loader;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use heft::model::NodeData;
use heft::{
    schedule_dag, schedule_workflows, Config, Dag, MultiStrategy, Objective, RankMetric,
    ScheduleError, Workflow,
};
use log::info;
use std::collections::HashMap;

use loader::{load_cost_model, load_dag};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ObjectiveArg {
    Eft,
    EdpAbs,
    EdpRel,
    Energy,
}

impl From<ObjectiveArg> for Objective {
    fn from(value: ObjectiveArg) -> Self {
        match value {
            ObjectiveArg::Eft => Objective::Eft,
            ObjectiveArg::EdpAbs => Objective::EdpAbs,
            ObjectiveArg::EdpRel => Objective::EdpRel,
            ObjectiveArg::Energy => Objective::Energy,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    SComp,
    LComp,
    SComm,
    LComm,
    SRank,
    LRank,
    SSque,
    LSque,
}

impl From<StrategyArg> for MultiStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::SComp => MultiStrategy::SComp,
            StrategyArg::LComp => MultiStrategy::LComp,
            StrategyArg::SComm => MultiStrategy::SComm,
            StrategyArg::LComm => MultiStrategy::LComm,
            StrategyArg::SRank => MultiStrategy::SRank,
            StrategyArg::LRank => MultiStrategy::LRank,
            StrategyArg::SSque => MultiStrategy::SSque,
            StrategyArg::LSque => MultiStrategy::LSque,
        }
    }
}

/// `wf_id:dag_file:task_execution_file` — one instance per `--workflow` flag.
#[derive(Debug, Clone)]
struct WorkflowSpec {
    wf_id: usize,
    dag_file: PathBuf,
    task_execution_file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("expected `wf_id:dag_file:task_execution_file`, got `{0}`")]
struct WorkflowSpecParseError(String);

impl std::str::FromStr for WorkflowSpec {
    type Err = WorkflowSpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(WorkflowSpecParseError(s.to_string()));
        }
        let wf_id = parts[0]
            .parse::<usize>()
            .map_err(|_| WorkflowSpecParseError(s.to_string()))?;
        Ok(Self {
            wf_id,
            dag_file: PathBuf::from(parts[1]),
            task_execution_file: PathBuf::from(parts[2]),
        })
    }
}

#[derive(Parser)]
#[clap(
    name = "heft",
    version = "0.1.0",
    about = "Schedules a task DAG (or a set of them) onto heterogeneous processing elements using HEFT."
)]
struct ArgParser {
    /// Path to the DAG connectivity matrix CSV.
    #[clap(long)]
    dag_file: Option<PathBuf>,
    /// Path to the PE connectivity matrix CSV.
    #[clap(long)]
    pe_connectivity_file: Option<PathBuf>,
    /// Path to the task-execution matrix CSV.
    #[clap(long)]
    task_execution_file: Option<PathBuf>,
    /// Path to the optional power table CSV (required for EDP metrics/objectives).
    #[clap(long)]
    power_file: Option<PathBuf>,

    /// One of `mean`, `worst`, `best`, `edp` (case-insensitive).
    #[clap(long, default_value = "mean")]
    rank_metric: String,
    #[clap(long, value_enum, default_value = "eft")]
    objective: ObjectiveArg,
    #[clap(long, default_value_t = 0.0)]
    time_offset: f64,
    #[clap(long, default_value_t = true)]
    relabel_nodes: bool,

    /// Repeatable `wf_id:dag_file:task_execution_file` triple; when given at
    /// least twice, the multi-DAG path (C6) is used instead of the
    /// single-DAG path (C5).
    #[clap(long = "workflow")]
    workflows: Vec<WorkflowSpec>,
    #[clap(long, value_enum, default_value = "l-sque")]
    strategy: StrategyArg,

    /// Directory to dump the full YAML schedule report (C9) into.
    #[clap(long)]
    output_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = ArgParser::parse();

    let result = if args.workflows.len() >= 2 {
        run_multi(&args)
    } else {
        run_single(&args)
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run_single(args: &ArgParser) -> Result<(), ScheduleError> {
    let (dag, cost) = match (
        &args.dag_file,
        &args.pe_connectivity_file,
        &args.task_execution_file,
    ) {
        (Some(dag_file), Some(pe_file), Some(task_file)) => {
            let dag = load_dag(dag_file)?;
            let cost = load_cost_model(task_file, pe_file, args.power_file.as_deref())?;
            (dag, cost)
        }
        _ => {
            info!("no input files given, using the canonical Topcuoglu 2002 example");
            canonical_example()
        }
    };

    let config = Config {
        rank_metric: RankMetric::parse(&args.rank_metric)?,
        objective: args.objective.into(),
        strategy: args.strategy.into(),
        time_offset: args.time_offset,
        relabel_nodes: args.relabel_nodes,
    }
    .to_schedule_config();

    let result = schedule_dag(&dag, &cost, None, HashMap::new(), &config)?;
    print_summary(&result.timelines);

    if let Some(output_dir) = &args.output_dir {
        let report = heft::log::ScheduleReport::new(&result.timelines, &result.summary);
        let file_path =
            heft::log::create_scheduler_log_yaml(&output_dir.display().to_string(), "heft");
        heft::log::dump_struct(&file_path, &report);
        println!("wrote schedule report to {file_path}");
    }

    Ok(())
}

fn run_multi(args: &ArgParser) -> Result<(), ScheduleError> {
    let pe_file = args
        .pe_connectivity_file
        .as_ref()
        .ok_or(ScheduleError::MissingParameter("pe-connectivity-file"))?;

    let mut workflows = HashMap::new();
    for spec in &args.workflows {
        let dag = load_dag(&spec.dag_file)?;
        let cost = load_cost_model(&spec.task_execution_file, pe_file, args.power_file.as_deref())?;
        workflows.insert(spec.wf_id, Workflow { dag, cost });
    }

    let config = Config {
        rank_metric: RankMetric::parse(&args.rank_metric)?,
        objective: args.objective.into(),
        strategy: args.strategy.into(),
        time_offset: args.time_offset,
        relabel_nodes: args.relabel_nodes,
    };

    let result = schedule_workflows(&workflows, config.strategy, config.rank_metric)?;
    print_summary(&result.timelines);
    Ok(())
}

fn print_summary(timelines: &[heft::ProcessorTimeline]) {
    let makespan = timelines
        .iter()
        .filter_map(|t| t.last())
        .map(|s| s.end)
        .fold(0.0, f64::max);
    println!("makespan: {makespan}");
    for (pe, timeline) in timelines.iter().enumerate() {
        println!("PE {pe}: {} job(s)", timeline.len());
    }
}

/// Matches the original source's `test/canonicalgraph_*` defaults: the
/// Topcuoglu 2002 10-task, 3-PE example.
fn canonical_example() -> (Dag, heft::CostModel) {
    let cost = heft::CostModel::new(
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
    );

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
    (dag, cost)
}
