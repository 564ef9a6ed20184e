//! Result dump / summary writer (C9): serialises a finished schedule as YAML
//! in the teacher's `dump_struct`/`append_info_to_yaml` style.
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::scheduler::ScheduleSummary;
use crate::timeline::{ProcessorTimeline, Slot};

#[derive(Serialize, Deserialize)]
struct PeLog {
    pe: usize,
    slots: Vec<Slot>,
}

#[derive(Serialize, Deserialize)]
struct SummaryEntry {
    task: i32,
    pe: usize,
    index_on_pe: usize,
    prior_on_pe: Option<i32>,
}

/// The full, YAML-serialisable snapshot of one completed run.
#[derive(Serialize, Deserialize)]
pub struct ScheduleReport {
    timelines: Vec<PeLog>,
    summary: Vec<SummaryEntry>,
}

impl ScheduleReport {
    pub fn new(timelines: &[ProcessorTimeline], summary: &HashMap<i32, ScheduleSummary>) -> Self {
        let pe_logs = timelines
            .iter()
            .enumerate()
            .map(|(pe, timeline)| PeLog {
                pe,
                slots: timeline.slots().to_vec(),
            })
            .collect();

        let mut summary_entries: Vec<SummaryEntry> = summary
            .iter()
            .map(|(&task, s)| SummaryEntry {
                task,
                pe: s.pe,
                index_on_pe: s.index_on_pe,
                prior_on_pe: s.prior_on_pe,
            })
            .collect();
        summary_entries.sort_by_key(|e| e.task);

        Self {
            timelines: pe_logs,
            summary: summary_entries,
        }
    }
}

fn create_yaml_file_core(folder_path: &str, file_name: &str) -> String {
    if fs::metadata(folder_path).is_err() {
        let _ = fs::create_dir_all(folder_path);
        info!("Created folder: {}", folder_path);
    }
    let file_path = format!("{}/{}.yaml", folder_path, file_name);
    if let Err(err) = fs::File::create(&file_path) {
        warn!("Failed to create file: {}", err);
    }
    file_path
}

/// Builds a timestamped `<date>-<alg_name>-log.yaml` path under `dir_path`,
/// creating the directory and an empty file if needed.
pub fn create_scheduler_log_yaml(dir_path: &str, alg_name: &str) -> String {
    let now: DateTime<Utc> = Utc::now();
    let date = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    let file_name = format!("{}-{}-log", date, alg_name);
    create_yaml_file_core(dir_path, &file_name)
}

/// Appends `info` (already-rendered YAML text) to `file_path`.
pub fn append_info_to_yaml(file_path: &str, info: &str) {
    if let Ok(mut file) = OpenOptions::new()
        .write(true)
        .append(true)
        .create(true)
        .open(file_path)
    {
        if let Err(err) = file.write_all(info.as_bytes()) {
            warn!("Failed to write to file: {}", err);
        }
    } else {
        warn!("Failed to open file: {}", file_path);
    }
}

/// Serialises `report` and appends it to `file_path`.
pub fn dump_struct(file_path: &str, report: &ScheduleReport) {
    let yaml = serde_yaml::to_string(report).expect("Failed to serialize ScheduleReport");
    append_info_to_yaml(file_path, &yaml);
}
