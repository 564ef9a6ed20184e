//! Loader collaborator (C7): parses the CSV matrices the CLI (C8) needs to
//! build a [`heft::CostModel`] and [`heft::Dag`], in the shape the original
//! `readCsvToNumpyMatrix`/`readDagMatrix`/`readCsvToDict` helpers expect —
//! one header row and one header column, stripped before use.
use std::path::Path;

use heft::model::NodeData;
use heft::{CostModel, Dag, LoaderError};

/// Reads `path` as a comma-separated matrix with one header row and one
/// header column, both stripped, parsing the literal token `inf` (any case)
/// as `f64::INFINITY`.
fn read_numeric_matrix(path: &Path) -> Result<Vec<Vec<f64>>, LoaderError> {
    let file_name = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|source| LoaderError::Csv {
            file: file_name.clone(),
            source,
        })?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut expected_cols: Option<usize> = None;

    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|source| LoaderError::Csv {
            file: file_name.clone(),
            source,
        })?;
        if idx == 0 {
            continue; // header row
        }

        let mut fields = record.iter();
        fields.next(); // header column

        let mut row = Vec::with_capacity(record.len().saturating_sub(1));
        for value in fields {
            let trimmed = value.trim();
            let parsed = if trimmed.eq_ignore_ascii_case("inf") {
                f64::INFINITY
            } else {
                trimmed.parse::<f64>().map_err(|_| LoaderError::NonNumeric {
                    file: file_name.clone(),
                    row: idx,
                    value: trimmed.to_string(),
                })?
            };
            row.push(parsed);
        }

        match expected_cols {
            Some(cols) if cols != row.len() => {
                return Err(LoaderError::RaggedRow {
                    file: file_name,
                    row: idx,
                    expected: cols,
                    found: row.len(),
                })
            }
            Some(_) => {}
            None => expected_cols = Some(row.len()),
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Loads the `V x Q` task-execution matrix.
pub fn load_task_execution_matrix(path: &Path) -> Result<Vec<Vec<f64>>, LoaderError> {
    read_numeric_matrix(path)
}

/// Loads the `V x Q` (or `V x Q` only for energy-aware runs) power table.
pub fn load_power_matrix(path: &Path) -> Result<Vec<Vec<f64>>, LoaderError> {
    read_numeric_matrix(path)
}

/// Loads the `Q x Q` (or `Q+1 x Q`) PE connectivity matrix, splitting off the
/// trailing startup-cost row `L` when present.
pub fn load_pe_connectivity(path: &Path) -> Result<(Vec<Vec<f64>>, Vec<f64>), LoaderError> {
    let file_name = path.display().to_string();
    let mut rows = read_numeric_matrix(path)?;
    let cols = rows.first().map(|r| r.len()).unwrap_or(0);

    if rows.len() == cols {
        let startup = vec![0.0; cols];
        Ok((rows, startup))
    } else if rows.len() == cols + 1 {
        let startup = rows.pop().expect("checked len == cols + 1 > 0");
        Ok((rows, startup))
    } else {
        Err(LoaderError::MalformedConnectivity {
            file: file_name,
            rows: rows.len(),
            cols,
        })
    }
}

/// Builds a [`CostModel`] from a task-execution matrix, a PE connectivity
/// file, and an optional power table.
pub fn load_cost_model(
    task_execution_path: &Path,
    pe_connectivity_path: &Path,
    power_path: Option<&Path>,
) -> Result<CostModel, LoaderError> {
    let computation = load_task_execution_matrix(task_execution_path)?;
    let (communication, startup) = load_pe_connectivity(pe_connectivity_path)?;
    let mut cost = CostModel::new(computation, communication, startup);
    if let Some(power_path) = power_path {
        cost = cost.with_power(load_power_matrix(power_path)?);
    }
    Ok(cost)
}

/// Builds a [`Dag`] from a `V x V` connectivity matrix, where a zero entry
/// means "no edge" and a non-zero entry is the edge weight.
pub fn load_dag(path: &Path) -> Result<Dag, LoaderError> {
    let matrix = read_numeric_matrix(path)?;
    let mut dag = Dag::new();
    let nodes: Vec<_> = (0..matrix.len())
        .map(|i| dag.add_node(NodeData::new(i as i32)))
        .collect();

    for (i, row) in matrix.iter().enumerate() {
        for (j, &weight) in row.iter().enumerate() {
            if weight != 0.0 {
                dag.add_edge(nodes[i], nodes[j], weight);
            }
        }
    }
    Ok(dag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_numeric_matrix_strips_header_row_and_column() {
        let path = write_fixture(
            "heft_loader_test_w.csv",
            "h,P0,P1\n0,14,16\n1,13,19\n",
        );
        let matrix = read_numeric_matrix(&path).unwrap();
        assert_eq!(matrix, vec![vec![14.0, 16.0], vec![13.0, 19.0]]);
    }

    #[test]
    fn test_read_numeric_matrix_parses_inf_token() {
        let path = write_fixture("heft_loader_test_inf.csv", "h,P0,P1\n0,inf,INF\n");
        let matrix = read_numeric_matrix(&path).unwrap();
        assert_eq!(matrix, vec![vec![f64::INFINITY, f64::INFINITY]]);
    }

    #[test]
    fn test_load_pe_connectivity_splits_startup_row() {
        let path = write_fixture(
            "heft_loader_test_c.csv",
            "h,P0,P1\n0,0,1\n1,1,0\nL,2,3\n",
        );
        let (communication, startup) = load_pe_connectivity(&path).unwrap();
        assert_eq!(communication, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(startup, vec![2.0, 3.0]);
    }

    #[test]
    fn test_load_pe_connectivity_defaults_startup_when_square() {
        let path = write_fixture("heft_loader_test_c_square.csv", "h,P0,P1\n0,0,1\n1,1,0\n");
        let (communication, startup) = load_pe_connectivity(&path).unwrap();
        assert_eq!(communication, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(startup, vec![0.0, 0.0]);
    }

    #[test]
    fn test_load_dag_skips_zero_entries() {
        let path = write_fixture(
            "heft_loader_test_dag.csv",
            "h,n0,n1,n2\n0,0,5,0\n1,0,0,7\n2,0,0,0\n",
        );
        let dag = load_dag(&path).unwrap();
        assert_eq!(dag.edge_count(), 2);
    }

    #[test]
    fn test_ragged_row_reported() {
        let path = write_fixture("heft_loader_test_ragged.csv", "h,P0,P1\n0,1,2\n1,1\n");
        let err = read_numeric_matrix(&path).unwrap_err();
        assert!(matches!(err, LoaderError::RaggedRow { row: 2, .. }));
    }
}
