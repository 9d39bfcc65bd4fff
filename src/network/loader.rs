//! CSV loading of the static network tables.
//!
//! File contracts (all headerless, comma-separated, one value per cell):
//!
//! - `stations.csv`: one row per logical station,
//!   `stationId, lineId, isTerminalDir0, isTerminalDir1, isTransfer`;
//!   station ids must be dense and in row order.
//! - `directions.csv`: N×N integers in {-1, 0, 1}.
//! - `policyNum.csv`: N×N candidate counts.
//! - `policy.csv`: N·N rows (row index `from·N + to`), each padded to
//!   `max_policy_num` columns with -1; the first `policyNum[from][to]`
//!   cells are the candidate stations.
//! - `transferTime.csv`: N×N floats, -1 for "no transfer relationship".
//! - `startTrainInfo.csv`: one row per train,
//!   `trainId, startingStationId, lineId, direction, capacity, startTime`;
//!   a zero capacity falls back to the configured default.
//! - `arrivalTime.csv` / `arrivalStationID.csv`: parallel ragged rows, one
//!   per train id, enumerating the stops after the starting station.
//!
//! Every inconsistency is fatal here: the engine refuses to run on data it
//! cannot trust.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::config::SimulationConfig;
use super::{Network, ScheduledStop, StartTrain, StationInfo, TrainSchedule};

/// Fatal static-data inconsistency detected at load time.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("station table is empty")]
    EmptyStationTable,

    #[error("{path}:{line}: expected {expected} fields, found {found}")]
    FieldCount {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("{path}:{line}: cannot parse '{value}' as a number")]
    Parse {
        path: String,
        line: usize,
        value: String,
    },

    #[error("station row {row} carries id {found}; ids must be dense and in order")]
    StationIdMismatch { row: usize, found: i64 },

    #[error("table {table}: expected {expected} entries per axis, found {rows} rows / {cols} columns")]
    Shape {
        table: &'static str,
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("directions[{from}][{to}] = {value}, expected -1, 0 or 1")]
    BadDirection { from: usize, to: usize, value: i8 },

    #[error("policy[{from}][{to}] stores {found} candidates, more than max_policy_num = {max}")]
    TooManyCandidates {
        from: usize,
        to: usize,
        found: usize,
        max: usize,
    },

    #[error("policy[{from}][{to}] declares more candidates than the policy table holds")]
    PolicyHole { from: usize, to: usize },

    #[error("station id {station} out of range (network has {total} stations)")]
    StationRange { station: usize, total: usize },

    #[error("train id {train} out of range (schedule table has {total} trains)")]
    TrainRange { train: usize, total: usize },

    #[error("transfer time matrix contains a non-finite value")]
    NonFiniteTransferTime,

    #[error("train {train}: stop times are not nondecreasing")]
    UnorderedStops { train: usize },

    #[error("train {train}: arrival time stream has {times} stops but station stream has {stations}")]
    StreamMismatch {
        train: usize,
        times: usize,
        stations: usize,
    },

    #[error("start train row {row}: {reason}")]
    BadStartTrain { row: usize, reason: String },
}

impl Network {
    /// Load the eight static tables from `dir` and assemble a validated
    /// [`Network`].
    ///
    /// # Errors
    ///
    /// Returns the first [`LoadError`] encountered; nothing is retried and
    /// no partially loaded network is ever produced.
    pub fn load(dir: impl AsRef<Path>, config: &SimulationConfig) -> Result<Network, LoadError> {
        let dir = dir.as_ref();

        let stations = load_stations(&dir.join("stations.csv"))?;
        let n = stations.len();
        if n == 0 {
            return Err(LoadError::EmptyStationTable);
        }

        let directions = load_int_matrix(&dir.join("directions.csv"), "directions", n)?;
        let policy_num = load_count_matrix(&dir.join("policyNum.csv"), n)?;
        let policy = load_policy(
            &dir.join("policy.csv"),
            &policy_num,
            n,
            config.max_policy_num,
        )?;
        let transfer_time = load_float_matrix(&dir.join("transferTime.csv"), n)?;
        let schedules = load_schedules(
            &dir.join("arrivalTime.csv"),
            &dir.join("arrivalStationID.csv"),
        )?;
        let start_trains =
            load_start_trains(&dir.join("startTrainInfo.csv"), config.default_capacity)?;

        let network = Network::from_parts(
            stations,
            directions,
            policy,
            transfer_time,
            schedules,
            start_trains,
            config.max_policy_num,
        )?;

        info!(
            stations = network.num_stations(),
            trains = network.num_trains(),
            start_trains = network.start_trains().len(),
            "loaded network tables"
        );
        Ok(network)
    }
}

// ============================================================================
// Row readers
// ============================================================================

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Io { path: display(path), source })
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Read non-blank rows split into trimmed cells. Used for the dense tables,
/// where a blank row is never meaningful.
fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let reader = open(path)?;
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| LoadError::Io { path: display(path), source })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        rows.push(trimmed.split(',').map(|cell| cell.trim().to_string()).collect());
    }
    Ok(rows)
}

/// Read rows keeping blank lines (a train with no remaining stops), dropping
/// only trailing empties produced by a final newline.
fn read_ragged_rows(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let reader = open(path)?;
    let mut rows: Vec<Vec<String>> = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|source| LoadError::Io { path: display(path), source })?;
        let cells: Vec<String> = line
            .trim()
            .split(',')
            .map(|cell| cell.trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();
        rows.push(cells);
    }
    while rows.last().is_some_and(|row| row.is_empty()) {
        rows.pop();
    }
    Ok(rows)
}

fn parse_i64(cell: &str, path: &Path, line: usize) -> Result<i64, LoadError> {
    cell.parse().map_err(|_| LoadError::Parse {
        path: display(path),
        line,
        value: cell.to_string(),
    })
}

fn parse_f64(cell: &str, path: &Path, line: usize) -> Result<f64, LoadError> {
    cell.parse().map_err(|_| LoadError::Parse {
        path: display(path),
        line,
        value: cell.to_string(),
    })
}

// ============================================================================
// Table loaders
// ============================================================================

fn load_stations(path: &Path) -> Result<Vec<StationInfo>, LoadError> {
    let mut stations = Vec::new();
    for (row, cells) in read_rows(path)?.into_iter().enumerate() {
        if cells.len() != 5 {
            return Err(LoadError::FieldCount {
                path: display(path),
                line: row + 1,
                expected: 5,
                found: cells.len(),
            });
        }
        let id = parse_i64(&cells[0], path, row + 1)?;
        if id != row as i64 {
            return Err(LoadError::StationIdMismatch { row, found: id });
        }
        let line_id = parse_i64(&cells[1], path, row + 1)?;
        let term0 = parse_i64(&cells[2], path, row + 1)? != 0;
        let term1 = parse_i64(&cells[3], path, row + 1)? != 0;
        let transfer = parse_i64(&cells[4], path, row + 1)? != 0;
        stations.push(StationInfo {
            line: line_id as u32,
            is_terminal: [term0, term1],
            is_transfer: transfer,
        });
    }
    Ok(stations)
}

fn load_int_matrix(path: &Path, table: &'static str, n: usize) -> Result<Vec<Vec<i8>>, LoadError> {
    let rows = read_rows(path)?;
    if rows.len() != n {
        return Err(LoadError::Shape { table, expected: n, rows: rows.len(), cols: 0 });
    }
    let mut matrix = Vec::with_capacity(n);
    for (i, cells) in rows.into_iter().enumerate() {
        if cells.len() != n {
            return Err(LoadError::Shape { table, expected: n, rows: n, cols: cells.len() });
        }
        let mut row = Vec::with_capacity(n);
        for cell in &cells {
            let value = parse_i64(cell, path, i + 1)?;
            let value = i8::try_from(value).map_err(|_| LoadError::Parse {
                path: display(path),
                line: i + 1,
                value: cell.clone(),
            })?;
            row.push(value);
        }
        matrix.push(row);
    }
    Ok(matrix)
}

fn load_count_matrix(path: &Path, n: usize) -> Result<Vec<Vec<usize>>, LoadError> {
    let rows = read_rows(path)?;
    if rows.len() != n {
        return Err(LoadError::Shape { table: "policyNum", expected: n, rows: rows.len(), cols: 0 });
    }
    let mut matrix = Vec::with_capacity(n);
    for (i, cells) in rows.into_iter().enumerate() {
        if cells.len() != n {
            return Err(LoadError::Shape { table: "policyNum", expected: n, rows: n, cols: cells.len() });
        }
        let mut row = Vec::with_capacity(n);
        for cell in &cells {
            let count = parse_i64(cell, path, i + 1)?;
            row.push(count.max(0) as usize);
        }
        matrix.push(row);
    }
    Ok(matrix)
}

fn load_float_matrix(path: &Path, n: usize) -> Result<Vec<Vec<f64>>, LoadError> {
    let rows = read_rows(path)?;
    if rows.len() != n {
        return Err(LoadError::Shape { table: "transferTime", expected: n, rows: rows.len(), cols: 0 });
    }
    let mut matrix = Vec::with_capacity(n);
    for (i, cells) in rows.into_iter().enumerate() {
        if cells.len() != n {
            return Err(LoadError::Shape { table: "transferTime", expected: n, rows: n, cols: cells.len() });
        }
        let mut row = Vec::with_capacity(n);
        for cell in &cells {
            row.push(parse_f64(cell, path, i + 1)?);
        }
        matrix.push(row);
    }
    Ok(matrix)
}

/// Fold `policy.csv` and `policyNum.csv` into the ragged candidate table.
fn load_policy(
    path: &Path,
    policy_num: &[Vec<usize>],
    n: usize,
    max_policy_num: usize,
) -> Result<Vec<Vec<Vec<usize>>>, LoadError> {
    let rows = read_rows(path)?;
    if rows.len() != n * n {
        return Err(LoadError::Shape { table: "policy", expected: n * n, rows: rows.len(), cols: 0 });
    }

    let mut policy = vec![vec![Vec::new(); n]; n];
    for (index, cells) in rows.into_iter().enumerate() {
        let from = index / n;
        let to = index % n;
        let declared = policy_num[from][to];
        if declared > max_policy_num {
            return Err(LoadError::TooManyCandidates {
                from,
                to,
                found: declared,
                max: max_policy_num,
            });
        }
        if declared > cells.len() {
            return Err(LoadError::PolicyHole { from, to });
        }
        let mut candidates = Vec::with_capacity(declared);
        for cell in cells.iter().take(declared) {
            let station = parse_i64(cell, path, index + 1)?;
            if station < 0 {
                return Err(LoadError::PolicyHole { from, to });
            }
            candidates.push(station as usize);
        }
        policy[from][to] = candidates;
    }
    Ok(policy)
}

/// Zip the parallel arrival-time / arrival-station streams into per-train
/// stop lists.
fn load_schedules(times_path: &Path, stations_path: &Path) -> Result<Vec<TrainSchedule>, LoadError> {
    let time_rows = read_ragged_rows(times_path)?;
    let station_rows = read_ragged_rows(stations_path)?;
    if time_rows.len() != station_rows.len() {
        return Err(LoadError::StreamMismatch {
            train: time_rows.len().min(station_rows.len()),
            times: time_rows.len(),
            stations: station_rows.len(),
        });
    }

    let mut schedules = Vec::with_capacity(time_rows.len());
    for (train, (times, stations)) in time_rows.iter().zip(&station_rows).enumerate() {
        if times.len() != stations.len() {
            return Err(LoadError::StreamMismatch {
                train,
                times: times.len(),
                stations: stations.len(),
            });
        }
        let mut stops = Vec::with_capacity(times.len());
        for (time_cell, station_cell) in times.iter().zip(stations) {
            let time = parse_f64(time_cell, times_path, train + 1)?;
            let station = parse_i64(station_cell, stations_path, train + 1)?;
            if station < 0 {
                return Err(LoadError::Parse {
                    path: display(stations_path),
                    line: train + 1,
                    value: station_cell.clone(),
                });
            }
            stops.push(ScheduledStop { time, station: station as usize });
        }
        schedules.push(TrainSchedule { stops });
    }
    Ok(schedules)
}

fn load_start_trains(path: &Path, default_capacity: u32) -> Result<Vec<StartTrain>, LoadError> {
    let mut start_trains = Vec::new();
    for (row, cells) in read_rows(path)?.into_iter().enumerate() {
        if cells.len() != 6 {
            return Err(LoadError::FieldCount {
                path: display(path),
                line: row + 1,
                expected: 6,
                found: cells.len(),
            });
        }
        let train_id = parse_i64(&cells[0], path, row + 1)?;
        let station = parse_i64(&cells[1], path, row + 1)?;
        let line = parse_i64(&cells[2], path, row + 1)?;
        let direction = parse_i64(&cells[3], path, row + 1)?;
        let capacity = parse_i64(&cells[4], path, row + 1)?;
        let start_time = parse_f64(&cells[5], path, row + 1)?;

        if train_id < 0 || station < 0 || line < 0 || !(0..=1).contains(&direction) {
            return Err(LoadError::BadStartTrain {
                row,
                reason: "negative id or direction outside {0, 1}".to_string(),
            });
        }
        let capacity = if capacity <= 0 { default_capacity } else { capacity as u32 };
        start_trains.push(StartTrain {
            train_id: train_id as usize,
            station: station as usize,
            line: line as u32,
            direction: direction as usize,
            capacity,
            start_time,
        });
    }
    Ok(start_trains)
}
