//! Static network tables.
//!
//! Everything here is read-only once constructed: station records, the
//! direction matrix, the precomputed routing policy, transfer walking times,
//! per-train stop streams, and the start-train table. A [`Network`] is
//! typically wrapped in an `Arc` and shared across many concurrently running
//! [`Simulation`](crate::Simulation) instances for parallel episode rollouts.
//!
//! Construction goes through [`Network::from_parts`], which validates every
//! cross-reference eagerly; the CSV loader in [`loader`] feeds it. A network
//! that constructs successfully cannot cause an out-of-range table lookup
//! during a run.

mod loader;

pub use loader::LoadError;

use serde::{Deserialize, Serialize};

/// Static attributes of one logical station.
///
/// A physical interchange appears as several logical stations, one per
/// incident line, related through the transfer-time matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationInfo {
    /// Line this logical station belongs to.
    pub line: u32,
    /// Whether the station ends the line in direction 0 / 1.
    pub is_terminal: [bool; 2],
    /// Whether arriving trains must reconsider onboard passengers here.
    pub is_transfer: bool,
}

/// One precomputed stop of a train's terminal-to-terminal run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledStop {
    /// Arrival time at `station`, seconds since midnight.
    pub time: f64,
    /// Station reached at `time`.
    pub station: usize,
}

/// The remaining stops of a train after its starting station, consumed by a
/// per-train cursor during the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainSchedule {
    pub stops: Vec<ScheduledStop>,
}

/// Initial state of one train, re-instantiated at every episode reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartTrain {
    /// Index into the schedule table; unique per terminal-to-terminal run.
    pub train_id: usize,
    /// Station where the run begins.
    pub station: usize,
    /// Line the train serves.
    pub line: u32,
    /// Travel sense along the line, 0 or 1.
    pub direction: usize,
    /// Nominal seat count.
    pub capacity: u32,
    /// Arrival time at the starting station.
    pub start_time: f64,
}

/// The complete static description of the rail network.
///
/// Indexed throughout by dense station ids in `[0, N)` and train ids in
/// `[0, T)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    stations: Vec<StationInfo>,
    /// `directions[i][j]` ∈ {-1, 0, 1}: travel sense from `i` to `j` when
    /// they sit on one line, else -1.
    directions: Vec<Vec<i8>>,
    /// Ragged next-hop candidates: `policy[i][j]` holds the equally optimal
    /// next stations from `i` toward `j`; the list length is the stored
    /// candidate count.
    policy: Vec<Vec<Vec<usize>>>,
    /// Walking seconds between logical stations of one interchange; negative
    /// means no transfer relationship.
    transfer_time: Vec<Vec<f64>>,
    schedules: Vec<TrainSchedule>,
    start_trains: Vec<StartTrain>,
}

impl Network {
    /// Assemble and validate a network from its tables.
    ///
    /// `max_policy_num` bounds the candidate lists, matching the storage
    /// contract of the policy CSV.
    ///
    /// # Errors
    ///
    /// Any dimension mismatch, out-of-range id, direction outside
    /// {-1, 0, 1}, oversized candidate list, non-finite transfer time, or
    /// non-monotone stop stream is rejected; the engine refuses to run on
    /// inconsistent data.
    pub fn from_parts(
        stations: Vec<StationInfo>,
        directions: Vec<Vec<i8>>,
        policy: Vec<Vec<Vec<usize>>>,
        transfer_time: Vec<Vec<f64>>,
        schedules: Vec<TrainSchedule>,
        start_trains: Vec<StartTrain>,
        max_policy_num: usize,
    ) -> Result<Self, LoadError> {
        let n = stations.len();
        if n == 0 {
            return Err(LoadError::EmptyStationTable);
        }

        Self::check_square("directions", n, directions.len(), |i| directions[i].len())?;
        for (i, row) in directions.iter().enumerate() {
            for (j, &d) in row.iter().enumerate() {
                if !(-1..=1).contains(&d) {
                    return Err(LoadError::BadDirection { from: i, to: j, value: d });
                }
            }
        }

        Self::check_square("policy", n, policy.len(), |i| policy[i].len())?;
        for (i, row) in policy.iter().enumerate() {
            for (j, candidates) in row.iter().enumerate() {
                if candidates.len() > max_policy_num {
                    return Err(LoadError::TooManyCandidates {
                        from: i,
                        to: j,
                        found: candidates.len(),
                        max: max_policy_num,
                    });
                }
                for &next in candidates {
                    if next >= n {
                        return Err(LoadError::StationRange { station: next, total: n });
                    }
                }
            }
        }

        Self::check_square("transferTime", n, transfer_time.len(), |i| transfer_time[i].len())?;
        for row in &transfer_time {
            for &t in row {
                if !t.is_finite() {
                    return Err(LoadError::NonFiniteTransferTime);
                }
            }
        }

        for (train_id, schedule) in schedules.iter().enumerate() {
            let mut last = f64::NEG_INFINITY;
            for stop in &schedule.stops {
                if stop.station >= n {
                    return Err(LoadError::StationRange { station: stop.station, total: n });
                }
                if !stop.time.is_finite() || stop.time < last {
                    return Err(LoadError::UnorderedStops { train: train_id });
                }
                last = stop.time;
            }
        }

        for (row, start) in start_trains.iter().enumerate() {
            if start.station >= n {
                return Err(LoadError::StationRange { station: start.station, total: n });
            }
            if start.direction > 1 {
                return Err(LoadError::BadStartTrain {
                    row,
                    reason: format!("direction {} is not 0 or 1", start.direction),
                });
            }
            if start.capacity == 0 {
                return Err(LoadError::BadStartTrain {
                    row,
                    reason: "capacity must be positive".to_string(),
                });
            }
            if !start.start_time.is_finite() || start.start_time < 0.0 {
                return Err(LoadError::BadStartTrain {
                    row,
                    reason: format!("start time {} is invalid", start.start_time),
                });
            }
            if start.train_id >= schedules.len() {
                return Err(LoadError::TrainRange {
                    train: start.train_id,
                    total: schedules.len(),
                });
            }
            if let Some(first) = schedules[start.train_id].stops.first() {
                if first.time < start.start_time {
                    return Err(LoadError::BadStartTrain {
                        row,
                        reason: format!(
                            "first scheduled stop at {} precedes start time {}",
                            first.time, start.start_time
                        ),
                    });
                }
            }
        }

        Ok(Self {
            stations,
            directions,
            policy,
            transfer_time,
            schedules,
            start_trains,
        })
    }

    fn check_square(
        name: &'static str,
        n: usize,
        rows: usize,
        row_len: impl Fn(usize) -> usize,
    ) -> Result<(), LoadError> {
        if rows != n {
            return Err(LoadError::Shape { table: name, expected: n, rows, cols: 0 });
        }
        for i in 0..rows {
            if row_len(i) != n {
                return Err(LoadError::Shape { table: name, expected: n, rows, cols: row_len(i) });
            }
        }
        Ok(())
    }

    /// Number of logical stations.
    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    /// Static record of one station.
    pub fn station(&self, id: usize) -> &StationInfo {
        &self.stations[id]
    }

    /// All station records, in id order.
    pub fn stations(&self) -> &[StationInfo] {
        &self.stations
    }

    /// Line a station belongs to.
    pub fn line_of(&self, station: usize) -> u32 {
        self.stations[station].line
    }

    /// Travel sense from `from` to `to` when both sit on one line;
    /// `None` when the table holds the -1 sentinel.
    pub fn direction_between(&self, from: usize, to: usize) -> Option<usize> {
        match self.directions[from][to] {
            -1 => None,
            d => Some(d as usize),
        }
    }

    /// Equally optimal next hops from `from` toward `to`.
    pub fn candidates(&self, from: usize, to: usize) -> &[usize] {
        &self.policy[from][to]
    }

    /// Walking seconds from `from` to `to` within one interchange.
    ///
    /// `Some(0.0)` is a cross-platform transfer; `Some(t)` with `t > 0` a
    /// walked one. `None` means the stations are unrelated; conversely,
    /// `Some(_)` marks `to` as an acceptable terminal point for passengers
    /// bound for `to` who alight at `from`.
    pub fn transfer_time(&self, from: usize, to: usize) -> Option<f64> {
        let t = self.transfer_time[from][to];
        if t < 0.0 {
            None
        } else {
            Some(t)
        }
    }

    /// Number of scheduled trains.
    pub fn num_trains(&self) -> usize {
        self.schedules.len()
    }

    /// Remaining-stop stream of one train.
    pub fn schedule(&self, train_id: usize) -> &TrainSchedule {
        &self.schedules[train_id]
    }

    /// Start-train table, one row per episode train.
    pub fn start_trains(&self) -> &[StartTrain] {
        &self.start_trains
    }
}
