//! Shared builders for small in-memory test networks.

use std::sync::Arc;

use transit_simulator_core_rs::{
    Network, ScheduledStop, SimulationConfig, StartTrain, StationInfo, TrainSchedule,
};

/// Config with service from t=0 and the given horizon.
pub fn config_with_horizon(simulation_end_time: f64) -> SimulationConfig {
    SimulationConfig {
        start_time: 0.0,
        simulation_end_time,
        ..SimulationConfig::default()
    }
}

/// A single line with two stations 0 → 1 and the given trains.
///
/// Each train is `(start_time, arrival_time_at_1, capacity)`.
pub fn single_line(trains: &[(f64, f64, u32)]) -> Arc<Network> {
    let stations = vec![
        StationInfo { line: 0, is_terminal: [false, true], is_transfer: false },
        StationInfo { line: 0, is_terminal: [true, false], is_transfer: false },
    ];
    let mut directions = vec![vec![-1i8; 2]; 2];
    directions[0][1] = 0;
    directions[1][0] = 1;
    let mut policy = vec![vec![Vec::new(); 2]; 2];
    policy[0][1] = vec![1];
    policy[1][0] = vec![0];
    let transfer_time = vec![vec![-1.0; 2]; 2];

    let mut schedules = Vec::new();
    let mut start_trains = Vec::new();
    for (id, &(start_time, arrival, capacity)) in trains.iter().enumerate() {
        schedules.push(TrainSchedule {
            stops: vec![ScheduledStop { time: arrival, station: 1 }],
        });
        start_trains.push(StartTrain {
            train_id: id,
            station: 0,
            line: 0,
            direction: 0,
            capacity,
            start_time,
        });
    }

    Arc::new(
        Network::from_parts(stations, directions, policy, transfer_time, schedules, start_trains, 4)
            .unwrap(),
    )
}

/// Two lines joined at an interchange: 0 → 1 on line 0, 2 → 3 on line 1,
/// with logical stations 1 and 2 belonging to the same physical complex.
///
/// * `interchange_walk`: walking seconds from 1 to 2 (0.0 for
///   cross-platform).
/// * `exit_walk_to_3`: when set, station 1 counts as an acceptable
///   terminal for passengers bound for 3, reached by this walk.
///
/// Train 0 runs 0 → 1 (start t=0, arrive t=60); train 1 runs 2 → 3
/// (start t=120, arrive t=180). Capacity 300 each.
pub fn interchange_line(interchange_walk: f64, exit_walk_to_3: Option<f64>) -> Arc<Network> {
    let stations = vec![
        StationInfo { line: 0, is_terminal: [false, true], is_transfer: false },
        StationInfo { line: 0, is_terminal: [true, false], is_transfer: true },
        StationInfo { line: 1, is_terminal: [false, true], is_transfer: true },
        StationInfo { line: 1, is_terminal: [true, false], is_transfer: false },
    ];
    let mut directions = vec![vec![-1i8; 4]; 4];
    directions[0][1] = 0;
    directions[1][0] = 1;
    directions[2][3] = 0;
    directions[3][2] = 1;

    let mut policy = vec![vec![Vec::new(); 4]; 4];
    policy[0][1] = vec![1];
    policy[0][3] = vec![1]; // ride line 0 to the interchange first
    policy[1][3] = vec![2]; // then walk to line 1
    policy[2][3] = vec![3];

    let mut transfer_time = vec![vec![-1.0; 4]; 4];
    transfer_time[1][2] = interchange_walk;
    transfer_time[2][1] = interchange_walk;
    if let Some(walk) = exit_walk_to_3 {
        transfer_time[1][3] = walk;
        transfer_time[3][1] = walk;
    }

    let schedules = vec![
        TrainSchedule { stops: vec![ScheduledStop { time: 60.0, station: 1 }] },
        TrainSchedule { stops: vec![ScheduledStop { time: 180.0, station: 3 }] },
    ];
    let start_trains = vec![
        StartTrain { train_id: 0, station: 0, line: 0, direction: 0, capacity: 300, start_time: 0.0 },
        StartTrain { train_id: 1, station: 2, line: 1, direction: 0, capacity: 300, start_time: 120.0 },
    ];

    Arc::new(
        Network::from_parts(stations, directions, policy, transfer_time, schedules, start_trains, 4)
            .unwrap(),
    )
}
