//! Boarding boundaries and malformed-run surfaces at the engine level.

mod common;

use std::sync::Arc;

use common::{config_with_horizon, single_line};
use transit_simulator_core_rs::{
    Event, Network, ScheduledStop, Simulation, SimulationError, StartTrain, StationInfo,
    TrainSchedule,
};

#[test]
fn cohort_matching_capacity_boards_whole() {
    let network = single_line(&[(0.0, 60.0, 40)]);
    let mut sim = Simulation::new(network, config_with_horizon(120.0)).unwrap();

    sim.add_passengers(0, 1, 40).unwrap();
    let report = sim.run().unwrap();

    assert_eq!(report.num_arrived, 40);
    assert_eq!(sim.get_station_waiting_passengers(0, 0), Some(0));
}

#[test]
fn oversized_cohort_fills_the_train_and_keeps_its_place() {
    let network = single_line(&[(0.0, 60.0, 30)]);
    let mut sim = Simulation::new(network, config_with_horizon(400.0)).unwrap();

    sim.add_passengers(0, 1, 50).unwrap();
    sim.add_passengers(0, 1, 8).unwrap();
    sim.add_event(61.0, Event::Suspend).unwrap();

    sim.run().unwrap();
    // The split head (20 left of the first cohort) still precedes the
    // later cohort of 8.
    let head: Vec<(usize, u32)> = sim
        .station(0)
        .cohorts(0)
        .map(|c| (c.destination, c.count))
        .collect();
    assert_eq!(head, vec![(1, 20), (1, 8)]);
    assert_eq!(sim.get_station_waiting_passengers(0, 0), Some(28));
    assert_eq!(sim.report().num_arrived, 30);
}

#[test]
fn several_cohorts_board_fifo_across_destinations() {
    // Three stations on one line; cohorts for 1 and 2 interleave and must
    // board in arrival order, never regrouped by destination.
    let stations = vec![
        StationInfo { line: 0, is_terminal: [false, true], is_transfer: false },
        StationInfo { line: 0, is_terminal: [false, false], is_transfer: false },
        StationInfo { line: 0, is_terminal: [true, false], is_transfer: false },
    ];
    let mut directions = vec![vec![-1i8; 3]; 3];
    directions[0][1] = 0;
    directions[1][0] = 1;
    directions[1][2] = 0;
    directions[2][1] = 1;
    let mut policy = vec![vec![Vec::new(); 3]; 3];
    policy[0][1] = vec![1];
    policy[0][2] = vec![1];
    policy[1][2] = vec![2];
    let transfer_time = vec![vec![-1.0; 3]; 3];
    let schedules = vec![TrainSchedule {
        stops: vec![
            ScheduledStop { time: 60.0, station: 1 },
            ScheduledStop { time: 120.0, station: 2 },
        ],
    }];
    let start_trains = vec![StartTrain {
        train_id: 0,
        station: 0,
        line: 0,
        direction: 0,
        capacity: 25,
        start_time: 0.0,
    }];
    let network = Arc::new(
        Network::from_parts(stations, directions, policy, transfer_time, schedules, start_trains, 4)
            .unwrap(),
    );

    let mut sim = Simulation::new(network, config_with_horizon(300.0)).unwrap();
    sim.add_passengers(0, 2, 10).unwrap();
    sim.add_passengers(0, 1, 10).unwrap();
    sim.add_passengers(0, 2, 10).unwrap();

    let report = sim.run().unwrap();
    // Capacity 25 takes the first two cohorts and 5 of the third; the
    // tail of 5 bound for 2 stays behind.
    assert_eq!(report.num_arrived, 25);
    assert_eq!(sim.get_station_waiting_passengers(0, 0), Some(5));
}

#[test]
fn passengers_stranded_at_a_terminal_abort_the_episode() {
    // Destination 2 sits on another line, but station 1 is not a transfer
    // station, so nobody reclassifies the riders before the terminal.
    let stations = vec![
        StationInfo { line: 0, is_terminal: [false, true], is_transfer: false },
        StationInfo { line: 0, is_terminal: [true, false], is_transfer: false },
        StationInfo { line: 1, is_terminal: [true, true], is_transfer: false },
    ];
    let mut directions = vec![vec![-1i8; 3]; 3];
    directions[0][1] = 0;
    directions[1][0] = 1;
    let mut policy = vec![vec![Vec::new(); 3]; 3];
    policy[0][1] = vec![1];
    policy[0][2] = vec![1]; // data defect: dead-ends at station 1
    let transfer_time = vec![vec![-1.0; 3]; 3];
    let schedules = vec![TrainSchedule {
        stops: vec![ScheduledStop { time: 60.0, station: 1 }],
    }];
    let start_trains = vec![StartTrain {
        train_id: 0,
        station: 0,
        line: 0,
        direction: 0,
        capacity: 100,
        start_time: 0.0,
    }];
    let network = Arc::new(
        Network::from_parts(stations, directions, policy, transfer_time, schedules, start_trains, 4)
            .unwrap(),
    );

    let mut sim = Simulation::new(network, config_with_horizon(200.0)).unwrap();
    sim.add_passengers(0, 2, 7).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(
        err,
        SimulationError::PassengersAtTerminal { train: 0, station: 1, count: 7 }
    ));
}

#[test]
fn exhausted_stop_stream_at_a_non_terminal_is_fatal() {
    let stations = vec![
        StationInfo { line: 0, is_terminal: [false, true], is_transfer: false },
        StationInfo { line: 0, is_terminal: [true, false], is_transfer: false },
    ];
    let mut directions = vec![vec![-1i8; 2]; 2];
    directions[0][1] = 0;
    directions[1][0] = 1;
    let mut policy = vec![vec![Vec::new(); 2]; 2];
    policy[0][1] = vec![1];
    let transfer_time = vec![vec![-1.0; 2]; 2];
    // Train starts at the non-terminal station with no stops recorded.
    let schedules = vec![TrainSchedule::default()];
    let start_trains = vec![StartTrain {
        train_id: 0,
        station: 0,
        line: 0,
        direction: 0,
        capacity: 100,
        start_time: 0.0,
    }];
    let network = Arc::new(
        Network::from_parts(stations, directions, policy, transfer_time, schedules, start_trains, 4)
            .unwrap(),
    );

    let mut sim = Simulation::new(network, config_with_horizon(200.0)).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(
        err,
        SimulationError::ScheduleExhausted { train: 0, station: 0 }
    ));
}
