mod common;

use click_pilot::motion::smooth_move_to;
use common::{MockInput, RecordingSleeper};
use std::time::Duration;

#[test]
fn zero_distance_issues_no_updates() {
    let mock = MockInput::at(100, 100);
    let sleeper = RecordingSleeper::default();

    smooth_move_to(&mut mock.clone(), &sleeper, 100, 100).unwrap();

    assert!(mock.moves().is_empty());
    assert!(sleeper.sleeps().is_empty());
}

#[test]
fn long_move_lands_exactly_on_the_target() {
    let mock = MockInput::at(0, 0);
    let sleeper = RecordingSleeper::default();

    smooth_move_to(&mut mock.clone(), &sleeper, 500, 0).unwrap();

    let moves = mock.moves();
    // 500px / 20px-per-step, inside the documented 10..=50 envelope.
    assert_eq!(moves.len(), 25);
    assert!((10..=50).contains(&moves.len()));
    assert_eq!(*moves.last().unwrap(), (500, 0));
    assert_eq!(mock.position(), (500, 0));
}

#[test]
fn short_move_is_padded_to_the_minimum_step_count() {
    let mock = MockInput::at(10, 10);
    let sleeper = RecordingSleeper::default();

    smooth_move_to(&mut mock.clone(), &sleeper, 15, 10).unwrap();

    let moves = mock.moves();
    assert_eq!(moves.len(), 10);
    assert_eq!(*moves.last().unwrap(), (15, 10));
}

#[test]
fn very_long_move_is_capped_at_the_maximum_step_count() {
    let mock = MockInput::at(0, 0);
    let sleeper = RecordingSleeper::default();

    smooth_move_to(&mut mock.clone(), &sleeper, 2000, 1500).unwrap();

    let moves = mock.moves();
    assert_eq!(moves.len(), 50);
    assert_eq!(*moves.last().unwrap(), (2000, 1500));
}

#[test]
fn inter_step_delays_stay_inside_the_speed_envelope() {
    let mock = MockInput::at(0, 0);
    let sleeper = RecordingSleeper::default();

    smooth_move_to(&mut mock.clone(), &sleeper, 400, 300).unwrap();

    let moves = mock.moves();
    let sleeps = sleeper.sleeps();
    // One delay between each pair of updates, none after the last.
    assert_eq!(sleeps.len(), moves.len() - 1);
    for sleep in sleeps {
        // 5ms * [0.3, 1.0] * [1.0, 1.5]
        assert!(sleep >= Duration::from_secs_f64(0.0015));
        assert!(sleep <= Duration::from_secs_f64(0.0075));
    }
}

#[test]
fn repeated_runs_always_converge() {
    // Jitter and twitches are random; convergence must not be.
    for _ in 0..20 {
        let mock = MockInput::at(37, 91);
        let sleeper = RecordingSleeper::default();
        smooth_move_to(&mut mock.clone(), &sleeper, 420, 137).unwrap();
        assert_eq!(mock.position(), (420, 137));
    }
}
