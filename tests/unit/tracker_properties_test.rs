//! Range tracker properties.
//!
//! Each test feeds a sequence of time samples through the pure tracker and
//! checks where narration would be triggered.

use vidscribe::descriptions::{DescriptionSegment, SegmentList};
use vidscribe::sync::{track, PlaybackState, Sample};

fn segments(ranges: &[(f64, f64, &str)]) -> SegmentList {
    SegmentList::from_segments(
        ranges
            .iter()
            .enumerate()
            .map(|(i, (start, end, text))| DescriptionSegment::new(i as u64, *text, *start, *end)),
    )
}

/// Sample events fed to the tracker.
enum Input {
    Time(f64),
    Seek(f64),
}

/// Run inputs through the tracker, returning the trigger at each time sample.
fn triggers(list: &SegmentList, inputs: &[Input]) -> Vec<(f64, Option<usize>)> {
    let mut state = PlaybackState::default();
    let mut out = Vec::new();

    for input in inputs {
        match input {
            Input::Time(time) => {
                let decision = track(
                    Sample {
                        time: *time,
                        surface_paused: true,
                        enabled: true,
                    },
                    list,
                    &state,
                );
                state = decision.state;
                out.push((*time, decision.trigger));
            }
            Input::Seek(time) => state = PlaybackState::idle_at(*time),
        }
    }

    out
}

fn times(values: &[f64]) -> Vec<Input> {
    values.iter().map(|t| Input::Time(*t)).collect()
}

#[test]
fn test_single_trigger_for_any_dwell_length() {
    let list = segments(&[(10.0, 30.0, "a")]);

    for dwell in 1..=20 {
        let samples: Vec<f64> = (0..dwell).map(|i| 10.0 + i as f64).collect();
        let fired = triggers(&list, &times(&samples))
            .into_iter()
            .filter(|(_, t)| t.is_some())
            .count();
        assert_eq!(fired, 1, "dwell of {} samples", dwell);
    }
}

#[test]
fn test_sub_second_samples_trigger_once() {
    let list = segments(&[(2.0, 4.0, "a")]);
    let samples: Vec<f64> = (0..40).map(|i| i as f64 * 0.25).collect();

    let fired: Vec<f64> = triggers(&list, &times(&samples))
        .into_iter()
        .filter_map(|(time, t)| t.map(|_| time))
        .collect();
    assert_eq!(fired, vec![2.0]);
}

#[test]
fn test_end_boundary_is_outside() {
    let list = segments(&[(3.0, 7.0, "a")]);

    let result = triggers(&list, &times(&[7.0]));
    assert_eq!(result, vec![(7.0, None)]);

    let result = triggers(&list, &times(&[3.0]));
    assert_eq!(result, vec![(3.0, Some(0))]);
}

#[test]
fn test_seek_makes_next_sample_eligible() {
    let list = segments(&[(0.0, 10.0, "a"), (10.0, 20.0, "b")]);

    for target in [0.0, 4.0, 9.0, 10.0, 15.0] {
        let inputs = vec![
            Input::Time(2.0),
            Input::Time(3.0),
            Input::Seek(target),
            Input::Time(target),
        ];
        let result = triggers(&list, &inputs);
        assert!(result[2].1.is_some(), "seek to {}", target);
    }
}

#[test]
fn test_scenario_adjacent_ranges() {
    let list = segments(&[(0.0, 5.0, "intro"), (5.0, 10.0, "scene one")]);
    let result = triggers(&list, &times(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]));

    let fired: Vec<(f64, usize)> = result
        .into_iter()
        .filter_map(|(time, t)| t.map(|i| (time, i)))
        .collect();
    assert_eq!(fired, vec![(0.0, 0), (5.0, 1)]);
}

#[test]
fn test_scenario_gap() {
    let list = segments(&[(10.0, 15.0, "a")]);
    let result = triggers(&list, &times(&[0.0, 5.0, 10.0, 12.0, 15.0, 20.0]));

    assert_eq!(
        result,
        vec![
            (0.0, None),
            (5.0, None),
            (10.0, Some(0)),
            (12.0, None),
            (15.0, None),
            (20.0, None),
        ]
    );
}

#[test]
fn test_scenario_seek_back_into_same_range() {
    let list = segments(&[(0.0, 5.0, "x")]);
    let inputs = vec![
        Input::Time(0.0),
        Input::Time(3.0),
        Input::Seek(1.0),
        Input::Time(1.0),
    ];

    assert_eq!(
        triggers(&list, &inputs),
        vec![(0.0, Some(0)), (3.0, None), (1.0, Some(0))]
    );
}

#[test]
fn test_unsorted_input_is_sorted() {
    let list = SegmentList::from_segments(vec![
        DescriptionSegment::new(2, "second", 20.0, 25.0),
        DescriptionSegment::new(1, "first", 5.0, 10.0),
    ]);

    let result = triggers(&list, &times(&[5.0, 20.0]));
    assert_eq!(result, vec![(5.0, Some(0)), (20.0, Some(1))]);
    assert_eq!(list.get(0).map(|s| s.id), Some(1));
}

#[test]
fn test_overlap_first_match_wins() {
    let list = segments(&[(0.0, 10.0, "long"), (5.0, 8.0, "short")]);

    let result = triggers(&list, &times(&[6.0]));
    assert_eq!(result, vec![(6.0, Some(0))]);
}

#[test]
fn test_never_triggers_while_narration_active() {
    let list = segments(&[(0.0, 3.0, "a"), (3.0, 6.0, "b"), (6.0, 9.0, "c")]);
    let mut state = PlaybackState::default();

    for i in 0..9 {
        let decision = track(
            Sample {
                time: i as f64,
                surface_paused: true,
                enabled: true,
            },
            &list,
            &state,
        );
        if decision.trigger.is_some() {
            // A trigger is only ever issued from a state it has just cleared.
            assert!(decision.state.narration_active);
            assert_ne!(state.active_range, decision.state.active_range);
        }
        state = decision.state;
    }
}
