//! Property tests for the controller invariants.

use framegen_timing::{AdaptiveTimingController, PresentClock};
use proptest::prelude::*;
use quickcheck_macros::quickcheck;
use std::time::{Duration, Instant};

proptest! {
    #[test]
    fn prop_knobs_stay_in_range(samples in prop::collection::vec(0.0f32..40.0, 1..300)) {
        let controller = AdaptiveTimingController::new(8.0, 0.5, 0.5, false, None);
        for ms in samples {
            let verdict = controller.on_frame_complete(ms);
            prop_assert!((0.25..=1.0).contains(&verdict.scale));
            prop_assert!((0.0..=1.0).contains(&verdict.quality));
        }
    }

    #[test]
    fn prop_streaks_are_exclusive(samples in prop::collection::vec(0.0f32..20.0, 1..200)) {
        let controller = AdaptiveTimingController::new(8.0, 0.5, 0.5, false, None);
        for ms in samples {
            controller.on_frame_complete(ms);
            let state = controller.state();
            prop_assert!(state.consecutive_over == 0 || state.consecutive_under == 0);
        }
    }
}

#[quickcheck]
fn clock_deadlines_are_evenly_spaced(interval_us: u16, ticks: u8) -> bool {
    let interval = Duration::from_micros(u64::from(interval_us) + 1);
    let start = Instant::now();
    let mut clock = PresentClock::starting_at(start, interval);
    for _ in 0..ticks {
        clock.advance();
    }
    clock.next_deadline() == start + interval * (u32::from(ticks) + 1)
}
