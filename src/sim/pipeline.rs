use log::info;
use serde::Serialize;

use super::dispatch;
use super::script::Script;
use crate::clock::{Clock, ManualClock};
use crate::events::EngineEvent;
use crate::sequencer::{SequencePhase, SequenceState, StageSequencer};

/// Float slack when deciding whether an event time has been reached.
const DUE_SLACK: f64 = 1e-6;

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub frames: u64,
    /// Unscaled seconds simulated.
    pub elapsed: f64,
    pub state: SequenceState,
    pub slips_remaining: u32,
}

/// Replay `script` against `seq`, one fixed frame at a time.
///
/// Events due at or before the current time are delivered before the frame is
/// ticked. Every engine event is handed to `on_event` with the unscaled time
/// at which it was raised. The run stops at the script's end time or as soon
/// as the sequence completes.
pub fn run_script<F>(
    seq: &mut StageSequencer<Vec<EngineEvent>>,
    script: &Script,
    mut on_event: F,
) -> SimReport
where
    F: FnMut(f64, &EngineEvent),
{
    let end = script.end_time();
    let mut clock = ManualClock::new();
    let mut pending = script.events.iter().peekable();
    let mut frames = 0u64;

    let mut flush = |seq: &mut StageSequencer<Vec<EngineEvent>>, t: f64| {
        for ev in seq.sink_mut().drain(..) {
            on_event(t, &ev);
        }
    };

    seq.start();
    flush(seq, 0.0);

    loop {
        let now = clock.unscaled_now();
        while let Some(ev) = pending.next_if(|e| e.at() <= now + DUE_SLACK) {
            dispatch::deliver(ev, seq, &mut clock);
            flush(seq, ev.at());
        }
        if seq.phase() == SequencePhase::Completed || now + DUE_SLACK >= end {
            break;
        }
        let frame = clock.advance(script.frame);
        seq.tick(frame);
        frames += 1;
        flush(seq, clock.unscaled_now());
    }

    info!(
        "simulated {frames} frames ({:.2}s), sequence {:?}",
        clock.unscaled_now(),
        seq.phase()
    );
    SimReport {
        frames,
        elapsed: clock.unscaled_now(),
        state: seq.state().clone(),
        slips_remaining: seq.slip_budget().remaining(),
    }
}
