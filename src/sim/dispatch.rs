use log::debug;

use super::script::ScriptEvent;
use crate::clock::ManualClock;
use crate::events::EventSink;
use crate::input::{InputEvent, PointerSample};
use crate::sequencer::StageSequencer;

/// Map a script entry to engine input; `None` for host-side entries.
pub fn to_input(ev: &ScriptEvent) -> Option<InputEvent> {
    Some(match *ev {
        ScriptEvent::Down { at, x, y } => InputEvent::PointerDown(PointerSample::new(x, y, at)),
        ScriptEvent::Move { at, x, y } => InputEvent::PointerMove(PointerSample::new(x, y, at)),
        ScriptEvent::Up { at, x, y } => InputEvent::PointerUp(PointerSample::new(x, y, at)),
        ScriptEvent::Click { at } => InputEvent::Click { t: at },
        ScriptEvent::TimeScale { .. } => return None,
    })
}

pub fn deliver<S: EventSink>(ev: &ScriptEvent, seq: &mut StageSequencer<S>, clock: &mut ManualClock) {
    match ev {
        ScriptEvent::TimeScale { at, scale } => {
            debug!("time scale -> {scale} at {at:.2}");
            clock.set_time_scale(*scale);
        }
        other => {
            if let Some(input) = to_input(other) {
                seq.handle_input(input);
            }
        }
    }
}
