//! The controller state machine.
//!
//! Two states, `ready` and `walk`, and three triggers. Transitions are
//! listed in [`TRANSITIONS`]; a trigger with no matching row is ignored.
//! Every transition goes through [`Controller::fire`], which plans the
//! side effects of entering the target state before committing, so a failed
//! scene selection leaves the machine exactly where it was.
//!
//! | from    | trigger         | to      |
//! |---------|-----------------|---------|
//! | `ready` | `button_press`  | `walk`  |
//! | `walk`  | `timer_expired` | `ready` |
//! | any     | `reset`         | `ready` |

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{debug, info};
use xwalk_library::AnimationLibrary;
use xwalk_types::{ALL_WALKS, ControllerState, EndScene, Message, PlayScene, WalkPlay};

use crate::error::ControllerError;

/// Events that drive the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// The physical or virtual button was pressed.
    ButtonPress,
    /// The scene timer ran out.
    TimerExpired,
    /// Unconditional return to `ready`.
    Reset,
}

impl Trigger {
    /// Wire name of the trigger.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ButtonPress => "button_press",
            Self::TimerExpired => "timer_expired",
            Self::Reset => "reset",
        }
    }
}

impl core::fmt::Display for Trigger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the transition table. `from: None` matches any state.
#[derive(Debug, Clone, Copy)]
struct Transition {
    trigger: Trigger,
    from: Option<ControllerState>,
    to: ControllerState,
}

/// The full transition table.
const TRANSITIONS: [Transition; 3] = [
    Transition {
        trigger: Trigger::ButtonPress,
        from: Some(ControllerState::Ready),
        to: ControllerState::Walk,
    },
    Transition {
        trigger: Trigger::TimerExpired,
        from: Some(ControllerState::Walk),
        to: ControllerState::Ready,
    },
    Transition {
        trigger: Trigger::Reset,
        from: None,
        to: ControllerState::Ready,
    },
];

/// Target state for `trigger` fired in `state`, if the table allows it.
pub fn next_state(state: ControllerState, trigger: Trigger) -> Option<ControllerState> {
    TRANSITIONS
        .iter()
        .find(|t| t.trigger == trigger && t.from.is_none_or(|from| from == state))
        .map(|t| t.to)
}

/// Destination for commands emitted on state entry.
pub trait ControlSink {
    /// Accept one outbound control message.
    fn emit(&mut self, message: Message);
}

impl ControlSink for Vec<Message> {
    fn emit(&mut self, message: Message) {
        self.push(message);
    }
}

/// What a call to [`Controller::fire`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// The state machine took a transition (possibly to the same state).
    Transitioned {
        /// State before the trigger.
        from: ControllerState,
        /// State after the trigger.
        to: ControllerState,
    },
    /// The trigger is not valid in the current state and was dropped.
    Ignored {
        /// The unchanged state.
        state: ControllerState,
    },
}

/// Side effects of entering a state, computed before committing.
enum Entry {
    Walk {
        scene: PlayScene,
        dequeued: bool,
    },
    Ready,
}

/// The controller: state machine, explicit walk queue, and play history.
#[derive(Debug)]
pub struct Controller {
    state: ControllerState,
    library: AnimationLibrary,
    walk_queue: VecDeque<String>,
    history: Vec<WalkPlay>,
}

impl Controller {
    /// A controller in the `ready` state.
    pub fn new(library: AnimationLibrary) -> Self {
        Self {
            state: ControllerState::Ready,
            library,
            walk_queue: VecDeque::new(),
            history: Vec::new(),
        }
    }

    /// Current state.
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// The animation library.
    pub const fn library(&self) -> &AnimationLibrary {
        &self.library
    }

    /// Explicitly queued walks, next first.
    pub fn walk_queue(&self) -> Vec<String> {
        self.walk_queue.iter().cloned().collect()
    }

    /// Every walk played since startup, oldest first.
    pub fn walk_history(&self) -> Vec<WalkPlay> {
        self.history.clone()
    }

    /// Queue a walk to play on a following button press.
    ///
    /// [`ALL_WALKS`] queues the whole catalogue in name order. Returns the
    /// number of walks added.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::UnknownWalk`] if `walk` is neither a
    /// catalogue entry nor [`ALL_WALKS`]; the queue is left unchanged.
    pub fn queue_walk(&mut self, walk: &str) -> Result<usize, ControllerError> {
        let added = if walk == ALL_WALKS {
            self.library.walk_names()
        } else if self.library.contains_walk(walk) {
            vec![walk.to_owned()]
        } else {
            return Err(ControllerError::UnknownWalk {
                walk: walk.to_owned(),
            });
        };
        let count = added.len();
        self.walk_queue.extend(added);
        info!(walk = walk, added = count, queued = self.walk_queue.len(), "walk queued");
        Ok(count)
    }

    /// Empty the walk queue, returning how many entries were removed.
    pub fn clear_queue(&mut self) -> usize {
        let removed = self.walk_queue.len();
        self.walk_queue.clear();
        info!(removed, "walk queue cleared");
        removed
    }

    /// Fire `trigger`, emitting any entry command into `sink`.
    ///
    /// Entering `walk` selects and times a scene, consuming the head of the
    /// walk queue if there is one, and emits [`Message::PlayScene`].
    /// Entering `ready` emits [`Message::EndScene`].
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Library`] if scene selection or timing
    /// fails. The state, queue, and history are then unchanged and nothing is
    /// emitted.
    pub fn fire(
        &mut self,
        trigger: Trigger,
        sink: &mut dyn ControlSink,
    ) -> Result<FireOutcome, ControllerError> {
        let from = self.state;
        let Some(to) = next_state(from, trigger) else {
            debug!(state = %from, trigger = %trigger, "trigger ignored");
            return Ok(FireOutcome::Ignored { state: from });
        };

        let entry = self.plan_entry(to)?;

        self.state = to;
        match entry {
            Entry::Walk { scene, dequeued } => {
                if dequeued {
                    self.walk_queue.pop_front();
                }
                self.record_play(&scene.walk);
                sink.emit(Message::PlayScene(scene));
            }
            Entry::Ready => sink.emit(Message::EndScene(EndScene {})),
        }
        info!(from = %from, to = %to, trigger = %trigger, "state changed");
        Ok(FireOutcome::Transitioned { from, to })
    }

    /// Shorthand for [`Trigger::ButtonPress`].
    ///
    /// # Errors
    ///
    /// See [`Controller::fire`].
    pub fn button_press(&mut self, sink: &mut dyn ControlSink) -> Result<FireOutcome, ControllerError> {
        self.fire(Trigger::ButtonPress, sink)
    }

    /// Shorthand for [`Trigger::TimerExpired`].
    ///
    /// # Errors
    ///
    /// See [`Controller::fire`].
    pub fn timer_expired(&mut self, sink: &mut dyn ControlSink) -> Result<FireOutcome, ControllerError> {
        self.fire(Trigger::TimerExpired, sink)
    }

    /// Shorthand for [`Trigger::Reset`].
    ///
    /// # Errors
    ///
    /// See [`Controller::fire`].
    pub fn reset(&mut self, sink: &mut dyn ControlSink) -> Result<FireOutcome, ControllerError> {
        self.fire(Trigger::Reset, sink)
    }

    fn plan_entry(&mut self, to: ControllerState) -> Result<Entry, ControllerError> {
        match to {
            ControllerState::Ready => Ok(Entry::Ready),
            ControllerState::Walk => {
                let queued = self.walk_queue.front().cloned();
                let dequeued = queued.is_some();
                let (selection, durations) = self.library.select_timed_sequence(queued)?;
                info!(
                    intro = %selection.intro,
                    walk = %selection.walk,
                    outro = %selection.outro,
                    intro_duration = durations.intro,
                    walk_duration = durations.walk,
                    outro_duration = durations.outro,
                    total_duration = durations.total(),
                    from_queue = dequeued,
                    "scene selected"
                );
                Ok(Entry::Walk {
                    scene: PlayScene {
                        intro: selection.intro,
                        walk: selection.walk,
                        outro: selection.outro,
                        intro_duration: durations.intro,
                        walk_duration: durations.walk,
                        outro_duration: durations.outro,
                        total_duration: durations.total(),
                    },
                    dequeued,
                })
            }
        }
    }

    fn record_play(&mut self, walk: &str) {
        self.history.push(WalkPlay {
            played_at: Utc::now(),
            walk: walk.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use ControllerState::{Ready, Walk};
        assert_eq!(next_state(Ready, Trigger::ButtonPress), Some(Walk));
        assert_eq!(next_state(Walk, Trigger::ButtonPress), None);
        assert_eq!(next_state(Walk, Trigger::TimerExpired), Some(Ready));
        assert_eq!(next_state(Ready, Trigger::TimerExpired), None);
        assert_eq!(next_state(Ready, Trigger::Reset), Some(Ready));
        assert_eq!(next_state(Walk, Trigger::Reset), Some(Ready));
    }

    #[test]
    fn trigger_names_match_wire_tags() {
        assert_eq!(Trigger::ButtonPress.to_string(), "button_press");
        assert_eq!(Trigger::TimerExpired.as_str(), "timer_expired");
        assert_eq!(Trigger::Reset.as_str(), "reset");
    }
}
