#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure controls system that turns held buttons into per-tick player input.

use stagehop_core::{Event, HeldButtons, InputFrame};

/// Tracks button state between ticks so discrete actions fire once per press.
#[derive(Debug)]
pub struct Controls {
    previous: HeldButtons,
    player_alive: bool,
}

impl Controls {
    /// Consumes world events and the currently held buttons to produce the next tick's input.
    ///
    /// Walking and fast fall follow the held buttons directly. Jump, warp and fire
    /// only appear on the call where their button goes down. A freshly loaded stage
    /// waits for every button to be released before accepting new presses, and a
    /// dead player receives neutral input until the next stage loads.
    pub fn handle(&mut self, events: &[Event], held: HeldButtons) -> InputFrame {
        for event in events {
            match event {
                Event::StageLoaded { .. } => {
                    self.previous = Self::latched();
                    self.player_alive = true;
                }
                Event::PlayerDied => self.player_alive = false,
                _ => {}
            }
        }

        let previous = self.previous;
        self.previous = held;
        if !self.player_alive {
            return InputFrame::default();
        }

        InputFrame {
            move_left: held.left,
            move_right: held.right,
            fast_fall: held.fast_fall,
            jump: held.jump && !previous.jump,
            warp: held.warp && !previous.warp,
            fire: held.fire && !previous.fire,
        }
    }

    const fn latched() -> HeldButtons {
        HeldButtons {
            left: true,
            right: true,
            fast_fall: true,
            jump: true,
            warp: true,
            fire: true,
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            previous: HeldButtons::default(),
            player_alive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_mirrors_held_buttons() {
        let mut controls = Controls::default();
        let held = HeldButtons {
            left: true,
            fast_fall: true,
            ..HeldButtons::default()
        };
        let first = controls.handle(&[], held);
        let second = controls.handle(&[], held);
        assert!(first.move_left && second.move_left);
        assert!(first.fast_fall && second.fast_fall);
        assert!(!second.move_right);
    }
}
