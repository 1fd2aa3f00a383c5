//! Input-collaborator types.
//!
//! The host owns raw key capture and debouncing; the core only ever reads an
//! already-resolved boolean map. `EdgeTrigger` turns a held key into a
//! single firing so auto-repeat cannot machine-gun one-shot actions.

/// Boolean key map written by the input layer each frame, read by the core.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub space: bool,
    /// The throw key (D).
    pub throw: bool,
}

/// Rising-edge detector: fires on the transition from released to held.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeTrigger {
    held: bool,
}

impl EdgeTrigger {
    /// Feed the current key state; returns `true` only on a fresh press.
    pub fn rising(&mut self, down: bool) -> bool {
        let fired = down && !self.held;
        self.held = down;
        fired
    }
}
