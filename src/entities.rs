//! Shared entity model — pure data, no game logic.
//!
//! Every concrete game object (character, walkers, boss, collectibles,
//! thrown bottles) composes a [`Body`] and exposes it through the
//! [`Physical`] capability; things the render pass can draw additionally
//! implement [`Renderable`]. Collision always runs over hitbox edges, which
//! honour the optional per-entity override — sprite frames carry transparent
//! padding, so the collision box is normally smaller than the visual box.

/// Milliseconds on the injected game clock. The core never reads a system
/// clock; callers pass `now` into every update.
pub type Millis = u64;

// ── Hitbox / body ─────────────────────────────────────────────────────────────

/// Per-entity collision-box override, relative to the visual box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hitbox {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Position, visual size, facing and the optional hitbox override.
#[derive(Clone, Debug)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Draw the sprite horizontally flipped. Set when an entity faces away
    /// from its artwork's native direction.
    pub mirrored: bool,
    /// Collision box override; `None` means the full visual box collides.
    pub hitbox: Option<Hitbox>,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Body {
            x,
            y,
            width,
            height,
            mirrored: false,
            hitbox: None,
        }
    }

    pub fn with_hitbox(mut self, hitbox: Hitbox) -> Self {
        self.hitbox = Some(hitbox);
        self
    }

    // Hitbox edges. With non-negative sizes, right > left and bottom > top.

    pub fn left(&self) -> f32 {
        self.x + self.hitbox.map_or(0.0, |h| h.offset_x)
    }

    pub fn right(&self) -> f32 {
        self.left() + self.hitbox.map_or(self.width, |h| h.width)
    }

    pub fn top(&self) -> f32 {
        self.y + self.hitbox.map_or(0.0, |h| h.offset_y)
    }

    pub fn bottom(&self) -> f32 {
        self.top() + self.hitbox.map_or(self.height, |h| h.height)
    }
}

// ── Capability traits ─────────────────────────────────────────────────────────

/// Anything that occupies space and can collide.
pub trait Physical {
    fn body(&self) -> &Body;
}

/// Anything the render pass can draw. A `None` sprite is drawn as a silent
/// no-op, never an error.
pub trait Renderable: Physical {
    fn sprite(&self) -> Option<&'static str>;

    fn flipped(&self) -> bool {
        self.body().mirrored
    }
}

// ── Animation ─────────────────────────────────────────────────────────────────

/// A static frame-key table plus the current index. `advance` cycles,
/// `advance_once` runs the sequence a single time and then holds the last
/// frame, reporting completion.
#[derive(Clone, Debug)]
pub struct Animation {
    frames: &'static [&'static str],
    index: usize,
}

impl Animation {
    pub fn new(frames: &'static [&'static str]) -> Self {
        debug_assert!(!frames.is_empty());
        Animation { frames, index: 0 }
    }

    pub fn current(&self) -> &'static str {
        self.frames[self.index]
    }

    /// Step to the next frame, wrapping around.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.frames.len();
    }

    /// Step to the next frame without wrapping. Returns `true` once the last
    /// frame has been reached; further calls keep returning `true`.
    pub fn advance_once(&mut self) -> bool {
        if self.index + 1 < self.frames.len() {
            self.index += 1;
            false
        } else {
            true
        }
    }

    pub fn restart(&mut self) {
        self.index = 0;
    }

    /// Swap in a different frame table, restarting unless it is already the
    /// active one — calling this every tick must not stall the animation.
    pub fn switch_to(&mut self, frames: &'static [&'static str]) {
        if !std::ptr::eq(self.frames as *const _, frames as *const _) {
            self.frames = frames;
            self.index = 0;
        }
    }
}

// ── Status bars ───────────────────────────────────────────────────────────────

/// A HUD bar holding a percentage. The displayed sprite index is a bucketed
/// function of the percentage: 100 → 5, [80,100) → 4, [60,80) → 3,
/// [40,60) → 2, [20,40) → 1, [0,20) → 0.
#[derive(Clone, Debug)]
pub struct StatusBar {
    percentage: u32,
}

impl StatusBar {
    pub fn new(percentage: u32) -> Self {
        StatusBar {
            percentage: percentage.min(100),
        }
    }

    pub fn set_percentage(&mut self, percentage: u32) {
        self.percentage = percentage.min(100);
    }

    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    pub fn display_index(&self) -> usize {
        match self.percentage {
            100 => 5,
            80..=99 => 4,
            60..=79 => 3,
            40..=59 => 2,
            20..=39 => 1,
            _ => 0,
        }
    }
}
