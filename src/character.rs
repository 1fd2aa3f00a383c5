//! The player character: movement, health and the behavior state machine.
//!
//! State priority each tick, highest first: dead > hurt > airborne >
//! walking > idle/long-idle. Idle escalates on wall-clock time since the
//! last movement input, independent of the animation cadence.

use tracing::debug;

use crate::audio::{AudioSink, Sound};
use crate::entities::{Animation, Body, Hitbox, Millis, Physical, Renderable};
use crate::input::KeyState;
use crate::physics::{self, JUMP_IMPULSE};

// ── Tuning ────────────────────────────────────────────────────────────────────

pub const CHARACTER_WIDTH: f32 = 100.0;
pub const CHARACTER_HEIGHT: f32 = 240.0;

/// The sprite sheet has generous air around the figure.
const CHARACTER_HITBOX: Hitbox = Hitbox {
    offset_x: 20.0,
    offset_y: 90.0,
    width: 60.0,
    height: 145.0,
};

/// Horizontal distance covered per movement tick (≈ 60 Hz).
pub const WALK_SPEED: f32 = 10.0;

/// Idle escalates to long-idle after this much time without movement input.
pub const LONG_IDLE_AFTER: Millis = 5000;

/// The hurt state lasts this long after the last hit.
pub const HURT_WINDOW: Millis = 500;

/// Energy lost per hit.
pub const HIT_DAMAGE: u32 = 5;

/// The camera leads the character by this many pixels.
pub const CAMERA_LEAD: f32 = 100.0;

const FRAME_TIME: Millis = 100;

const IDLE_FRAMES: &[&str] = &[
    "character/idle/1",
    "character/idle/2",
    "character/idle/3",
    "character/idle/4",
];
const LONG_IDLE_FRAMES: &[&str] = &[
    "character/long_idle/1",
    "character/long_idle/2",
    "character/long_idle/3",
    "character/long_idle/4",
];
const WALK_FRAMES: &[&str] = &[
    "character/walk/1",
    "character/walk/2",
    "character/walk/3",
    "character/walk/4",
    "character/walk/5",
    "character/walk/6",
];
const JUMP_FRAMES: &[&str] = &[
    "character/jump/1",
    "character/jump/2",
    "character/jump/3",
    "character/jump/4",
    "character/jump/5",
];
const HURT_FRAMES: &[&str] = &["character/hurt/1", "character/hurt/2", "character/hurt/3"];
const DEAD_FRAMES: &[&str] = &[
    "character/dead/1",
    "character/dead/2",
    "character/dead/3",
    "character/dead/4",
    "character/dead/5",
];

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharacterState {
    Idle,
    LongIdle,
    Walking,
    Jumping,
    Hurt,
    Dead,
}

#[derive(Clone, Debug)]
pub struct Character {
    pub body: Body,
    pub speed_y: f32,
    /// Health, always within `[0, 100]`; 0 means dead.
    pub energy: u32,
    pub last_hit: Option<Millis>,
    pub can_move: bool,
    pub invulnerable_until: Option<Millis>,
    pub state: CharacterState,
    /// Timestamp of the last movement input, for idle escalation.
    last_action: Millis,
    snoring: bool,
    walking: bool,
    anim: Animation,
    next_frame_at: Millis,
}

impl Character {
    pub fn new(now: Millis) -> Self {
        Character {
            body: Body::new(100.0, physics::GROUND_Y, CHARACTER_WIDTH, CHARACTER_HEIGHT)
                .with_hitbox(CHARACTER_HITBOX),
            speed_y: 0.0,
            energy: 100,
            last_hit: None,
            can_move: true,
            invulnerable_until: None,
            state: CharacterState::Idle,
            last_action: now,
            snoring: false,
            walking: false,
            anim: Animation::new(IDLE_FRAMES),
            next_frame_at: now,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn is_dead(&self) -> bool {
        self.energy == 0
    }

    pub fn is_hurt(&self, now: Millis) -> bool {
        self.last_hit
            .map_or(false, |t| now.saturating_sub(t) < HURT_WINDOW)
    }

    pub fn is_invulnerable(&self, now: Millis) -> bool {
        self.invulnerable_until.map_or(false, |t| now < t)
    }

    pub fn above_ground(&self) -> bool {
        physics::above_ground(self.body.y)
    }

    /// Standing on the ground line with the jump spent.
    pub fn grounded(&self) -> bool {
        !self.above_ground() && self.speed_y <= 0.0
    }

    pub fn facing_left(&self) -> bool {
        self.body.mirrored
    }

    /// Camera offset that keeps the character framed.
    pub fn camera_x(&self) -> f32 {
        -self.body.x + CAMERA_LEAD
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Take a hit: 5 energy, floored at 0. The hurt window only restarts
    /// while still alive; death itself is edge-triggered in `update`.
    pub fn hit(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.is_dead() {
            return;
        }
        self.energy = self.energy.saturating_sub(HIT_DAMAGE);
        if self.energy > 0 {
            self.last_hit = Some(now);
            audio.play(Sound::Hurt);
        }
    }

    pub fn jump(&mut self, audio: &mut dyn AudioSink) {
        self.speed_y = JUMP_IMPULSE;
        audio.play(Sound::Jump);
    }

    /// One 40 ms gravity step.
    pub fn apply_gravity(&mut self) {
        let (y, speed_y) = physics::ground_step(self.body.y, self.speed_y);
        self.body.y = y;
        self.speed_y = speed_y;
    }

    /// One movement + state tick (≈ 60 Hz). Reads the key map, clamps to
    /// `[0, end_x]`, escalates idle, and advances the animation on its own
    /// cadence.
    pub fn update(
        &mut self,
        keys: &KeyState,
        end_x: f32,
        now: Millis,
        audio: &mut dyn AudioSink,
    ) {
        self.walking = false;
        if self.can_move && !self.is_dead() {
            self.apply_input(keys, end_x, now, audio);
        }
        self.refresh_state(now, audio);
        if now >= self.next_frame_at {
            self.advance_frame();
            self.next_frame_at = now + FRAME_TIME;
        }
    }

    fn apply_input(&mut self, keys: &KeyState, end_x: f32, now: Millis, audio: &mut dyn AudioSink) {
        let mut moved = false;

        if keys.right && self.body.x < end_x {
            self.body.x = (self.body.x + WALK_SPEED).min(end_x);
            self.body.mirrored = false;
            self.walking = true;
            moved = true;
        } else if keys.left && self.body.x > 0.0 {
            self.body.x = (self.body.x - WALK_SPEED).max(0.0);
            self.body.mirrored = true;
            self.walking = true;
            moved = true;
        }

        if self.walking && self.grounded() {
            audio.play(Sound::Walking);
        }

        // A jump only starts from the ground.
        if (keys.up || keys.space) && self.grounded() {
            self.jump(audio);
            moved = true;
        }

        if moved {
            self.last_action = now;
        }
    }

    fn refresh_state(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        let next = if self.is_dead() {
            CharacterState::Dead
        } else if self.is_hurt(now) {
            CharacterState::Hurt
        } else if self.above_ground() {
            CharacterState::Jumping
        } else if self.walking {
            CharacterState::Walking
        } else if now.saturating_sub(self.last_action) >= LONG_IDLE_AFTER {
            CharacterState::LongIdle
        } else {
            CharacterState::Idle
        };

        // The snore loop starts exactly once on long-idle entry and stops
        // the moment anything else takes over.
        if next == CharacterState::LongIdle && !self.snoring {
            self.snoring = true;
            audio.start_loop(Sound::Snore);
        } else if next != CharacterState::LongIdle && self.snoring {
            self.snoring = false;
            audio.stop(Sound::Snore);
        }

        if next == CharacterState::Dead && self.state != CharacterState::Dead {
            debug!("character died");
            self.can_move = false;
        }

        self.state = next;
        self.anim.switch_to(match self.state {
            CharacterState::Idle => IDLE_FRAMES,
            CharacterState::LongIdle => LONG_IDLE_FRAMES,
            CharacterState::Walking => WALK_FRAMES,
            CharacterState::Jumping => JUMP_FRAMES,
            CharacterState::Hurt => HURT_FRAMES,
            CharacterState::Dead => DEAD_FRAMES,
        });
    }

    fn advance_frame(&mut self) {
        if self.state == CharacterState::Dead {
            // Play through once and hold the final frame.
            self.anim.advance_once();
        } else {
            self.anim.advance();
        }
    }
}

impl Physical for Character {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for Character {
    fn sprite(&self) -> Option<&'static str> {
        Some(self.anim.current())
    }
}
