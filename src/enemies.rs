//! Enemy behavior: ground walkers and the boss.
//!
//! Walkers have two states, alive-walking and dead. The boss is a
//! three-state machine (walk ↔ hurt ↔ dead) with an invulnerability window
//! while hurt; its patrol and animation drivers are inert outside their
//! state and stop permanently once it is dead.

use rand::Rng;
use tracing::debug;

use crate::audio::{AudioSink, Sound};
use crate::entities::{Animation, Body, Hitbox, Millis, Physical, Renderable};

// ── Ground walkers ────────────────────────────────────────────────────────────

/// Walker speed range, px per movement tick.
pub const WALKER_SPEED_MIN: f32 = 0.15;
pub const WALKER_SPEED_SPREAD: f32 = 0.3;

/// Dead walkers stay on screen this long so the death sprite and sound can
/// play out.
pub const WALKER_REMOVAL_DELAY: Millis = 500;

/// Visual bottom edge shared by everything standing on the ground.
const GROUND_LINE: f32 = 433.0;

const WALKER_FRAME_TIME: Millis = 150;

const HEN_WALK_FRAMES: &[&str] = &["hen/walk/1", "hen/walk/2", "hen/walk/3"];
const HEN_DEAD_FRAMES: &[&str] = &["hen/dead"];
const CHICK_WALK_FRAMES: &[&str] = &["chick/walk/1", "chick/walk/2", "chick/walk/3"];
const CHICK_DEAD_FRAMES: &[&str] = &["chick/dead"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkerKind {
    Hen,
    Chick,
}

#[derive(Clone, Debug)]
pub struct Walker {
    pub body: Body,
    pub kind: WalkerKind,
    pub speed: f32,
    dead_since: Option<Millis>,
    anim: Animation,
    next_frame_at: Millis,
}

impl Walker {
    pub fn new(kind: WalkerKind, x: f32, rng: &mut impl Rng, now: Millis) -> Self {
        let (width, height, hitbox) = match kind {
            WalkerKind::Hen => (
                70.0,
                60.0,
                Hitbox {
                    offset_x: 5.0,
                    offset_y: 8.0,
                    width: 60.0,
                    height: 48.0,
                },
            ),
            WalkerKind::Chick => (
                50.0,
                40.0,
                Hitbox {
                    offset_x: 3.0,
                    offset_y: 5.0,
                    width: 44.0,
                    height: 33.0,
                },
            ),
        };
        Walker {
            body: Body::new(x, GROUND_LINE - height, width, height).with_hitbox(hitbox),
            kind,
            speed: WALKER_SPEED_MIN + rng.gen::<f32>() * WALKER_SPEED_SPREAD,
            dead_since: None,
            anim: Animation::new(match kind {
                WalkerKind::Hen => HEN_WALK_FRAMES,
                WalkerKind::Chick => CHICK_WALK_FRAMES,
            }),
            next_frame_at: now,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead_since.is_some()
    }

    /// The death sprite and sound have played out; compact this walker away.
    pub fn removal_due(&self, now: Millis) -> bool {
        self.dead_since
            .map_or(false, |t| now.saturating_sub(t) >= WALKER_REMOVAL_DELAY)
    }

    /// Kill the walker: motion and animation stop immediately, the death
    /// sprite freezes, the death sound plays once. Idempotent — a second
    /// call must not restart the sound or reschedule removal.
    pub fn die(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.is_dead() {
            return;
        }
        self.dead_since = Some(now);
        self.speed = 0.0;
        self.anim.switch_to(match self.kind {
            WalkerKind::Hen => HEN_DEAD_FRAMES,
            WalkerKind::Chick => CHICK_DEAD_FRAMES,
        });
        audio.play(Sound::WalkerDeath);
    }

    /// One movement tick: amble left while alive.
    pub fn update(&mut self, now: Millis) {
        if self.is_dead() {
            return;
        }
        self.body.x -= self.speed;
        if now >= self.next_frame_at {
            self.anim.advance();
            self.next_frame_at = now + WALKER_FRAME_TIME;
        }
    }
}

impl Physical for Walker {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for Walker {
    fn sprite(&self) -> Option<&'static str> {
        Some(self.anim.current())
    }
}

// ── Boss ──────────────────────────────────────────────────────────────────────

pub const BOSS_HIT_POINTS: u32 = 3;
pub const BOSS_WIDTH: f32 = 250.0;
pub const BOSS_HEIGHT: f32 = 300.0;

/// Patrol speed, px per movement tick.
const BOSS_WALK_SPEED: f32 = 1.2;

/// Stride speed while entering the arena.
const BOSS_ENTRANCE_SPEED: f32 = 2.5;

/// The entrance sequence; character movement is re-enabled when it ends.
pub const BOSS_ENTRANCE_TIME: Millis = 1500;

const BOSS_WALK_FRAME_TIME: Millis = 200;
const BOSS_HURT_FRAME_TIME: Millis = 100;
const BOSS_DEATH_FRAME_TIME: Millis = 350;

/// Grace after the hurt sequence before the boss walks again.
const BOSS_HURT_GRACE: Millis = 100;

/// Settle after the death sequence before removal and the win signal.
const BOSS_DEATH_SETTLE: Millis = 500;

const BOSS_ATTACK_TIME: Millis = 400;

const BOSS_HITBOX: Hitbox = Hitbox {
    offset_x: 30.0,
    offset_y: 70.0,
    width: 190.0,
    height: 215.0,
};

const BOSS_ALERT_FRAMES: &[&str] = &[
    "boss/alert/1",
    "boss/alert/2",
    "boss/alert/3",
    "boss/alert/4",
];
const BOSS_WALK_FRAMES: &[&str] = &["boss/walk/1", "boss/walk/2", "boss/walk/3", "boss/walk/4"];
const BOSS_ATTACK_FRAMES: &[&str] = &[
    "boss/attack/1",
    "boss/attack/2",
    "boss/attack/3",
    "boss/attack/4",
];
const BOSS_HURT_FRAMES: &[&str] = &["boss/hurt/1", "boss/hurt/2", "boss/hurt/3"];
const BOSS_DEAD_FRAMES: &[&str] = &["boss/dead/1", "boss/dead/2", "boss/dead/3"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BossState {
    Walking,
    Hurt,
    Dead,
}

#[derive(Clone, Debug)]
pub struct Boss {
    pub body: Body,
    pub hit_points: u32,
    pub state: BossState,
    pub invulnerable: bool,
    anchor_x: f32,
    walk_radius: f32,
    moving_left: bool,
    engaged_at: Option<Millis>,
    /// Set once the hurt sequence has fully played; recovery happens here.
    recover_at: Option<Millis>,
    /// Set once the death sequence has fully played; removal happens here.
    remove_at: Option<Millis>,
    attacking_until: Option<Millis>,
    anim: Animation,
    next_frame_at: Millis,
}

impl Boss {
    pub fn new(anchor_x: f32, walk_radius: f32, now: Millis) -> Self {
        Boss {
            body: Body::new(anchor_x, GROUND_LINE - BOSS_HEIGHT, BOSS_WIDTH, BOSS_HEIGHT)
                .with_hitbox(BOSS_HITBOX),
            hit_points: BOSS_HIT_POINTS,
            state: BossState::Walking,
            invulnerable: false,
            anchor_x,
            walk_radius,
            moving_left: true,
            engaged_at: None,
            recover_at: None,
            remove_at: None,
            attacking_until: None,
            anim: Animation::new(BOSS_ALERT_FRAMES),
            next_frame_at: now,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == BossState::Dead
    }

    /// Wake the inert boss when the encounter triggers.
    pub fn engage(&mut self, now: Millis) {
        self.engaged_at = Some(now);
        self.next_frame_at = now;
    }

    pub fn entrance_done(&self, now: Millis) -> bool {
        self.engaged_at
            .map_or(false, |t| now.saturating_sub(t) >= BOSS_ENTRANCE_TIME)
    }

    fn entering(&self, now: Millis) -> bool {
        self.engaged_at.is_some() && !self.entrance_done(now)
    }

    /// A hit is accepted only while walking and vulnerable. Returns whether
    /// it landed; the third accepted hit goes straight to `die`.
    pub fn hit(&mut self, now: Millis, audio: &mut dyn AudioSink) -> bool {
        if self.state != BossState::Walking || self.invulnerable {
            return false;
        }
        self.hit_points -= 1;
        debug!(hit_points = self.hit_points, "boss hit");
        if self.hit_points == 0 {
            self.die(now, audio);
        } else {
            self.state = BossState::Hurt;
            self.invulnerable = true;
            self.recover_at = None;
            self.anim.switch_to(BOSS_HURT_FRAMES);
            self.next_frame_at = now + BOSS_HURT_FRAME_TIME;
            audio.play(Sound::BossHurt);
        }
        true
    }

    /// Enter the death state exactly once; takes precedence over any pending
    /// hurt recovery.
    pub fn die(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.is_dead() {
            return;
        }
        debug!("boss died");
        self.state = BossState::Dead;
        self.invulnerable = true;
        self.attacking_until = None;
        self.anim.switch_to(BOSS_DEAD_FRAMES);
        self.next_frame_at = now + BOSS_DEATH_FRAME_TIME;
        audio.play(Sound::BossDeath);
    }

    /// Contact attack against the character: animation and sound only; the
    /// damage itself goes through `Character::hit`.
    pub fn attack(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.state != BossState::Walking {
            return;
        }
        self.attacking_until = Some(now + BOSS_ATTACK_TIME);
        audio.play(Sound::BossAttack);
    }

    /// Death sequence and settle delay have both elapsed; the world removes
    /// the boss and signals the win.
    pub fn finished(&self, now: Millis) -> bool {
        self.remove_at.map_or(false, |t| now >= t)
    }

    /// One movement tick. Inert until engaged; the animation driver stops
    /// scheduling for good once the death sequence has settled.
    pub fn update(&mut self, now: Millis) {
        if self.engaged_at.is_none() {
            return;
        }
        match self.state {
            BossState::Walking => {
                self.patrol(now);
                if now >= self.next_frame_at {
                    self.anim.switch_to(self.walk_frames(now));
                    self.anim.advance();
                    self.next_frame_at = now + BOSS_WALK_FRAME_TIME;
                }
            }
            BossState::Hurt => {
                if now >= self.next_frame_at && self.recover_at.is_none() {
                    if self.anim.advance_once() {
                        self.recover_at = Some(now + BOSS_HURT_GRACE);
                    }
                    self.next_frame_at = now + BOSS_HURT_FRAME_TIME;
                }
                // Recovery — unless `die` superseded it meanwhile.
                if let Some(t) = self.recover_at {
                    if now >= t && self.state == BossState::Hurt {
                        self.state = BossState::Walking;
                        self.invulnerable = false;
                        self.anim.switch_to(BOSS_WALK_FRAMES);
                    }
                }
            }
            BossState::Dead => {
                if self.remove_at.is_none() && now >= self.next_frame_at {
                    if self.anim.advance_once() {
                        self.remove_at = Some(now + BOSS_DEATH_SETTLE);
                    }
                    self.next_frame_at = now + BOSS_DEATH_FRAME_TIME;
                }
            }
        }
    }

    fn walk_frames(&self, now: Millis) -> &'static [&'static str] {
        if self.attacking_until.map_or(false, |t| now < t) {
            BOSS_ATTACK_FRAMES
        } else if self.entering(now) {
            BOSS_ALERT_FRAMES
        } else {
            BOSS_WALK_FRAMES
        }
    }

    fn patrol(&mut self, now: Millis) {
        if self.entering(now) {
            // Stride into the arena toward the character.
            self.body.x -= BOSS_ENTRANCE_SPEED;
            self.body.mirrored = false;
            return;
        }
        if self.moving_left {
            self.body.x -= BOSS_WALK_SPEED;
            if self.body.x <= self.anchor_x - self.walk_radius {
                self.moving_left = false;
            }
        } else {
            self.body.x += BOSS_WALK_SPEED;
            if self.body.x >= self.anchor_x {
                self.moving_left = true;
            }
        }
        // Artwork faces left; flip while patrolling back to the right.
        self.body.mirrored = !self.moving_left;
    }
}

impl Physical for Boss {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for Boss {
    fn sprite(&self) -> Option<&'static str> {
        Some(self.anim.current())
    }
}

// ── Heterogeneous enemy collection ────────────────────────────────────────────

/// Tagged variant for the world's enemy list; the boss joins it when the
/// encounter triggers.
#[derive(Clone, Debug)]
pub enum Enemy {
    Walker(Walker),
    Boss(Boss),
}

impl Enemy {
    pub fn is_dead(&self) -> bool {
        match self {
            Enemy::Walker(w) => w.is_dead(),
            Enemy::Boss(b) => b.is_dead(),
        }
    }

    pub fn update(&mut self, now: Millis) {
        match self {
            Enemy::Walker(w) => w.update(now),
            Enemy::Boss(b) => b.update(now),
        }
    }
}

impl Physical for Enemy {
    fn body(&self) -> &Body {
        match self {
            Enemy::Walker(w) => &w.body,
            Enemy::Boss(b) => &b.body,
        }
    }
}

impl Renderable for Enemy {
    fn sprite(&self) -> Option<&'static str> {
        match self {
            Enemy::Walker(w) => w.sprite(),
            Enemy::Boss(b) => b.sprite(),
        }
    }
}
