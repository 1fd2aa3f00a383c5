//! World orchestration: the session aggregate that owns every entity, runs
//! the fixed-rate passes and mediates all cross-entity interaction.
//!
//! `update` is the single authoritative tick. Per call (≈ 60 Hz) it runs
//! movement and animation; on a 40 ms cadence it integrates gravity; on a
//! 200 ms cadence it resolves collisions, pickups and the boss trigger.
//! Removal is two-phase: interactions only mark entities, `compact` drops
//! them at the end of the same update, so nothing mutates a collection
//! while it is being iterated.

use rand::Rng;
use tracing::info;

use crate::audio::{AudioSink, Sound};
use crate::character::Character;
use crate::collision;
use crate::enemies::{Boss, Enemy, Walker, BOSS_HIT_POINTS};
use crate::entities::{Animation, Body, Hitbox, Millis, Physical, Renderable, StatusBar};
use crate::input::{EdgeTrigger, KeyState};
use crate::level::{self, Level, BOTTLE_COUNT, BOTTLE_SPACING, COIN_COUNT, COIN_SPACING};
use crate::physics::{self, GRAVITY_PERIOD};

// ── Tuning ────────────────────────────────────────────────────────────────────

/// Period of the collision/trigger pass.
pub const SIM_TICK_PERIOD: Millis = 200;

/// The boss encounter triggers once the character first reaches this x.
pub const BOSS_TRIGGER_X: f32 = 2800.0;

/// Stomping grants the character this much invulnerability — long enough
/// for the walker's death sound to play out.
pub const STOMP_INVULNERABILITY: Millis = 500;

/// Minimum time between throws.
pub const THROW_COOLDOWN: Millis = 1000;

/// Splashed bottles linger this long before compaction.
pub const SPLASH_CLEANUP: Millis = 500;

/// A flying bottle whose top reaches this y has hit the ground.
const THROW_GROUND_Y: f32 = 373.0;

const THROW_IMPULSE: f32 = 15.0;
const THROW_DRIFT: f32 = 7.0;

const CLOUD_DRIFT: f32 = 0.25;

const BOTTLE_FRAME_TIME: Millis = 80;

const SPIN_FRAMES: &[&str] = &[
    "bottle/spin/1",
    "bottle/spin/2",
    "bottle/spin/3",
    "bottle/spin/4",
];
const SPLASH_FRAMES: &[&str] = &[
    "bottle/splash/1",
    "bottle/splash/2",
    "bottle/splash/3",
    "bottle/splash/4",
];

// ── Collectibles ──────────────────────────────────────────────────────────────

/// The coin sprite is mostly glow; only the disc in the middle collides.
#[derive(Clone, Debug)]
pub struct Coin {
    pub body: Body,
    pub collected: bool,
}

impl Coin {
    pub fn new(x: f32, y: f32) -> Self {
        Coin {
            body: Body::new(x, y, 100.0, 100.0).with_hitbox(Hitbox {
                offset_x: 35.0,
                offset_y: 35.0,
                width: 30.0,
                height: 30.0,
            }),
            collected: false,
        }
    }
}

impl Physical for Coin {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for Coin {
    fn sprite(&self) -> Option<&'static str> {
        Some("coin/idle")
    }
}

#[derive(Clone, Debug)]
pub struct BottlePickup {
    pub body: Body,
    pub collected: bool,
}

impl BottlePickup {
    pub fn new(x: f32) -> Self {
        BottlePickup {
            body: Body::new(x, 353.0, 60.0, 80.0).with_hitbox(Hitbox {
                offset_x: 15.0,
                offset_y: 10.0,
                width: 30.0,
                height: 60.0,
            }),
            collected: false,
        }
    }
}

impl Physical for BottlePickup {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for BottlePickup {
    fn sprite(&self) -> Option<&'static str> {
        Some("bottle/ground")
    }
}

// ── Thrown bottles ────────────────────────────────────────────────────────────

/// A bottle in flight: spins while airborne, splashes on an enemy or the
/// ground, then lingers briefly for the splash animation.
#[derive(Clone, Debug)]
pub struct ThrownBottle {
    pub body: Body,
    pub speed_y: f32,
    splashed_at: Option<Millis>,
    anim: Animation,
    next_frame_at: Millis,
}

impl ThrownBottle {
    pub fn launch(x: f32, y: f32, mirrored: bool, now: Millis) -> Self {
        let mut body = Body::new(x, y, 50.0, 60.0);
        body.mirrored = mirrored;
        ThrownBottle {
            body,
            speed_y: THROW_IMPULSE,
            splashed_at: None,
            anim: Animation::new(SPIN_FRAMES),
            next_frame_at: now,
        }
    }

    pub fn splashed(&self) -> bool {
        self.splashed_at.is_some()
    }

    /// The splash has played out; compact this bottle away.
    pub fn expired(&self, now: Millis) -> bool {
        self.splashed_at
            .map_or(false, |t| now.saturating_sub(t) >= SPLASH_CLEANUP)
    }

    pub fn splash(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.splashed() {
            return;
        }
        self.splashed_at = Some(now);
        self.speed_y = 0.0;
        self.anim.switch_to(SPLASH_FRAMES);
        audio.play(Sound::Splash);
    }

    /// One movement tick: drift along the throw direction while airborne.
    pub fn update(&mut self, now: Millis) {
        if !self.splashed() {
            self.body.x += if self.body.mirrored {
                -THROW_DRIFT
            } else {
                THROW_DRIFT
            };
        }
        if now >= self.next_frame_at {
            if self.splashed() {
                self.anim.advance_once();
            } else {
                self.anim.advance();
            }
            self.next_frame_at = now + BOTTLE_FRAME_TIME;
        }
    }

    /// One 40 ms gravity step. Thrown bottles are always airborne; only the
    /// splash clears them out of the integration.
    pub fn apply_gravity(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.splashed() {
            return;
        }
        let (y, speed_y) = physics::integrate(self.body.y, self.speed_y);
        self.body.y = y;
        self.speed_y = speed_y;
        if self.body.y >= THROW_GROUND_Y {
            self.body.y = THROW_GROUND_Y;
            self.splash(now, audio);
        }
    }
}

impl Physical for ThrownBottle {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for ThrownBottle {
    fn sprite(&self) -> Option<&'static str> {
        Some(self.anim.current())
    }
}

// ── Clouds ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Cloud {
    pub body: Body,
}

impl Cloud {
    pub fn new(x: f32) -> Self {
        Cloud {
            body: Body::new(x, 20.0, 500.0, 100.0),
        }
    }

    fn drift(&mut self, end_x: f32) {
        self.body.x -= CLOUD_DRIFT;
        if self.body.x + self.body.width < -100.0 {
            self.body.x = end_x;
        }
    }
}

impl Physical for Cloud {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for Cloud {
    fn sprite(&self) -> Option<&'static str> {
        Some("cloud/1")
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

pub struct World {
    pub character: Character,
    /// The boss is built eagerly but stays out of `enemies` (and inert)
    /// until the encounter triggers.
    pub boss: Option<Boss>,
    pub level: Level,
    pub enemies: Vec<Enemy>,
    pub coins: Vec<Coin>,
    pub bottle_pickups: Vec<BottlePickup>,
    pub thrown: Vec<ThrownBottle>,
    pub clouds: Vec<Cloud>,

    pub health_bar: StatusBar,
    pub coin_bar: StatusBar,
    pub bottle_bar: StatusBar,
    pub boss_bar: StatusBar,

    pub camera_x: f32,
    pub paused: bool,
    pub muted: bool,
    pub coins_collected: u32,
    pub bottles_held: u32,
    pub boss_engaged: bool,

    outcome: Option<Outcome>,
    movement_restored: bool,
    soundtrack_started: bool,
    last_throw: Option<Millis>,
    throw_edge: EdgeTrigger,
    next_sim_tick: Millis,
    next_gravity: Millis,
}

impl World {
    pub fn new(level: Level, rng: &mut impl Rng, now: Millis) -> Self {
        let character = Character::new(now);
        let boss = Boss::new(level.boss_anchor_x, level.boss_walk_radius, now);
        let enemies = level
            .walker_spawns
            .iter()
            .map(|&(kind, x)| Enemy::Walker(Walker::new(kind, x, rng, now)))
            .collect();
        let coins = level::scatter(
            rng,
            COIN_COUNT,
            level::SCATTER_MIN_X,
            level::SCATTER_MAX_X,
            COIN_SPACING,
        )
        .into_iter()
        .map(|x| Coin::new(x, rng.gen_range(150.0..280.0)))
        .collect();
        let bottle_pickups = level::scatter(
            rng,
            BOTTLE_COUNT,
            level::SCATTER_MIN_X,
            level::SCATTER_MAX_X,
            BOTTLE_SPACING,
        )
        .into_iter()
        .map(BottlePickup::new)
        .collect();
        let clouds = level.cloud_xs.iter().map(|&x| Cloud::new(x)).collect();

        let camera_x = character.camera_x();
        World {
            character,
            boss: Some(boss),
            level,
            enemies,
            coins,
            bottle_pickups,
            thrown: Vec::new(),
            clouds,
            health_bar: StatusBar::new(100),
            coin_bar: StatusBar::new(0),
            bottle_bar: StatusBar::new(0),
            boss_bar: StatusBar::new(100),
            camera_x,
            paused: false,
            muted: false,
            coins_collected: 0,
            bottles_held: 0,
            boss_engaged: false,
            outcome: None,
            movement_restored: false,
            soundtrack_started: false,
            last_throw: None,
            throw_edge: EdgeTrigger::default(),
            next_sim_tick: now + SIM_TICK_PERIOD,
            next_gravity: now + GRAVITY_PERIOD,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// The coins-collected display string for the host UI.
    pub fn coin_summary(&self) -> String {
        format!(
            "You have collected {} / {} coins!",
            self.coins_collected, COIN_COUNT
        )
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn toggle_mute(&mut self, audio: &mut dyn AudioSink) {
        self.muted = !self.muted;
        audio.set_muted(self.muted);
    }

    /// One update of the whole session. `now` is the injected game clock;
    /// the host calls this once per frame (≈ 60 Hz).
    pub fn update(&mut self, keys: &KeyState, now: Millis, audio: &mut dyn AudioSink) {
        if !self.soundtrack_started {
            self.soundtrack_started = true;
            audio.start_loop(Sound::Soundtrack);
            info!("session started");
        }
        if self.paused {
            return;
        }

        // The edge detector must see the key every frame, held is not
        // pressed — but a press only throws while the game is live.
        let throw_pressed = self.throw_edge.rising(keys.throw);

        self.character.update(keys, self.level.end_x, now, audio);
        self.camera_x = self.character.camera_x();
        if self.outcome.is_none() {
            self.try_throw(throw_pressed, now, audio);
        }

        self.restore_movement_after_entrance(now);

        for enemy in self.enemies.iter_mut() {
            enemy.update(now);
        }
        for bottle in self.thrown.iter_mut() {
            bottle.update(now);
        }
        let end_x = self.level.end_x;
        for cloud in self.clouds.iter_mut() {
            cloud.drift(end_x);
        }

        if now >= self.next_gravity {
            self.character.apply_gravity();
            for bottle in self.thrown.iter_mut() {
                bottle.apply_gravity(now, audio);
            }
            self.next_gravity = now + GRAVITY_PERIOD;
        }

        if self.outcome.is_none() && now >= self.next_sim_tick {
            self.simulation_tick(now, audio);
            self.next_sim_tick = now + SIM_TICK_PERIOD;
        }

        // Losing is edge-triggered the first update the character is dead.
        if self.character.is_dead() && self.outcome.is_none() {
            self.outcome = Some(Outcome::Lost);
            audio.stop(Sound::Soundtrack);
            audio.stop(Sound::BossTheme);
            audio.play(Sound::Lose);
            info!("character defeated");
        }

        self.compact(now, audio);
    }

    // ── Simulation tick ──────────────────────────────────────────────────────

    fn simulation_tick(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        self.check_boss_trigger(now, audio);

        // Character against every live enemy. A stomp kills a walker
        // without hurting the character even though the same overlap would
        // also register as a touch.
        for enemy in self.enemies.iter_mut() {
            if enemy.is_dead() || !collision::overlaps(&self.character, enemy) {
                continue;
            }
            let stomp = matches!(enemy, Enemy::Walker(_))
                && collision::is_stomp(&self.character, self.character.speed_y, enemy);
            if stomp {
                let enemy_top = enemy.body().top();
                if let Enemy::Walker(walker) = enemy {
                    walker.die(now, audio);
                }
                // Land the character's hitbox bottom on the enemy's top.
                let reach = self.character.body.bottom() - self.character.body.y;
                self.character.body.y = enemy_top - reach;
                self.character.speed_y = 0.0;
                self.character.invulnerable_until = Some(now + STOMP_INVULNERABILITY);
            } else if !self.character.is_invulnerable(now) {
                if let Enemy::Boss(boss) = enemy {
                    boss.attack(now, audio);
                }
                self.character.hit(now, audio);
                self.health_bar.set_percentage(self.character.energy);
            }
        }

        // Every live bottle against every live enemy.
        for bottle in self.thrown.iter_mut() {
            if bottle.splashed() {
                continue;
            }
            for enemy in self.enemies.iter_mut() {
                if enemy.is_dead() || !collision::overlaps(bottle, enemy) {
                    continue;
                }
                bottle.splash(now, audio);
                match enemy {
                    Enemy::Walker(walker) => walker.die(now, audio),
                    Enemy::Boss(boss) => {
                        if boss.hit(now, audio) {
                            self.boss_bar
                                .set_percentage(boss.hit_points * 100 / BOSS_HIT_POINTS);
                        }
                    }
                }
                break;
            }
        }

        // Pickups, once per tick against the character.
        for coin in self.coins.iter_mut() {
            if coin.collected || !collision::overlaps(&self.character, coin) {
                continue;
            }
            coin.collected = true;
            self.coins_collected += 1;
            self.coin_bar
                .set_percentage(self.coins_collected * 100 / COIN_COUNT as u32);
            audio.play(Sound::CoinPickup);
        }
        for pickup in self.bottle_pickups.iter_mut() {
            if pickup.collected || !collision::overlaps(&self.character, pickup) {
                continue;
            }
            pickup.collected = true;
            self.bottles_held += 1;
            self.bottle_bar.set_percentage(self.bottles_held * 20);
            audio.play(Sound::BottlePickup);
        }
    }

    /// One-shot: the first time the character reaches the threshold, freeze
    /// movement, swap the music and bring the boss into play.
    fn check_boss_trigger(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        if self.boss_engaged || self.character.body.x < BOSS_TRIGGER_X {
            return;
        }
        self.boss_engaged = true;
        self.character.can_move = false;
        audio.stop(Sound::Soundtrack);
        audio.start_loop(Sound::BossTheme);
        if let Some(mut boss) = self.boss.take() {
            boss.engage(now);
            self.enemies.push(Enemy::Boss(boss));
        }
        info!(x = self.character.body.x as f64, "boss encounter triggered");
    }

    fn restore_movement_after_entrance(&mut self, now: Millis) {
        if !self.boss_engaged
            || self.movement_restored
            || self.outcome.is_some()
            || self.character.is_dead()
        {
            return;
        }
        let entrance_done = self
            .enemies
            .iter()
            .any(|e| matches!(e, Enemy::Boss(b) if b.entrance_done(now)));
        if entrance_done {
            self.character.can_move = true;
            self.movement_restored = true;
        }
    }

    fn try_throw(&mut self, pressed: bool, now: Millis, audio: &mut dyn AudioSink) {
        if !pressed || self.bottles_held == 0 || self.character.is_dead() {
            return;
        }
        if self
            .last_throw
            .map_or(false, |t| now.saturating_sub(t) < THROW_COOLDOWN)
        {
            return;
        }
        self.last_throw = Some(now);
        self.bottles_held -= 1;
        self.bottle_bar.set_percentage(self.bottles_held * 20);
        let mirrored = self.character.facing_left();
        let x = self.character.body.x + if mirrored { -20.0 } else { 60.0 };
        let y = self.character.body.y + 100.0;
        self.thrown.push(ThrownBottle::launch(x, y, mirrored, now));
        audio.play(Sound::Throw);
    }

    /// Drop everything marked for removal this update. The boss leaving the
    /// collection after its death settle is the win condition.
    fn compact(&mut self, now: Millis, audio: &mut dyn AudioSink) {
        self.coins.retain(|c| !c.collected);
        self.bottle_pickups.retain(|b| !b.collected);
        self.thrown.retain(|t| !t.expired(now));

        let mut boss_defeated = false;
        self.enemies.retain(|enemy| match enemy {
            Enemy::Walker(w) => !w.removal_due(now),
            Enemy::Boss(b) => {
                if b.finished(now) {
                    boss_defeated = true;
                    false
                } else {
                    true
                }
            }
        });

        if boss_defeated && self.outcome.is_none() {
            self.outcome = Some(Outcome::Won);
            self.character.can_move = false;
            audio.stop(Sound::BossTheme);
            audio.play(Sound::Win);
            info!("boss defeated");
        }
    }
}
