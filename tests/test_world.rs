mod common;

use canyon_run::audio::{NullAudio, Sound};
use canyon_run::enemies::{Boss, Enemy, Walker, WalkerKind};
use canyon_run::input::KeyState;
use canyon_run::level::{level_one, COIN_COUNT, COIN_SPACING};
use canyon_run::world::{Outcome, ThrownBottle, World, BOSS_TRIGGER_X};
use canyon_run::world::{BottlePickup, Coin};
use common::RecordingAudio;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn fresh_world() -> World {
    World::new(level_one(), &mut seeded_rng(), 0)
}

/// A world with nothing in it but the character, for scripted scenarios.
fn empty_world() -> World {
    let mut w = fresh_world();
    w.enemies.clear();
    w.coins.clear();
    w.bottle_pickups.clear();
    w
}

fn idle_keys() -> KeyState {
    KeyState::default()
}

fn throw_keys() -> KeyState {
    KeyState {
        throw: true,
        ..KeyState::default()
    }
}

fn hen_at(x: f32) -> Walker {
    Walker::new(WalkerKind::Hen, x, &mut seeded_rng(), 0)
}

// ── Construction ──────────────────────────────────────────────────────────────

#[test]
fn new_world_spawns_the_level_tables() {
    let w = fresh_world();
    assert_eq!(w.enemies.len(), level_one().walker_spawns.len());
    assert_eq!(w.coins.len(), COIN_COUNT);
    assert!(w.boss.is_some());
    assert!(!w.boss_engaged);
    assert!(w.outcome().is_none());
}

#[test]
fn world_coins_keep_their_spacing() {
    let w = fresh_world();
    let xs: Vec<f32> = w.coins.iter().map(|c| c.body.x).collect();
    for (i, &a) in xs.iter().enumerate() {
        for &b in &xs[i + 1..] {
            assert!((a - b).abs() >= COIN_SPACING);
        }
    }
}

#[test]
fn soundtrack_starts_on_first_update_only() {
    let mut w = empty_world();
    let mut audio = RecordingAudio::default();
    w.update(&idle_keys(), 16, &mut audio);
    w.update(&idle_keys(), 32, &mut audio);
    assert_eq!(audio.loop_count(Sound::Soundtrack), 1);
}

// ── Boss trigger ──────────────────────────────────────────────────────────────

fn boss_count(w: &World) -> usize {
    w.enemies
        .iter()
        .filter(|e| matches!(e, Enemy::Boss(_)))
        .count()
}

#[test]
fn boss_trigger_fires_exactly_once() {
    let mut w = empty_world();
    let mut audio = RecordingAudio::default();

    w.character.body.x = BOSS_TRIGGER_X - 1.0;
    w.update(&idle_keys(), 200, &mut audio);
    assert!(!w.boss_engaged);
    assert_eq!(boss_count(&w), 0);

    w.character.body.x = BOSS_TRIGGER_X + 1.0;
    w.update(&idle_keys(), 400, &mut audio);
    assert!(w.boss_engaged);
    assert!(!w.character.can_move);
    assert_eq!(boss_count(&w), 1);
    assert!(w.boss.is_none());
    assert_eq!(audio.stop_count(Sound::Soundtrack), 1);
    assert_eq!(audio.loop_count(Sound::BossTheme), 1);

    // More ticks past the threshold must not re-fire anything.
    w.update(&idle_keys(), 600, &mut audio);
    w.update(&idle_keys(), 800, &mut audio);
    assert_eq!(boss_count(&w), 1);
    assert_eq!(audio.loop_count(Sound::BossTheme), 1);
}

#[test]
fn movement_returns_after_the_boss_entrance() {
    let mut w = empty_world();
    w.character.body.x = BOSS_TRIGGER_X + 1.0;
    w.update(&idle_keys(), 200, &mut NullAudio);
    assert!(!w.character.can_move);

    // Entrance runs 1500 ms from the trigger tick.
    w.update(&idle_keys(), 1600, &mut NullAudio);
    assert!(!w.character.can_move);
    w.update(&idle_keys(), 1701, &mut NullAudio);
    assert!(w.character.can_move);
}

// ── Collision outcomes ────────────────────────────────────────────────────────

#[test]
fn stomp_kills_walker_without_losing_energy() {
    let mut w = empty_world();
    let hen = hen_at(90.0);
    let hen_top = 373.0 + 8.0; // body y + hitbox offset
    w.enemies.push(Enemy::Walker(hen));

    // Drop the character onto the hen: hitbox bottom just inside the stomp
    // tolerance, descending.
    w.character.body.y = hen_top - 235.0 + 10.0;
    w.character.speed_y = -5.0;

    w.update(&idle_keys(), 200, &mut NullAudio);

    assert!(w.enemies[0].is_dead());
    assert_eq!(w.character.energy, 100);
    assert_eq!(w.character.speed_y, 0.0);
    assert!(w.character.is_invulnerable(400));
}

#[test]
fn side_touch_damages_the_character() {
    let mut w = empty_world();
    w.enemies.push(Enemy::Walker(hen_at(90.0)));

    w.update(&idle_keys(), 200, &mut NullAudio);

    assert_eq!(w.character.energy, 95);
    assert!(!w.enemies[0].is_dead());
    assert_eq!(w.health_bar.percentage(), 95);
}

#[test]
fn invulnerable_character_shrugs_off_touches() {
    let mut w = empty_world();
    w.enemies.push(Enemy::Walker(hen_at(90.0)));
    w.character.invulnerable_until = Some(1000);

    w.update(&idle_keys(), 200, &mut NullAudio);

    assert_eq!(w.character.energy, 100);
}

#[test]
fn thrown_bottle_kills_walker_and_both_clean_up() {
    let mut w = empty_world();
    w.enemies.push(Enemy::Walker(hen_at(500.0)));
    w.thrown.push(ThrownBottle::launch(505.0, 360.0, false, 0));

    w.update(&idle_keys(), 200, &mut NullAudio);
    assert!(w.enemies[0].is_dead());
    assert!(w.thrown[0].splashed());

    // Both linger for their 500 ms delays, then compact away.
    w.update(&idle_keys(), 400, &mut NullAudio);
    assert_eq!(w.enemies.len(), 1);
    assert_eq!(w.thrown.len(), 1);

    w.update(&idle_keys(), 700, &mut NullAudio);
    assert!(w.enemies.is_empty());
    assert!(w.thrown.is_empty());
}

// ── Pickups ───────────────────────────────────────────────────────────────────

#[test]
fn coin_pickup_counts_and_compacts() {
    let mut w = empty_world();
    w.coins.push(Coin::new(100.0, 250.0));
    let mut audio = RecordingAudio::default();

    w.update(&idle_keys(), 200, &mut audio);

    assert_eq!(w.coins_collected, 1);
    assert!(w.coins.is_empty());
    assert_eq!(w.coin_bar.percentage(), 100 / COIN_COUNT as u32);
    assert_eq!(audio.play_count(Sound::CoinPickup), 1);
    assert_eq!(w.coin_summary(), format!("You have collected 1 / {COIN_COUNT} coins!"));
}

#[test]
fn bottle_pickup_arms_the_throw() {
    let mut w = empty_world();
    w.bottle_pickups.push(BottlePickup::new(100.0));

    w.update(&idle_keys(), 200, &mut NullAudio);

    assert_eq!(w.bottles_held, 1);
    assert!(w.bottle_pickups.is_empty());
    assert_eq!(w.bottle_bar.percentage(), 20);
}

// ── Throwing ──────────────────────────────────────────────────────────────────

#[test]
fn throw_requires_ammunition() {
    let mut w = empty_world();
    w.update(&throw_keys(), 16, &mut NullAudio);
    assert!(w.thrown.is_empty());
}

#[test]
fn holding_the_throw_key_fires_once() {
    let mut w = empty_world();
    w.bottles_held = 3;
    w.update(&throw_keys(), 16, &mut NullAudio);
    assert_eq!(w.thrown.len(), 1);
    assert_eq!(w.bottles_held, 2);

    // Held, not re-pressed — auto-repeat must not fire again.
    w.update(&throw_keys(), 32, &mut NullAudio);
    w.update(&throw_keys(), 48, &mut NullAudio);
    assert_eq!(w.thrown.len(), 1);
}

#[test]
fn throw_cooldown_gates_repeat_presses() {
    let mut w = empty_world();
    w.bottles_held = 3;
    w.update(&throw_keys(), 16, &mut NullAudio);
    w.update(&idle_keys(), 100, &mut NullAudio); // release

    // Fresh press inside the cooldown: blocked.
    w.update(&throw_keys(), 200, &mut NullAudio);
    assert_eq!(w.thrown.len(), 1);

    w.update(&idle_keys(), 300, &mut NullAudio); // release again
    w.update(&throw_keys(), 1100, &mut NullAudio);
    assert_eq!(w.thrown.len(), 2);
}

#[test]
fn thrown_bottle_matches_the_facing() {
    let mut w = empty_world();
    w.bottles_held = 1;
    w.character.body.mirrored = true;
    w.update(&throw_keys(), 16, &mut NullAudio);
    assert!(w.thrown[0].body.x < w.character.body.x);
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

#[test]
fn losing_fires_once_when_energy_runs_out() {
    let mut w = empty_world();
    w.enemies.push(Enemy::Walker(hen_at(90.0)));
    w.character.energy = 5;
    let mut audio = RecordingAudio::default();

    w.update(&idle_keys(), 200, &mut audio);
    assert_eq!(w.outcome(), Some(Outcome::Lost));
    assert!(!w.character.can_move);

    w.update(&idle_keys(), 400, &mut audio);
    assert_eq!(audio.play_count(Sound::Lose), 1);
}

#[test]
fn boss_defeat_wins_after_the_settle_delay() {
    let mut w = empty_world();
    let mut boss = Boss::new(3400.0, 400.0, 0);
    boss.engage(0);
    boss.die(0, &mut NullAudio);
    w.enemies.push(Enemy::Boss(boss));
    w.boss = None;
    w.boss_engaged = true;
    let mut audio = RecordingAudio::default();

    // Death frames at 350 ms apiece, then the 500 ms settle.
    for t in [350, 700, 1050, 1400, 1550] {
        w.update(&idle_keys(), t, &mut audio);
    }
    assert_eq!(w.outcome(), Some(Outcome::Won));
    assert!(w.enemies.is_empty());
    assert_eq!(audio.play_count(Sound::Win), 1);
    assert!(!w.character.can_move);
}

// ── Pause ─────────────────────────────────────────────────────────────────────

#[test]
fn pause_freezes_the_simulation() {
    let mut w = empty_world();
    w.enemies.push(Enemy::Walker(hen_at(90.0)));
    w.toggle_pause();

    let keys = KeyState {
        right: true,
        ..KeyState::default()
    };
    let x0 = w.character.body.x;
    w.update(&keys, 200, &mut NullAudio);
    w.update(&keys, 400, &mut NullAudio);

    assert_eq!(w.character.body.x, x0);
    assert_eq!(w.character.energy, 100); // no collision pass either

    w.toggle_pause();
    w.update(&keys, 600, &mut NullAudio);
    assert!(w.character.body.x > x0);
}
