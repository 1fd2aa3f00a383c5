mod common;

use canyon_run::audio::{NullAudio, Sound};
use canyon_run::enemies::{Boss, BossState, Walker, WalkerKind, BOSS_HIT_POINTS, WALKER_REMOVAL_DELAY};
use common::RecordingAudio;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ── Walkers ───────────────────────────────────────────────────────────────────

#[test]
fn walker_speed_is_in_range() {
    let mut rng = seeded_rng();
    for _ in 0..50 {
        let w = Walker::new(WalkerKind::Hen, 500.0, &mut rng, 0);
        assert!(w.speed >= 0.15 && w.speed < 0.45, "speed {}", w.speed);
    }
}

#[test]
fn walker_ambles_left_while_alive() {
    let mut rng = seeded_rng();
    let mut w = Walker::new(WalkerKind::Chick, 500.0, &mut rng, 0);
    let speed = w.speed;
    w.update(16);
    assert_eq!(w.body.x, 500.0 - speed);
}

#[test]
fn dead_walker_stops_moving() {
    let mut rng = seeded_rng();
    let mut w = Walker::new(WalkerKind::Hen, 500.0, &mut rng, 0);
    w.die(100, &mut NullAudio);
    let x = w.body.x;
    w.update(116);
    assert_eq!(w.body.x, x);
    assert!(w.is_dead());
    assert_eq!(w.speed, 0.0);
}

#[test]
fn walker_die_is_idempotent() {
    let mut rng = seeded_rng();
    let mut w = Walker::new(WalkerKind::Hen, 500.0, &mut rng, 0);
    let mut audio = RecordingAudio::default();
    w.die(100, &mut audio);
    // A second death must not restart the sound or push removal out.
    w.die(400, &mut audio);
    assert_eq!(audio.play_count(Sound::WalkerDeath), 1);
    assert!(w.removal_due(100 + WALKER_REMOVAL_DELAY));
}

#[test]
fn walker_removal_waits_for_death_delay() {
    let mut rng = seeded_rng();
    let mut w = Walker::new(WalkerKind::Chick, 500.0, &mut rng, 0);
    assert!(!w.removal_due(10_000)); // alive walkers never expire
    w.die(1000, &mut NullAudio);
    assert!(!w.removal_due(1000 + WALKER_REMOVAL_DELAY - 1));
    assert!(w.removal_due(1000 + WALKER_REMOVAL_DELAY));
}

// ── Boss ──────────────────────────────────────────────────────────────────────

#[test]
fn boss_is_inert_until_engaged() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.update(1000);
    assert_eq!(b.body.x, 3400.0);
    assert_eq!(b.state, BossState::Walking);
}

#[test]
fn boss_strides_in_during_entrance() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.engage(0);
    b.update(16);
    assert!(b.body.x < 3400.0);
    assert!(!b.entrance_done(1499));
    assert!(b.entrance_done(1500));
}

#[test]
fn boss_hit_enters_hurt_and_shields() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.engage(0);
    assert!(b.hit(1000, &mut NullAudio));
    assert_eq!(b.state, BossState::Hurt);
    assert!(b.invulnerable);
    assert_eq!(b.hit_points, BOSS_HIT_POINTS - 1);

    // A hit while hurting is ignored outright.
    assert!(!b.hit(1050, &mut NullAudio));
    assert_eq!(b.hit_points, BOSS_HIT_POINTS - 1);
}

#[test]
fn boss_recovers_to_walk_after_hurt_sequence() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.engage(0);
    b.hit(1000, &mut NullAudio);
    // Hurt frames play at 100 ms each, then a 100 ms grace.
    for t in (1000..1600).step_by(50) {
        b.update(t);
    }
    assert_eq!(b.state, BossState::Walking);
    assert!(!b.invulnerable);
}

fn land_three_hits(b: &mut Boss, audio: &mut RecordingAudio) {
    let mut t = 2000;
    let mut landed = 0;
    while landed < 3 {
        if b.hit(t, audio) {
            landed += 1;
        }
        b.update(t);
        t += 50;
        assert!(t < 20_000, "boss never became hittable again");
    }
}

#[test]
fn three_accepted_hits_kill_the_boss_exactly_once() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.engage(0);
    let mut audio = RecordingAudio::default();
    land_three_hits(&mut b, &mut audio);
    assert_eq!(b.state, BossState::Dead);
    assert_eq!(b.hit_points, 0);
    assert_eq!(audio.play_count(Sound::BossDeath), 1);

    // Nothing lands on a corpse, and a second die is a no-op.
    assert!(!b.hit(30_000, &mut audio));
    b.die(30_000, &mut audio);
    assert_eq!(audio.play_count(Sound::BossDeath), 1);
}

#[test]
fn boss_death_settles_then_finishes() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.engage(0);
    b.die(1000, &mut NullAudio);
    assert!(!b.finished(1000));
    // Death frames at 350 ms each, then the 500 ms settle.
    for t in (1000..4000).step_by(50) {
        b.update(t);
        if b.finished(t) {
            return;
        }
    }
    panic!("boss never finished its death sequence");
}

#[test]
fn boss_patrols_within_its_walk_radius() {
    let mut b = Boss::new(3400.0, 400.0, 0);
    b.engage(0);
    // Start well past the entrance so this is pure patrol.
    let mut t = 2000;
    for _ in 0..2000 {
        b.update(t);
        t += 16;
        assert!(
            b.body.x >= 3000.0 - 2.0 && b.body.x <= 3400.0 + 2.0,
            "strayed to {}",
            b.body.x
        );
    }
}
