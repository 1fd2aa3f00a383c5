use canyon_run::level::{
    level_one, scatter, BOTTLE_COUNT, COIN_COUNT, COIN_SPACING, SCATTER_MAX_X, SCATTER_MIN_X,
};

use rand::rngs::StdRng;
use rand::SeedableRng;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

// ── Scatter placement ─────────────────────────────────────────────────────────

#[test]
fn scatter_respects_spacing_when_feasible() {
    let mut rng = seeded_rng();
    let xs = scatter(&mut rng, COIN_COUNT, SCATTER_MIN_X, SCATTER_MAX_X, COIN_SPACING);
    assert_eq!(xs.len(), COIN_COUNT);
    for (i, &a) in xs.iter().enumerate() {
        assert!((SCATTER_MIN_X..SCATTER_MAX_X).contains(&a));
        for &b in &xs[i + 1..] {
            assert!(
                (a - b).abs() >= COIN_SPACING,
                "coins at {a} and {b} closer than {COIN_SPACING}"
            );
        }
    }
}

#[test]
fn scatter_terminates_under_infeasible_spacing() {
    // 40 items spaced 500 apart cannot fit in 1000 px; the sampler must
    // relax the gap rather than loop forever, and still deliver the count.
    let mut rng = seeded_rng();
    let xs = scatter(&mut rng, 40, 0.0, 1000.0, 500.0);
    assert_eq!(xs.len(), 40);
}

#[test]
fn scatter_results_differ_between_seeds() {
    let a = scatter(&mut StdRng::seed_from_u64(1), 5, 0.0, 2000.0, 100.0);
    let b = scatter(&mut StdRng::seed_from_u64(2), 5, 0.0, 2000.0, 100.0);
    assert_ne!(a, b);
}

// ── Level table ───────────────────────────────────────────────────────────────

#[test]
fn level_one_places_everything_inside_the_level() {
    let level = level_one();
    assert!(level.end_x > 0.0);
    assert!(!level.walker_spawns.is_empty());
    for &(_, x) in &level.walker_spawns {
        assert!(x > 0.0 && x < level.end_x);
    }
    assert!(level.boss_anchor_x < level.end_x);
    assert!(level.boss_anchor_x - level.boss_walk_radius > 0.0);
    assert!(!level.backgrounds.is_empty());
    assert!(!level.cloud_xs.is_empty());
}

#[test]
fn level_one_walkers_spawn_before_the_boss_arena() {
    let level = level_one();
    for &(_, x) in &level.walker_spawns {
        assert!(x < level.boss_anchor_x - level.boss_walk_radius);
    }
}

#[test]
fn collectible_band_is_wide_enough_for_the_configured_counts() {
    // The shipped tables must not rely on the relaxed-spacing fallback.
    let span = SCATTER_MAX_X - SCATTER_MIN_X;
    assert!(span >= (COIN_COUNT as f32 - 1.0) * COIN_SPACING);
    assert!(span >= (BOTTLE_COUNT as f32 - 1.0) * canyon_run::level::BOTTLE_SPACING);
}
