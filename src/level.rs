//! Level data: fixed, hand-authored placement tables plus the scatter
//! sampler used for collectibles. Levels are immutable after construction;
//! the world builds its live entities from them.

use rand::Rng;

use crate::enemies::WalkerKind;
use crate::entities::{Body, Physical, Renderable};

// ── Collectible placement ─────────────────────────────────────────────────────

pub const COIN_COUNT: usize = 10;
pub const COIN_SPACING: f32 = 150.0;
pub const BOTTLE_COUNT: usize = 8;
pub const BOTTLE_SPACING: f32 = 200.0;

/// Band in which collectibles are scattered.
pub const SCATTER_MIN_X: f32 = 300.0;
pub const SCATTER_MAX_X: f32 = 2500.0;

/// Failed draws tolerated before the spacing constraint is relaxed.
const SCATTER_RETRY_CAP: u32 = 200;

/// Rejection-sample `count` x positions in `[min_x, max_x)` keeping every
/// pair at least `min_gap` apart. Placement must always terminate: after
/// [`SCATTER_RETRY_CAP`] consecutive rejections the gap halves and sampling
/// continues, so an infeasible spacing degrades instead of looping forever.
pub fn scatter(
    rng: &mut impl Rng,
    count: usize,
    min_x: f32,
    max_x: f32,
    min_gap: f32,
) -> Vec<f32> {
    let mut placed: Vec<f32> = Vec::with_capacity(count);
    let mut gap = min_gap;
    let mut rejections = 0;
    while placed.len() < count {
        let x = rng.gen_range(min_x..max_x);
        if placed.iter().all(|&p| (x - p).abs() >= gap) {
            placed.push(x);
            rejections = 0;
        } else {
            rejections += 1;
            if rejections >= SCATTER_RETRY_CAP {
                gap /= 2.0;
                rejections = 0;
            }
        }
    }
    placed
}

// ── Background ────────────────────────────────────────────────────────────────

/// Width of one background segment; segments tile the level horizontally.
pub const SEGMENT_WIDTH: f32 = 719.0;

/// One parallax layer image at a fixed world position.
#[derive(Clone, Debug)]
pub struct BackgroundTile {
    pub body: Body,
    pub key: &'static str,
}

impl BackgroundTile {
    fn new(key: &'static str, x: f32) -> Self {
        BackgroundTile {
            body: Body::new(x, 0.0, SEGMENT_WIDTH, 480.0),
            key,
        }
    }
}

impl Physical for BackgroundTile {
    fn body(&self) -> &Body {
        &self.body
    }
}

impl Renderable for BackgroundTile {
    fn sprite(&self) -> Option<&'static str> {
        Some(self.key)
    }
}

// ── Level table ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Level {
    pub walker_spawns: Vec<(WalkerKind, f32)>,
    pub cloud_xs: Vec<f32>,
    pub backgrounds: Vec<BackgroundTile>,
    pub boss_anchor_x: f32,
    pub boss_walk_radius: f32,
    pub end_x: f32,
}

/// The canyon level.
pub fn level_one() -> Level {
    // Adjacent segments alternate between the two art variants so the
    // repeat is not obvious.
    const LAYER_VARIANTS: [[&str; 3]; 2] = [
        [
            "background/third/1",
            "background/second/1",
            "background/first/1",
        ],
        [
            "background/third/2",
            "background/second/2",
            "background/first/2",
        ],
    ];
    let mut backgrounds = Vec::new();
    for i in -1i32..=4 {
        let x = SEGMENT_WIDTH * i as f32;
        backgrounds.push(BackgroundTile::new("background/air", x));
        for key in LAYER_VARIANTS[i.rem_euclid(2) as usize] {
            backgrounds.push(BackgroundTile::new(key, x));
        }
    }

    Level {
        walker_spawns: vec![
            (WalkerKind::Hen, 720.0),
            (WalkerKind::Hen, 1050.0),
            (WalkerKind::Chick, 1380.0),
            (WalkerKind::Hen, 1750.0),
            (WalkerKind::Chick, 2050.0),
            (WalkerKind::Hen, 2350.0),
        ],
        cloud_xs: vec![80.0, 900.0, 1600.0, 2400.0, 3100.0],
        backgrounds,
        boss_anchor_x: 3400.0,
        boss_walk_radius: 400.0,
        end_x: 3600.0,
    }
}
