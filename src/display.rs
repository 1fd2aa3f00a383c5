//! Render pass — translates world state into surface calls.
//!
//! No game logic here: the pass walks the world back-to-front, applies the
//! camera translation to every world-space layer (status bars are screen
//! fixed), and mirrors any entity whose facing flag is set. What a sprite
//! key looks like on screen is entirely the surface's business.

use crate::entities::{Physical, Renderable};
use crate::world::World;

/// Nominal size of the visible window in world units.
pub const VIEW_WIDTH: f32 = 720.0;
pub const VIEW_HEIGHT: f32 = 480.0;

/// Render-surface collaborator. Transforms compose in call order; drawing
/// an unknown or not-yet-decoded key must be a silent no-op.
pub trait Surface {
    fn clear(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn draw_image(&mut self, key: &str, x: f32, y: f32, w: f32, h: f32);
}

/// Draw one complete frame, back to front: background, status bars,
/// collectibles, character, thrown bottles, enemies, clouds.
pub fn render(surface: &mut impl Surface, world: &World) {
    surface.clear();

    surface.save();
    surface.translate(world.camera_x, 0.0);
    for tile in &world.level.backgrounds {
        draw_entity(surface, tile);
    }
    surface.restore();

    draw_status_bars(surface, world);

    surface.save();
    surface.translate(world.camera_x, 0.0);
    for coin in &world.coins {
        draw_entity(surface, coin);
    }
    for pickup in &world.bottle_pickups {
        draw_entity(surface, pickup);
    }
    draw_entity(surface, &world.character);
    for bottle in &world.thrown {
        draw_entity(surface, bottle);
    }
    for enemy in &world.enemies {
        draw_entity(surface, enemy);
    }
    for cloud in &world.clouds {
        draw_entity(surface, cloud);
    }
    surface.restore();
}

/// Draw a single entity, mirrored in place when its facing flag is set.
pub fn draw_entity(surface: &mut impl Surface, entity: &impl Renderable) {
    let Some(key) = entity.sprite() else {
        return;
    };
    let b = entity.body();
    if entity.flipped() {
        // Reflect about the sprite's vertical centre line so the mirrored
        // image occupies the same rectangle.
        surface.save();
        surface.translate(2.0 * b.x + b.width, 0.0);
        surface.scale(-1.0, 1.0);
        surface.draw_image(key, b.x, b.y, b.width, b.height);
        surface.restore();
    } else {
        surface.draw_image(key, b.x, b.y, b.width, b.height);
    }
}

fn draw_status_bars(surface: &mut impl Surface, world: &World) {
    let bars = [
        ("health", world.health_bar.display_index(), 20.0, 0.0),
        ("coin", world.coin_bar.display_index(), 20.0, 50.0),
        ("bottle", world.bottle_bar.display_index(), 20.0, 100.0),
    ];
    for (name, index, x, y) in bars {
        surface.draw_image(&format!("bar/{name}/{index}"), x, y, 200.0, 60.0);
    }
    // The boss bar only appears once the encounter has started.
    if world.boss_engaged {
        surface.draw_image(
            &format!("bar/boss/{}", world.boss_bar.display_index()),
            VIEW_WIDTH - 220.0,
            0.0,
            200.0,
            60.0,
        );
    }
}
