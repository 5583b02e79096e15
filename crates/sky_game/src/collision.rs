//! Character / platform overlap and landing resolution.
//!
//! Platforms are one-way: the character passes through them on the way up and
//! only lands while descending. A landing snaps the character onto the
//! platform top and relaunches it, so at most one landing can apply per step.

use crate::character::Character;
use crate::level::{Platform, PlatformId};

/// Axis-aligned rectangle in world space, `y` growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    pub platform_index: usize,
    pub platform_id: PlatformId,
}

pub fn character_bounds(character: &Character) -> Rect {
    Rect {
        x: character.x,
        y: character.world_y,
        w: character.width,
        h: character.height,
    }
}

/// Test platforms in sequence order and apply the first qualifying landing.
pub fn resolve_landing<'a, I>(
    character: &mut Character,
    platforms: I,
    launch_velocity: f32,
) -> Option<Landing>
where
    I: IntoIterator<Item = &'a Platform>,
{
    if !character.is_descending() {
        return None;
    }
    let bounds = character_bounds(character);
    let (platform_index, platform) = platforms
        .into_iter()
        .enumerate()
        .find(|(_, platform)| bounds.intersects(&platform.bounds()))?;

    character.launch(launch_velocity, platform.world_y);
    Some(Landing {
        platform_index,
        platform_id: platform.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Facing;

    fn character_at(x: f32, world_y: f32, velocity_y: f32) -> Character {
        Character {
            x,
            world_y,
            width: 46.0,
            height: 46.0,
            velocity_x: 0.0,
            velocity_y,
            facing: Facing::Right,
        }
    }

    #[test]
    fn rect_intersection_is_strict_on_edges() {
        let a = Rect {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        let touching = Rect {
            x: 10.0,
            y: 0.0,
            w: 5.0,
            h: 5.0,
        };
        let overlapping = Rect {
            x: 9.0,
            y: 9.0,
            w: 5.0,
            h: 5.0,
        };
        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
    }

    #[test]
    fn descending_overlap_lands_and_snaps() {
        let platforms = [Platform::new(150.0, 550.0, 60.0, 18.0)];
        let mut c = character_at(160.0, 506.0, 3.0);
        let landing = resolve_landing(&mut c, &platforms, -2.5).expect("should land");
        assert_eq!(landing.platform_index, 0);
        assert_eq!(landing.platform_id, platforms[0].id);
        assert_eq!(c.world_y, 550.0 - 46.0);
        assert_eq!(c.velocity_y, -2.5);
    }

    #[test]
    fn ascending_passes_through() {
        let platforms = [Platform::new(150.0, 550.0, 60.0, 18.0)];
        let mut c = character_at(160.0, 520.0, -1.0);
        assert!(resolve_landing(&mut c, &platforms, -2.5).is_none());
        assert_eq!(c.world_y, 520.0);
        assert_eq!(c.velocity_y, -1.0);
    }

    #[test]
    fn horizontal_miss_does_not_land() {
        let platforms = [Platform::new(0.0, 550.0, 60.0, 18.0)];
        let mut c = character_at(200.0, 510.0, 2.0);
        assert!(resolve_landing(&mut c, &platforms, -2.5).is_none());
    }

    #[test]
    fn first_overlapping_platform_wins() {
        let platforms = [
            Platform::new(500.0, 100.0, 60.0, 18.0),
            Platform::new(150.0, 552.0, 60.0, 18.0),
            Platform::new(150.0, 548.0, 60.0, 18.0),
        ];
        let mut c = character_at(160.0, 510.0, 1.0);
        let landing = resolve_landing(&mut c, &platforms, -2.5).expect("should land");
        assert_eq!(landing.platform_index, 1);
        assert_eq!(c.world_y, 552.0 - 46.0);
    }
}
