//! Plain-data frame description handed to the renderer and HUD.

use sky_render::{QuadSpec, SpriteBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteImage {
    CharacterRight,
    CharacterLeft,
    Platform,
}

impl SpriteImage {
    pub const ALL: &'static [SpriteImage] = &[
        SpriteImage::CharacterRight,
        SpriteImage::CharacterLeft,
        SpriteImage::Platform,
    ];

    /// Texture key used by the renderer's batcher.
    pub fn key(self) -> &'static str {
        match self {
            Self::CharacterRight => "character_right",
            Self::CharacterLeft => "character_left",
            Self::Platform => "platform",
        }
    }

    /// Tint used when the image could not be loaded and a blank sprite stands in.
    pub fn fallback_color(self) -> [f32; 4] {
        match self {
            Self::CharacterRight | Self::CharacterLeft => [0.95, 0.45, 0.25, 1.0],
            Self::Platform => [0.35, 0.75, 0.30, 1.0],
        }
    }
}

/// A sprite in view space: top-left corner and size in board pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteDraw {
    pub image: SpriteImage,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    pub score: u32,
    pub max_score: u32,
    pub tier: usize,
    pub tier_label: String,
    pub game_over: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub background: [f32; 3],
    /// Back to front: platforms first, then the character.
    pub sprites: Vec<SpriteDraw>,
    pub hud: HudState,
}

/// Turn the sprite list into batched quads. `tint` supplies the vertex colour
/// for each image: white for a loaded texture, the fallback colour for a
/// blank stand-in.
pub fn fill_batch(batch: &mut SpriteBatch, list: &DrawList, tint: impl Fn(SpriteImage) -> [f32; 4]) {
    batch.clear();
    for sprite in &list.sprites {
        batch.add_quad(QuadSpec {
            texture_key: sprite.image.key(),
            x: sprite.x,
            y: sprite.y,
            width: sprite.w,
            height: sprite.h,
            color: tint(sprite.image),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(image: SpriteImage, x: f32) -> SpriteDraw {
        SpriteDraw {
            image,
            x,
            y: 100.0,
            w: 60.0,
            h: 18.0,
        }
    }

    fn list(sprites: Vec<SpriteDraw>) -> DrawList {
        DrawList {
            background: [0.0; 3],
            sprites,
            hud: HudState {
                score: 0,
                max_score: 0,
                tier: 0,
                tier_label: String::new(),
                game_over: false,
            },
        }
    }

    #[test]
    fn platforms_batch_into_one_call() {
        let list = list(vec![
            sprite(SpriteImage::Platform, 0.0),
            sprite(SpriteImage::Platform, 80.0),
            sprite(SpriteImage::Platform, 160.0),
            sprite(SpriteImage::CharacterLeft, 150.0),
        ]);
        let mut batch = SpriteBatch::new();
        fill_batch(&mut batch, &list, |_| [1.0; 4]);
        assert_eq!(batch.quad_count(), 4);
        assert_eq!(batch.draw_calls.len(), 2);
        assert_eq!(&*batch.draw_calls[0].texture_key, "platform");
        assert_eq!(&*batch.draw_calls[1].texture_key, "character_left");
    }

    #[test]
    fn tint_follows_image() {
        let list = list(vec![sprite(SpriteImage::Platform, 0.0)]);
        let mut batch = SpriteBatch::new();
        fill_batch(&mut batch, &list, SpriteImage::fallback_color);
        assert_eq!(batch.vertices[0].color, SpriteImage::Platform.fallback_color());
    }

    #[test]
    fn refill_replaces_previous_frame() {
        let mut batch = SpriteBatch::new();
        fill_batch(&mut batch, &list(vec![sprite(SpriteImage::Platform, 0.0)]), |_| [1.0; 4]);
        fill_batch(&mut batch, &list(Vec::new()), |_| [1.0; 4]);
        assert_eq!(batch.quad_count(), 0);
    }
}
