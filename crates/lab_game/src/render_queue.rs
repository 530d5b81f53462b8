//! Layered draw queue.
//!
//! Commands are collected per layer during a tick, then executed in layer
//! order against a `RenderTarget`. World layers are drawn with the camera
//! offset applied and culled against the view; `Ui` is drawn in screen space.

use glam::Vec2;
use lab_map::TileVisual;

/// Off-screen slack before an immediate draw is culled.
pub const CULL_MARGIN: f32 = 32.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderLayer {
    Background,
    Terrain,
    Below,
    Entities,
    Above,
    Effects,
    Ui,
}

impl RenderLayer {
    pub const ALL: [RenderLayer; 7] = [
        RenderLayer::Background,
        RenderLayer::Terrain,
        RenderLayer::Below,
        RenderLayer::Entities,
        RenderLayer::Above,
        RenderLayer::Effects,
        RenderLayer::Ui,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn is_world(self) -> bool {
        self != RenderLayer::Ui
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            pos: self.pos + offset,
            size: self.size,
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.pos.x < other.pos.x + other.size.x
            && other.pos.x < self.pos.x + self.size.x
            && self.pos.y < other.pos.y + other.size.y
            && other.pos.y < self.pos.y + self.size.y
    }
}

/// Opacity and rotation for an immediate draw. Rotation is clockwise, in
/// degrees, about the destination centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub alpha: u8,
    pub rotation_degrees: f32,
}

impl Default for DrawStyle {
    fn default() -> Self {
        Self {
            alpha: u8::MAX,
            rotation_degrees: 0.0,
        }
    }
}

/// Backend that turns commands into pixels.
pub trait RenderTarget {
    fn blit(&mut self, sprite: &TileVisual, dest: Rect);

    /// Styled draw. Backends that cannot blend or rotate draw anything not
    /// fully transparent as a plain blit.
    fn blit_styled(&mut self, sprite: &TileVisual, dest: Rect, style: DrawStyle) {
        if style.alpha > 0 {
            self.blit(sprite, dest);
        }
    }
}

pub type DeferredDraw = Box<dyn FnOnce(&mut dyn RenderTarget, Vec2)>;

pub enum RenderCommand {
    /// Draw `sprite` at `rect` (world pixels, or screen pixels on `Ui`).
    Immediate {
        sprite: TileVisual,
        rect: Rect,
        style: DrawStyle,
    },
    /// Custom drawing, handed the target and the offset to apply.
    Deferred(DeferredDraw),
}

impl std::fmt::Debug for RenderCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderCommand::Immediate { sprite, rect, style } => f
                .debug_struct("Immediate")
                .field("sprite", sprite)
                .field("rect", rect)
                .field("style", style)
                .finish(),
            RenderCommand::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[derive(Debug, Default)]
pub struct RenderQueue {
    layers: [Vec<(f32, RenderCommand)>; 7],
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: RenderLayer, z: f32, command: RenderCommand) {
        self.layers[layer.slot()].push((z, command));
    }

    pub fn draw(&mut self, layer: RenderLayer, z: f32, sprite: TileVisual, rect: Rect) {
        self.draw_styled(layer, z, sprite, rect, DrawStyle::default());
    }

    pub fn draw_styled(&mut self, layer: RenderLayer, z: f32, sprite: TileVisual, rect: Rect, style: DrawStyle) {
        self.push(layer, z, RenderCommand::Immediate { sprite, rect, style });
    }

    pub fn defer(
        &mut self,
        layer: RenderLayer,
        z: f32,
        draw: impl FnOnce(&mut dyn RenderTarget, Vec2) + 'static,
    ) {
        self.push(layer, z, RenderCommand::Deferred(Box::new(draw)));
    }

    /// Drain every layer into `target` and return how many commands ran.
    /// `camera` is the view's top-left in world pixels, `view` its size.
    pub fn process(&mut self, target: &mut dyn RenderTarget, camera: Vec2, view: Vec2) -> usize {
        let offset = -camera;
        let visible = Rect {
            pos: Vec2::splat(-CULL_MARGIN),
            size: view + Vec2::splat(CULL_MARGIN * 2.0),
        };

        let mut executed = 0;
        for layer in RenderLayer::ALL {
            let mut commands = std::mem::take(&mut self.layers[layer.slot()]);
            commands.sort_by(|a, b| a.0.total_cmp(&b.0));
            let layer_offset = if layer.is_world() { offset } else { Vec2::ZERO };

            for (_, command) in commands {
                match command {
                    RenderCommand::Immediate { sprite, rect, style } => {
                        let dest = rect.translated(layer_offset);
                        if layer.is_world() && !dest.intersects(&visible) {
                            continue;
                        }
                        if style == DrawStyle::default() {
                            target.blit(&sprite, dest);
                        } else {
                            target.blit_styled(&sprite, dest, style);
                        }
                    }
                    RenderCommand::Deferred(draw) => draw(&mut *target, layer_offset),
                }
                executed += 1;
            }
        }
        executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        blits: Vec<(TileVisual, Rect)>,
    }

    impl RenderTarget for Recorder {
        fn blit(&mut self, sprite: &TileVisual, dest: Rect) {
            self.blits.push((sprite.clone(), dest));
        }
    }

    fn sprite(tag: u32) -> TileVisual {
        TileVisual::Atlas {
            image: PathBuf::from("sheet.png"),
            src_rect: [tag, 0, 16, 16],
        }
    }

    fn tags(recorder: &Recorder) -> Vec<u32> {
        recorder
            .blits
            .iter()
            .map(|(visual, _)| match visual {
                TileVisual::Atlas { src_rect, .. } => src_rect[0],
                TileVisual::Placeholder { .. } => u32::MAX,
            })
            .collect()
    }

    #[test]
    fn layers_run_in_order_and_sort_by_z() {
        let mut queue = RenderQueue::new();
        queue.draw(RenderLayer::Above, 0.0, sprite(4), Rect::new(0.0, 0.0, 16.0, 16.0));
        queue.draw(RenderLayer::Entities, 20.0, sprite(3), Rect::new(0.0, 20.0, 16.0, 16.0));
        queue.draw(RenderLayer::Entities, 10.0, sprite(2), Rect::new(0.0, 10.0, 16.0, 16.0));
        queue.draw(RenderLayer::Background, 0.0, sprite(1), Rect::new(0.0, 0.0, 16.0, 16.0));

        let mut recorder = Recorder::default();
        let count = queue.process(&mut recorder, Vec2::ZERO, Vec2::new(320.0, 180.0));
        assert_eq!(count, 4);
        assert_eq!(tags(&recorder), vec![1, 2, 3, 4]);
        // Processing drains the queue.
        assert_eq!(queue.process(&mut recorder, Vec2::ZERO, Vec2::new(320.0, 180.0)), 0);
    }

    #[test]
    fn world_layers_apply_camera_and_cull() {
        let mut queue = RenderQueue::new();
        queue.draw(RenderLayer::Terrain, 0.0, sprite(1), Rect::new(110.0, 60.0, 16.0, 16.0));
        // Just inside the margin to the left of the view.
        queue.draw(RenderLayer::Terrain, 0.0, sprite(2), Rect::new(100.0 - 40.0, 60.0, 16.0, 16.0));
        // Far outside.
        queue.draw(RenderLayer::Terrain, 0.0, sprite(3), Rect::new(900.0, 60.0, 16.0, 16.0));
        queue.draw(RenderLayer::Ui, 0.0, sprite(9), Rect::new(5.0, 5.0, 8.0, 8.0));

        let mut recorder = Recorder::default();
        let count = queue.process(&mut recorder, Vec2::new(100.0, 50.0), Vec2::new(320.0, 180.0));
        assert_eq!(count, 3);
        assert_eq!(tags(&recorder), vec![1, 2, 9]);
        assert_eq!(recorder.blits[0].1.pos, Vec2::new(10.0, 10.0));
        assert_eq!(recorder.blits[2].1.pos, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn styled_draws_reach_the_target_and_invisible_ones_are_dropped() {
        let mut queue = RenderQueue::new();
        let faded = DrawStyle {
            alpha: 40,
            rotation_degrees: 90.0,
        };
        queue.draw_styled(RenderLayer::Below, 0.0, sprite(1), Rect::new(0.0, 0.0, 4.0, 4.0), faded);
        queue.draw_styled(
            RenderLayer::Below,
            1.0,
            sprite(2),
            Rect::new(0.0, 0.0, 4.0, 4.0),
            DrawStyle { alpha: 0, ..faded },
        );

        let mut recorder = Recorder::default();
        assert_eq!(queue.process(&mut recorder, Vec2::ZERO, Vec2::new(64.0, 64.0)), 2);
        assert_eq!(tags(&recorder), vec![1]);
    }

    #[test]
    fn deferred_draws_receive_the_layer_offset() {
        let mut queue = RenderQueue::new();
        queue.defer(RenderLayer::Effects, 0.0, |target, offset| {
            target.blit(&sprite(7), Rect::new(40.0, 40.0, 4.0, 4.0).translated(offset));
        });
        queue.defer(RenderLayer::Ui, 0.0, |target, offset| {
            target.blit(&sprite(8), Rect::new(1.0, 1.0, 4.0, 4.0).translated(offset));
        });

        let mut recorder = Recorder::default();
        assert_eq!(queue.process(&mut recorder, Vec2::new(30.0, 30.0), Vec2::new(64.0, 64.0)), 2);
        assert_eq!(recorder.blits[0].1.pos, Vec2::new(10.0, 10.0));
        assert_eq!(recorder.blits[1].1.pos, Vec2::new(1.0, 1.0));
    }
}
