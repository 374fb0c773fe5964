//! # Render — Drawing Through a Capability Query
//!
//! Rendering is not built into the world; it is one ordinary system. Any
//! component that can draw itself derives from the [`Drawable`] capability,
//! and [`DrawPlugin`] registers an Update system whose query is
//!
//! ```text
//! bundle:    [dyn Drawable]     every entity with a drawable component
//! resources: (Canvas,)          one surface per layer
//! ```
//!
//! Each pass clears every layer, then lets each drawable paint itself on the
//! layer it names. Surfaces are abstract: the crate ships a headless
//! [`RecordingSurface`] that keeps the commands it receives, which is what
//! tests and tools inspect. A windowed backend implements [`Surface`] the same
//! way.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::Context;
use crate::ecs::entity::Entity;
use crate::ecs::lineage::{Capability, Root};
use crate::ecs::query::{BoundResources, Filter, Matches, Query};
use crate::ecs::system::{Phase, System};
use crate::ecs::world::World;
use crate::error::{EcsError, Result};
use crate::plugin::Plugin;

/// An RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
}

/// One primitive handed to a [`Surface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba,
    },
    Circle {
        x: f32,
        y: f32,
        radius: f32,
        color: Rgba,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Rgba,
    },
}

/// Something drawables paint on.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn draw(&mut self, command: DrawCommand);
}

/// A component that can draw itself.
///
/// ```ignore
/// impl Drawable for Label {
///     fn layer(&self) -> usize { 1 }
///     fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, _: u32, _: u32) {
///         surface.draw(DrawCommand::Text { x: 4.0, y: 4.0, text: self.0.clone(), color: Rgba::WHITE });
///     }
/// }
/// impl Component for Label {
///     fn lineage(lineage: &mut Lineage<Self>) {
///         lineage.extends::<dyn Drawable>(|l| l, |l| l);
///     }
/// }
/// ```
pub trait Drawable {
    /// Index of the canvas layer this component paints on.
    fn layer(&self) -> usize;
    fn draw(&self, entity: Entity, world: &World, surface: &mut dyn Surface, width: u32, height: u32);
}

impl Capability for dyn Drawable {
    type Base = Root;
}

// ── Canvas ───────────────────────────────────────────────────────────────

/// Resource holding one surface per layer, layer 0 first.
#[derive(Default)]
pub struct Canvas {
    layers: Vec<Box<dyn Surface>>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer on top of the existing ones.
    pub fn with_layer(mut self, surface: impl Surface + 'static) -> Self {
        self.layers.push(Box::new(surface));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut (dyn Surface + 'static)> {
        self.layers.get_mut(index).map(|surface| surface.as_mut())
    }

    /// Clear every layer.
    pub fn clear(&mut self) {
        for surface in &mut self.layers {
            surface.clear();
        }
    }
}

// ── RecordingSurface ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Tape {
    commands: Vec<DrawCommand>,
    clears: usize,
}

/// Headless surface that records every command since its last clear.
pub struct RecordingSurface {
    width: u32,
    height: u32,
    tape: Rc<RefCell<Tape>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tape: Rc::default(),
        }
    }

    /// A handle that keeps reading this surface after it moved into a
    /// [`Canvas`].
    pub fn recording(&self) -> Recording {
        Recording {
            tape: Rc::clone(&self.tape),
        }
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        let mut tape = self.tape.borrow_mut();
        tape.commands.clear();
        tape.clears += 1;
    }

    fn draw(&mut self, command: DrawCommand) {
        self.tape.borrow_mut().commands.push(command);
    }
}

/// Read side of a [`RecordingSurface`].
#[derive(Clone)]
pub struct Recording {
    tape: Rc<RefCell<Tape>>,
}

impl Recording {
    /// Commands drawn since the last clear.
    pub fn commands(&self) -> Vec<DrawCommand> {
        self.tape.borrow().commands.clone()
    }

    /// How many times the surface has been cleared.
    pub fn clears(&self) -> usize {
        self.tape.borrow().clears
    }
}

// ── DrawPlugin ───────────────────────────────────────────────────────────

/// Registers the draw system under Update. Needs a [`Canvas`] resource
/// registered before it builds.
pub struct DrawPlugin;

impl Plugin for DrawPlugin {
    fn build(&self, ctx: &mut Context) -> Result<()> {
        if !ctx.world.has_resource::<Canvas>() {
            return Err(EcsError::ResourceNotLoaded("Canvas"));
        }
        let query = Query::new()
            .bundle([Filter::of::<dyn Drawable>()])
            .resources::<(Canvas,)>()?;
        ctx.add_system(Phase::Update, System::new(query, draw).named("draw"));
        Ok(())
    }
}

fn draw(matches: &Matches, resources: &BoundResources, ctx: &mut Context) -> Result<()> {
    let mut canvas = resources.get_mut::<Canvas>()?;
    canvas.clear();
    let layers = canvas.len();
    for &entity in &matches[0] {
        let Some(drawable) = ctx.world.capability::<dyn Drawable>(entity) else {
            log::warn!("{entity:?} derives from Drawable but declares no cast to it");
            continue;
        };
        let layer = drawable.layer();
        let Some(surface) = canvas.layer_mut(layer) else {
            log::warn!("{entity:?} draws on layer {layer}, but the canvas has {layers}");
            continue;
        };
        let (width, height) = surface.size();
        drawable.draw(entity, &ctx.world, surface, width, height);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::EngineConfig;
    use crate::ecs::lineage::{Component, Lineage};
    use crate::engine::Engine;
    use crate::time::ManualClock;

    struct Turret {
        x: f32,
        y: f32,
    }

    impl Drawable for Turret {
        fn layer(&self) -> usize {
            0
        }

        fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, _: u32, _: u32) {
            surface.draw(DrawCommand::Rect {
                x: self.x,
                y: self.y,
                width: 8.0,
                height: 8.0,
                color: Rgba::BLACK,
            });
        }
    }

    impl Component for Turret {
        fn lineage(lineage: &mut Lineage<Self>) {
            lineage.extends::<dyn Drawable>(|t| t, |t| t);
        }
    }

    struct Label(String);

    impl Drawable for Label {
        fn layer(&self) -> usize {
            1
        }

        fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, width: u32, _: u32) {
            surface.draw(DrawCommand::Text {
                x: width as f32 / 2.0,
                y: 0.0,
                text: self.0.clone(),
                color: Rgba::WHITE,
            });
        }
    }

    impl Component for Label {
        fn lineage(lineage: &mut Lineage<Self>) {
            lineage.extends::<dyn Drawable>(|l| l, |l| l);
        }
    }

    struct Ghost;

    impl Drawable for Ghost {
        fn layer(&self) -> usize {
            7
        }

        fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, _: u32, _: u32) {
            surface.draw(DrawCommand::Circle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                color: Rgba::WHITE,
            });
        }
    }

    impl Component for Ghost {
        fn lineage(lineage: &mut Lineage<Self>) {
            lineage.extends::<dyn Drawable>(|g| g, |g| g);
        }
    }

    trait Badge: Drawable {}

    impl Capability for dyn Badge {
        type Base = dyn Drawable;
    }

    /// Reaches `dyn Drawable` through `dyn Badge` without a direct cast.
    struct Medal;

    impl Badge for Medal {}

    impl Drawable for Medal {
        fn layer(&self) -> usize {
            0
        }

        fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, _: u32, _: u32) {
            surface.draw(DrawCommand::Circle {
                x: 1.0,
                y: 1.0,
                radius: 2.0,
                color: Rgba::WHITE,
            });
        }
    }

    impl Component for Medal {
        fn lineage(lineage: &mut Lineage<Self>) {
            lineage.extends::<dyn Badge>(|m| m, |m| m);
        }
    }

    struct Gold(u32);
    impl Component for Gold {}

    fn engine_with_canvas() -> (Engine<ManualClock>, ManualClock, Recording, Recording) {
        let clock = ManualClock::new();
        let mut engine = Engine::with_clock(EngineConfig::default(), clock.clone());
        let ground = RecordingSurface::new(100, 50);
        let overlay = RecordingSurface::new(100, 50);
        let (ground_rec, overlay_rec) = (ground.recording(), overlay.recording());
        engine
            .world_mut()
            .insert_resource(Canvas::new().with_layer(ground).with_layer(overlay))
            .unwrap();
        engine.add_plugin(Phase::Prepare, DrawPlugin, 0).unwrap();
        (engine, clock, ground_rec, overlay_rec)
    }

    #[test]
    fn drawables_paint_on_their_layer() {
        let (mut engine, clock, ground, overlay) = engine_with_canvas();
        engine.world_mut().spawn((Turret { x: 3.0, y: 4.0 },)).unwrap();
        engine.world_mut().spawn((Label("wave 1".into()),)).unwrap();
        engine.world_mut().spawn((Gold(5),)).unwrap();

        engine.start(20.0).unwrap();
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();

        assert_eq!(
            ground.commands(),
            vec![DrawCommand::Rect {
                x: 3.0,
                y: 4.0,
                width: 8.0,
                height: 8.0,
                color: Rgba::BLACK,
            }]
        );
        assert_eq!(
            overlay.commands(),
            vec![DrawCommand::Text {
                x: 50.0,
                y: 0.0,
                text: "wave 1".into(),
                color: Rgba::WHITE,
            }]
        );
    }

    #[test]
    fn every_pass_clears_first() {
        let (mut engine, clock, ground, _overlay) = engine_with_canvas();
        let turret = engine.world_mut().spawn((Turret { x: 0.0, y: 0.0 },)).unwrap();
        engine.start(20.0).unwrap();
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert_eq!(ground.commands().len(), 1);

        engine.world_mut().despawn(turret);
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert!(ground.commands().is_empty());
        assert_eq!(ground.clears(), 2);
    }

    #[test]
    fn out_of_range_layer_is_skipped() {
        let (mut engine, clock, ground, overlay) = engine_with_canvas();
        engine.world_mut().spawn((Ghost,)).unwrap();
        engine.start(20.0).unwrap();
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert!(ground.commands().is_empty());
        assert!(overlay.commands().is_empty());
    }

    #[test]
    fn drawable_without_cast_is_skipped() {
        let (mut engine, clock, ground, _overlay) = engine_with_canvas();
        engine.world_mut().spawn((Medal,)).unwrap();
        engine.world_mut().spawn((Turret { x: 1.0, y: 2.0 },)).unwrap();
        engine.start(20.0).unwrap();
        clock.advance(Duration::from_millis(10));
        engine.tick().unwrap();
        assert_eq!(
            ground.commands(),
            vec![DrawCommand::Rect {
                x: 1.0,
                y: 2.0,
                width: 8.0,
                height: 8.0,
                color: Rgba::BLACK,
            }]
        );
    }

    #[test]
    fn draw_plugin_needs_a_canvas() {
        let mut ctx = Context::new();
        let err = DrawPlugin.build(&mut ctx);
        assert_eq!(err, Err(EcsError::ResourceNotLoaded("Canvas")));
    }

    #[test]
    fn canvas_layers() {
        let mut canvas = Canvas::new().with_layer(RecordingSurface::new(4, 2));
        assert_eq!(canvas.len(), 1);
        assert_eq!(canvas.layer_mut(0).map(|s| s.size()), Some((4, 2)));
        if let Some(surface) = canvas.layer_mut(0) {
            surface.draw(DrawCommand::Circle {
                x: 0.0,
                y: 0.0,
                radius: 1.0,
                color: Rgba::BLACK,
            });
        }
        assert!(canvas.layer_mut(1).is_none());
    }
}
