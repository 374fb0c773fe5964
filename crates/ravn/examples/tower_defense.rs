//! Tower defense — towers found by capability, a wave that walks, gold on kill.
//!
//! Runs headless for a couple of seconds and prints what the overlay layer
//! drew last, then the engine snapshot.

use std::cell::Cell;
use std::rc::Rc;

use ravn::prelude::*;

// ── Capabilities ─────────────────────────────────────────────────────────

trait Tower: Drawable {
    fn position(&self) -> (f32, f32);
    fn range(&self) -> f32;
    fn damage(&self) -> i32;
}

impl Capability for dyn Tower {
    type Base = dyn Drawable;
}

// ── Components ───────────────────────────────────────────────────────────

struct Turret {
    x: f32,
    y: f32,
}

impl Tower for Turret {
    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
    fn range(&self) -> f32 {
        60.0
    }
    fn damage(&self) -> i32 {
        3
    }
}

impl Drawable for Turret {
    fn layer(&self) -> usize {
        0
    }
    fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, _: u32, _: u32) {
        surface.draw(DrawCommand::Rect {
            x: self.x - 4.0,
            y: self.y - 4.0,
            width: 8.0,
            height: 8.0,
            color: Rgba(40, 120, 220, 255),
        });
    }
}

impl Component for Turret {
    fn lineage(lineage: &mut Lineage<Self>) {
        lineage
            .extends::<dyn Tower>(|t| t, |t| t)
            .cast_as::<dyn Drawable>(|t| t, |t| t);
    }
}

struct Mortar {
    x: f32,
    y: f32,
}

impl Tower for Mortar {
    fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
    fn range(&self) -> f32 {
        140.0
    }
    fn damage(&self) -> i32 {
        1
    }
}

impl Drawable for Mortar {
    fn layer(&self) -> usize {
        0
    }
    fn draw(&self, _: Entity, _: &World, surface: &mut dyn Surface, _: u32, _: u32) {
        surface.draw(DrawCommand::Circle {
            x: self.x,
            y: self.y,
            radius: 6.0,
            color: Rgba(200, 160, 40, 255),
        });
    }
}

impl Component for Mortar {
    fn lineage(lineage: &mut Lineage<Self>) {
        lineage
            .extends::<dyn Tower>(|m| m, |m| m)
            .cast_as::<dyn Drawable>(|m| m, |m| m);
    }
}

struct Enemy {
    x: f32,
    y: f32,
    speed: f32,
}

impl Drawable for Enemy {
    fn layer(&self) -> usize {
        0
    }
    fn draw(&self, entity: Entity, world: &World, surface: &mut dyn Surface, _: u32, _: u32) {
        let hp = world.get::<Health>(entity).map_or(0, |h| h.0);
        surface.draw(DrawCommand::Circle {
            x: self.x,
            y: self.y,
            radius: 3.0 + hp as f32 / 4.0,
            color: Rgba(200, 40, 40, 255),
        });
    }
}

impl Component for Enemy {
    fn lineage(lineage: &mut Lineage<Self>) {
        lineage.extends::<dyn Drawable>(|e| e, |e| e);
    }
}

struct Health(i32);
impl Component for Health {}

/// Gold counter shown on the overlay.
struct Hud;

impl Drawable for Hud {
    fn layer(&self) -> usize {
        1
    }
    fn draw(&self, _: Entity, world: &World, surface: &mut dyn Surface, width: u32, _: u32) {
        let gold = world.resource::<Gold>().map_or(0, |g| g.0);
        surface.draw(DrawCommand::Text {
            x: width as f32 - 80.0,
            y: 8.0,
            text: format!("gold: {gold}"),
            color: Rgba::WHITE,
        });
    }
}

impl Component for Hud {
    fn lineage(lineage: &mut Lineage<Self>) {
        lineage.extends::<dyn Drawable>(|h| h, |h| h);
    }
}

// ── Resources ────────────────────────────────────────────────────────────

struct Gold(u32);

// ── Plugins ──────────────────────────────────────────────────────────────

fn economy(ctx: &mut Context) -> Result<()> {
    ctx.world.insert_resource(Gold(0))?;
    let query = Query::new()
        .bundle([Filter::when::<Health>(|h| h.0 <= 0)])
        .resources::<(Gold,)>()?;
    ctx.add_system(Phase::FixedUpdate, System::new(query, reap));
    Ok(())
}

fn map(ctx: &mut Context) -> Result<()> {
    ctx.spawn((Turret { x: 120.0, y: 60.0 },))?;
    ctx.spawn((Turret { x: 220.0, y: 100.0 },))?;
    ctx.spawn((Mortar { x: 160.0, y: 140.0 },))?;
    ctx.spawn((Hud,))?;
    for i in 0..6 {
        ctx.spawn((
            Enemy {
                x: -20.0 * i as f32,
                y: 80.0,
                speed: 40.0,
            },
            Health(12),
        ))?;
    }
    Ok(())
}

// ── Systems ──────────────────────────────────────────────────────────────

fn walk(matches: &Matches, _: &BoundResources, ctx: &mut Context) -> Result<()> {
    let dt = ctx.world.resource::<Time>()?.delta_secs();
    for &e in &matches[0] {
        if let Some(enemy) = ctx.world.get_mut::<Enemy>(e) {
            enemy.x += enemy.speed * dt;
        }
    }
    Ok(())
}

fn shoot(matches: &Matches, _: &BoundResources, ctx: &mut Context) -> Result<()> {
    let towers: Vec<_> = matches[0]
        .iter()
        .filter_map(|&t| ctx.world.capability::<dyn Tower>(t))
        .map(|tower| (tower.position(), tower.range(), tower.damage()))
        .collect();

    for ((tx, ty), range, damage) in towers {
        let target = matches[1].iter().copied().find(|&e| {
            let alive = ctx.world.get::<Health>(e).is_some_and(|h| h.0 > 0);
            ctx.world.get::<Enemy>(e).is_some_and(|enemy| {
                let (dx, dy) = (enemy.x - tx, enemy.y - ty);
                alive && (dx * dx + dy * dy).sqrt() <= range
            })
        });
        if let Some(health) = target.and_then(|e| ctx.world.get_mut::<Health>(e)) {
            health.0 -= damage;
        }
    }
    Ok(())
}

fn reap(matches: &Matches, resources: &BoundResources, ctx: &mut Context) -> Result<()> {
    let mut gold = resources.get_mut::<Gold>()?;
    for &e in &matches[0] {
        if ctx.world.despawn(e) {
            gold.0 += 5;
            log::info!("{e} destroyed, gold = {}", gold.0);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logger();

    let config = EngineConfig {
        target_fps: 20.0,
        sample_interval_ms: 5,
    };
    let mut engine = Engine::with_config(config);

    let overlay = RecordingSurface::new(320, 200);
    let hud = overlay.recording();
    engine.world_mut().insert_resource(
        Canvas::new()
            .with_layer(RecordingSurface::new(320, 200))
            .with_layer(overlay),
    )?;

    engine.add_plugin(Phase::Prepare, economy, 0)?;
    engine.add_plugin(Phase::Prepare, DrawPlugin, 10)?;
    engine.add_plugin(Phase::Startup, map, 0)?;
    engine.add_plugin(
        Phase::Stop,
        |ctx: &mut Context| -> Result<()> {
            log::info!("final gold: {}", ctx.world.resource::<Gold>()?.0);
            Ok(())
        },
        0,
    )?;

    engine.add_system(
        Phase::Update,
        System::new(Query::new().bundle([Filter::of::<Enemy>()]), walk),
    );
    engine.add_system(
        Phase::FixedUpdate,
        System::new(
            Query::new()
                .bundle([Filter::of::<dyn Tower>()])
                .bundle([Filter::of::<Enemy>(), Filter::of::<Health>()]),
            shoot,
        ),
    );
    engine.add_system(
        Phase::Update,
        System::new(Query::new().bundle([Filter::of::<Enemy>()]), |matches, _, ctx| {
            let out_of_time = ctx.world.resource::<Time>()?.elapsed().as_secs() >= 3;
            if matches[0].is_empty() || out_of_time {
                ctx.stop();
            }
            Ok(())
        })
        .named("game_over"),
    );

    let fixed_steps = Rc::new(Cell::new(0u32));
    let steps = Rc::clone(&fixed_steps);
    let _counter = engine
        .when(Phase::FixedUpdate)
        .subscribe(move |_| steps.set(steps.get() + 1), false);

    engine.run_configured()?;

    println!("fixed steps: {}", fixed_steps.get());
    println!("overlay: {:?}", hud.commands());
    #[cfg(feature = "diagnostics")]
    match engine.diagnostics_snapshot().to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => log::warn!("snapshot failed: {err}"),
    }
    Ok(())
}
