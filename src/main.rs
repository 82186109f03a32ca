use std::error::Error;
use std::time::Duration;

use instant::Instant;

use flockworld::{SimConfig, World};

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// Ticks per timing report.
const STATS_WINDOW: usize = 300;
/// Ticks between population reports.
const POPULATION_LOG_TICKS: u64 = 600;

// ---------------------------------------------------------------------------
// Tick timing
// ---------------------------------------------------------------------------

/// Tick durations over a fixed window, logged as percentiles when it fills.
struct TickStats {
    durations: Vec<f64>,
    agents: usize,
    total_ticks: u64,
}

impl TickStats {
    fn new() -> Self {
        Self {
            durations: Vec::with_capacity(STATS_WINDOW),
            agents: 0,
            total_ticks: 0,
        }
    }

    fn record(&mut self, seconds: f64, agents: usize) {
        self.durations.push(seconds);
        self.agents += agents;
        self.total_ticks += 1;
        if self.durations.len() < STATS_WINDOW {
            return;
        }

        self.durations.sort_unstable_by(f64::total_cmp);
        let n = self.durations.len();
        let at = |q: f64| self.durations[((n - 1) as f64 * q).round() as usize] * 1000.0;
        log::info!(
            "tick p50: {:.3}ms | p99: {:.3}ms | max: {:.3}ms | {:.0} agents/tick | total ticks: {}",
            at(0.5),
            at(0.99),
            at(1.0),
            self.agents as f64 / n as f64,
            self.total_ticks,
        );
        self.durations.clear();
        self.agents = 0;
    }
}

// ---------------------------------------------------------------------------
// Arguments: [width] [height] [boids] [ticks] [seed]
// ---------------------------------------------------------------------------

struct Args {
    width: f32,
    height: f32,
    boids: u32,
    ticks: u64,
    seed: u64,
}

impl Args {
    fn parse() -> Result<Self, Box<dyn Error>> {
        let raw: Vec<String> = std::env::args().skip(1).collect();
        let arg = |i: usize| raw.get(i).map(String::as_str);
        Ok(Self {
            width: arg(0).map(str::parse::<f32>).transpose()?.unwrap_or(1280.0),
            height: arg(1).map(str::parse::<f32>).transpose()?.unwrap_or(720.0),
            boids: arg(2).map(str::parse::<u32>).transpose()?.unwrap_or(400),
            ticks: arg(3).map(str::parse::<u64>).transpose()?.unwrap_or(1_800),
            seed: arg(4)
                .map(str::parse::<u64>)
                .transpose()?
                .unwrap_or(flockworld::config::DEFAULT_SEED),
        })
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse()?;
    let config = SimConfig::with_seed(args.seed);
    let mut world = World::with_config(args.width, args.height, args.boids, config);

    let (w, h) = (world.width(), world.height());
    world.add_predator(w * 0.25, h * 0.3);
    world.add_predator(w * 0.75, h * 0.3);
    world.add_food(w * 0.5, h * 0.5);
    world.add_obstacle(w * 0.4, h * 0.6);
    world.add_obstacle(w * 0.6, h * 0.6);

    let mut stats = TickStats::new();
    let mut accumulator = 0.0;
    let mut last = Instant::now();
    let mut ticks = 0u64;

    while ticks < args.ticks {
        let now = Instant::now();
        accumulator += now.duration_since(last).as_secs_f64();
        last = now;
        if accumulator > MAX_ACCUMULATOR {
            accumulator = MAX_ACCUMULATOR;
        }

        while accumulator >= TICK_RATE && ticks < args.ticks {
            // Cursor circles the middle of the world, switching mode every 5s.
            let angle = ticks as f32 * 0.01;
            let cursor_x = w * 0.5 + angle.cos() * w * 0.3;
            let cursor_y = h * 0.5 + angle.sin() * h * 0.3;
            let mode = if (ticks / 300) % 2 == 0 { 1 } else { 2 };

            let start = Instant::now();
            world.tick(cursor_x, cursor_y, mode, 1.0);
            let s = world.stats();
            let agents = (s[0] + s[1] + s[2]) as usize;
            stats.record(start.elapsed().as_secs_f64(), agents);
            ticks += 1;
            accumulator -= TICK_RATE;

            if ticks % POPULATION_LOG_TICKS == 0 {
                let s = world.stats();
                log::info!(
                    "tick {ticks}: {} boids, {} predators, {} bugs, day {:.2} ({})",
                    s[0],
                    s[1],
                    s[2],
                    s[3],
                    world.season().label(),
                );
                census(&world);
            }
        }

        let idle = (TICK_RATE - accumulator).max(0.0);
        std::thread::sleep(Duration::from_secs_f64(idle));
    }

    let s = world.stats();
    log::info!(
        "finished {} ticks: {} boids, {} predators, {} bugs",
        ticks,
        s[0],
        s[1],
        s[2]
    );
    Ok(())
}

/// Log where the flock is and what it's doing.
fn census(world: &World) {
    let states: Vec<String> = world
        .state_census()
        .into_iter()
        .filter(|&(_, n)| n > 0)
        .map(|(state, n)| format!("{n} {}", state.label()))
        .collect();
    match world.boid_centroid() {
        Some(c) => log::debug!("flock at ({:.0}, {:.0}): {}", c.x, c.y, states.join(", ")),
        None => log::debug!("no boids left"),
    }
}

fn main() {
    env_logger::init();
    log::info!("flockworld starting up");

    if let Err(e) = run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
