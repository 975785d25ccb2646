//! CorePlugin wires the session clock used for periodic checks and join timestamps.
use bevy::prelude::*;
#[cfg(feature = "core_debug")]
use bevy::time::TimerMode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DEFAULT_TIME_SCALE: f32 = 1.0;
const MIN_TIME_SCALE: f32 = 0.001;

#[cfg(feature = "core_debug")]
#[derive(Resource)]
struct DebugTickTimer {
    timer: Timer,
}

#[cfg(feature = "core_debug")]
impl Default for DebugTickTimer {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(1.0, TimerMode::Repeating),
        }
    }
}

/// Tracks scaled session time and the wall-clock epoch used for join timestamps.
#[derive(Resource, Debug)]
pub struct SimulationClock {
    time_scale: f32,
    epoch_millis: u64,
    last_scaled_delta: Duration,
    elapsed: Duration,
    real_elapsed: Duration,
}

impl SimulationClock {
    /// Creates a clock anchored at the given epoch (milliseconds since UNIX epoch).
    pub fn new(time_scale: f32, epoch_millis: u64) -> Self {
        Self {
            time_scale: time_scale.max(MIN_TIME_SCALE),
            epoch_millis,
            last_scaled_delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            real_elapsed: Duration::ZERO,
        }
    }

    /// Creates a clock anchored at the current wall-clock time.
    pub fn starting_now(time_scale: f32) -> Self {
        Self::new(time_scale, wall_clock_millis())
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Last scaled delta after applying the multiplier.
    pub fn last_scaled_delta(&self) -> Duration {
        self.last_scaled_delta
    }

    /// Total scaled duration elapsed since the clock was initialised.
    #[cfg_attr(not(any(test, feature = "core_debug")), allow(dead_code))]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Logical join timestamp: epoch plus unscaled elapsed milliseconds.
    pub fn timestamp_millis(&self) -> u64 {
        let elapsed = u64::try_from(self.real_elapsed.as_millis()).unwrap_or(u64::MAX);
        self.epoch_millis.saturating_add(elapsed)
    }

    /// Applies a real delta to the clock, storing the scaled duration.
    pub fn tick(&mut self, real_delta: Duration) {
        self.real_elapsed += real_delta;
        self.last_scaled_delta = real_delta.mul_f32(self.time_scale);
        self.elapsed += self.last_scaled_delta;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::starting_now(DEFAULT_TIME_SCALE)
    }
}

fn wall_clock_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| u64::try_from(since.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Registers session timing systems and resources.
#[derive(Debug, Clone, Copy)]
pub struct CorePlugin {
    time_scale: f32,
}

impl CorePlugin {
    pub const fn with_time_scale(time_scale: f32) -> Self {
        Self { time_scale }
    }
}

impl Default for CorePlugin {
    fn default() -> Self {
        Self::with_time_scale(DEFAULT_TIME_SCALE)
    }
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SimulationClock>() {
            app.insert_resource(SimulationClock::starting_now(self.time_scale));
        }

        app.add_systems(Startup, log_startup_clock)
            .add_systems(First, update_simulation_clock);

        #[cfg(feature = "core_debug")]
        {
            app.insert_resource(DebugTickTimer::default())
                .add_systems(Update, log_scaled_ticks);
        }
    }
}

fn update_simulation_clock(mut clock: ResMut<SimulationClock>, time: Res<Time>) {
    clock.tick(time.delta());
}

fn log_startup_clock(clock: Res<SimulationClock>) {
    info!(
        "CorePlugin initialised with time scale {:.3} (epoch {} ms)",
        clock.time_scale(),
        clock.timestamp_millis()
    );
}

#[cfg(feature = "core_debug")]
fn log_scaled_ticks(mut timer: ResMut<DebugTickTimer>, clock: Res<SimulationClock>) {
    if timer.timer.tick(clock.last_scaled_delta()).just_finished() {
        info!(
            target: "core_debug",
            "Session elapsed: {:.2}s | scale: {:.3} | scaled dt: {:.4}s | stamp: {}",
            clock.elapsed().as_secs_f32(),
            clock.time_scale(),
            clock.last_scaled_delta().as_secs_f32(),
            clock.timestamp_millis(),
        );
    }
}
