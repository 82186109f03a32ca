//! Day/night and season clock driven purely by the tick counter.
//! Behaviors read daylight (brightness) and season; renderers read the phase.

use std::f32::consts::TAU;

use crate::config::ClockConfig;

/// Largest f32 below 1.0; keeps the phase in [0, 1) even for huge day lengths.
const LAST_PHASE: f32 = 1.0 - f32::EPSILON / 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Season {
    Spring = 0,
    Summer = 1,
    Autumn = 2,
    Winter = 3,
}

impl Season {
    pub const ALL: [Season; 4] = [Self::Spring, Self::Summer, Self::Autumn, Self::Winter];

    /// Index into per-season config tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
        }
    }
}

/// Tick counter plus everything derived from it. Tick 0 is midnight of the
/// first spring day.
#[derive(Debug, Clone)]
pub struct DayNightClock {
    tick: u64,
    day_length: u64,
    season_length: u64,
}

impl DayNightClock {
    pub fn new(config: &ClockConfig) -> Self {
        let day_length = config.day_length.max(1);
        Self {
            tick: 0,
            day_length,
            season_length: day_length.saturating_mul(config.days_per_season.max(1)),
        }
    }

    /// Step one tick. The only mutation the clock has.
    pub fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Fraction of the current day elapsed, in [0, 1). 0 = midnight, 0.5 = noon.
    pub fn day_phase(&self) -> f32 {
        let within = self.tick % self.day_length;
        ((within as f64 / self.day_length as f64) as f32).min(LAST_PHASE)
    }

    /// Brightness in [0, 1]: 0 at midnight, 1 at noon, smooth in between.
    pub fn daylight(&self) -> f32 {
        daylight_at(self.day_phase())
    }

    pub fn season(&self) -> Season {
        let index = (self.tick / self.season_length) % 4;
        Season::ALL[index as usize]
    }
}

/// Cosine brightness curve over the day phase.
fn daylight_at(phase: f32) -> f32 {
    (0.5 - 0.5 * (phase * TAU).cos()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(day_length: u64) -> DayNightClock {
        DayNightClock::new(&ClockConfig {
            day_length,
            days_per_season: 2,
        })
    }

    fn advance_by(clock: &mut DayNightClock, ticks: u64) {
        for _ in 0..ticks {
            clock.advance();
        }
    }

    #[test]
    fn phase_stays_in_unit_interval() {
        let mut c = clock(97);
        for _ in 0..1_000 {
            let p = c.day_phase();
            assert!((0.0..1.0).contains(&p), "phase {p} out of range");
            c.advance();
        }
    }

    #[test]
    fn phase_is_periodic() {
        let mut a = clock(120);
        let mut b = clock(120);
        advance_by(&mut a, 37);
        advance_by(&mut b, 37 + 120 * 3);
        assert_eq!(a.day_phase(), b.day_phase());
        assert_eq!(a.daylight(), b.daylight());
    }

    #[test]
    fn huge_day_length_never_reaches_one() {
        let mut c = clock(u64::MAX);
        c.tick = u64::MAX - 1;
        assert!(c.day_phase() < 1.0);
    }

    #[test]
    fn midnight_dark_noon_bright() {
        let mut c = clock(100);
        assert!(c.daylight() < 0.01);
        advance_by(&mut c, 50);
        assert!(c.daylight() > 0.99);
    }

    #[test]
    fn seasons_cycle_in_order() {
        let mut c = clock(10);
        assert_eq!(c.season(), Season::Spring);
        advance_by(&mut c, 20);
        assert_eq!(c.season(), Season::Summer);
        advance_by(&mut c, 40);
        assert_eq!(c.season(), Season::Winter);
        advance_by(&mut c, 20);
        assert_eq!(c.season(), Season::Spring);
    }
}
