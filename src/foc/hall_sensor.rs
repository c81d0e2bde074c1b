// Hall sensor processing for BLDC motor electrical angle and speed estimation
//
// Sector transitions arrive from the capture interrupt through
// `SectorTransitionHandler`; angle and speed are queried once per control
// tick. Committed state lives in relaxed atomics so both contexts can share
// one estimator without a lock. A query racing a transition may see one
// stale field for one tick; that is accepted.

use core::sync::atomic::{AtomicI8, AtomicU32, AtomicU8, Ordering};

use crate::config::HallConfig;

/// Sector (raw Hall state) to base electrical angle (degrees)
/// Hall state format: (A << 2) | (B << 1) | C
/// Valid states are 1-6 (0b001 to 0b110), invalid states are 0 (0b000) and 7 (0b111)
const HALL_ANGLE_TABLE: [f32; 8] = [
    0.0,   // 0b000: Invalid state
    330.0, // 0b001: Sector 1
    90.0,  // 0b010: Sector 2
    30.0,  // 0b011: Sector 3
    210.0, // 0b100: Sector 4
    270.0, // 0b101: Sector 5
    150.0, // 0b110: Sector 6
    0.0,   // 0b111: Invalid state
];

/// Position of each sector along the forward electrical sequence
/// 1 -> 3 -> 2 -> 6 -> 4 -> 5 -> 1 (base angle 330, 30, 90, 150, 210, 270)
const SECTOR_SEQUENCE_INDEX: [u8; 8] = [
    255, // 0b000: Invalid state
    0,   // Sector 1 (330°)
    2,   // Sector 2 (90°)
    1,   // Sector 3 (30°)
    4,   // Sector 4 (210°)
    5,   // Sector 5 (270°)
    3,   // Sector 6 (150°)
    255, // 0b111: Invalid state
];

/// Electrical degrees per sector
const SECTOR_WIDTH_DEG: f32 = 60.0;

/// Sectors per electrical revolution
const SECTORS_PER_REV: f32 = 6.0;

/// Three digital Hall sensor inputs
pub trait HallInputs {
    /// Sample sensor levels as (A, B, C), `true` = high
    fn levels(&self) -> (bool, bool, bool);
}

/// Timing sources of the estimator
pub trait HallTimer {
    /// Live value of the capture counter, restarted by hardware at every
    /// sector transition
    fn counter(&self) -> u32;

    /// Monotonic system tick [ms], wrapping
    fn now_ms(&self) -> u32;
}

impl<T: HallInputs + ?Sized> HallInputs for &T {
    fn levels(&self) -> (bool, bool, bool) {
        (**self).levels()
    }
}

impl<T: HallTimer + ?Sized> HallTimer for &T {
    fn counter(&self) -> u32 {
        (**self).counter()
    }

    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Entry point for the capture interrupt
pub trait SectorTransitionHandler {
    /// A sector boundary was crossed
    ///
    /// # Arguments
    /// * `sector_duration` - Capture counter ticks spent in the sector just left
    fn on_sector_transition(&self, sector_duration: u32);
}

/// Rotation direction derived from consecutive sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Along 1 -> 3 -> 2 -> 6 -> 4 -> 5 (increasing electrical angle)
    Forward,
    /// Against the forward sequence
    Reverse,
    /// No transition yet, or a sector was skipped
    Unknown,
}

impl Rotation {
    fn to_i8(self) -> i8 {
        match self {
            Rotation::Forward => 1,
            Rotation::Reverse => -1,
            Rotation::Unknown => 0,
        }
    }

    fn from_i8(value: i8) -> Self {
        match value {
            1 => Rotation::Forward,
            -1 => Rotation::Reverse,
            _ => Rotation::Unknown,
        }
    }

    /// Direction between two valid sectors
    fn between(prev: u8, next: u8) -> Self {
        let (Some(&p), Some(&n)) = (
            SECTOR_SEQUENCE_INDEX.get(prev as usize),
            SECTOR_SEQUENCE_INDEX.get(next as usize),
        ) else {
            return Rotation::Unknown;
        };
        if p == 255 || n == 255 {
            return Rotation::Unknown;
        }
        match (n + 6 - p) % 6 {
            1 => Rotation::Forward,
            5 => Rotation::Reverse,
            _ => Rotation::Unknown,
        }
    }
}

/// Committed estimator state
///
/// Written only by `init` and by sector transitions; queries only read.
pub struct HallEstimatorState {
    /// Current sector (1-6), 0 before the first valid decode
    sector: AtomicU8,
    /// System tick of the last accepted transition [ms]
    last_transition_ms: AtomicU32,
    /// Counter ticks spent in the most recently completed sector, 0 = unknown
    sector_duration: AtomicU32,
    /// `Rotation` as -1/0/1
    direction: AtomicI8,
}

impl HallEstimatorState {
    pub const fn new() -> Self {
        Self {
            sector: AtomicU8::new(0),
            last_transition_ms: AtomicU32::new(0),
            sector_duration: AtomicU32::new(0),
            direction: AtomicI8::new(0),
        }
    }
}

impl Default for HallEstimatorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the committed state for telemetry
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HallSnapshot {
    pub sector: u8,
    pub sector_duration: u32,
    pub last_transition_ms: u32,
    pub rotation: Rotation,
}

/// Hall sensor electrical angle/speed estimator
pub struct HallEstimator<I, T> {
    inputs: I,
    timer: T,
    config: HallConfig,
    state: HallEstimatorState,
}

impl<I: HallInputs, T: HallTimer> HallEstimator<I, T> {
    /// Create an estimator in the "unknown sector" state
    ///
    /// Call `init` once the sensors and timer are running.
    ///
    /// # Arguments
    /// * `inputs` - Hall sensor pins
    /// * `timer` - Capture counter and system tick
    /// * `config` - Timing parameters
    pub const fn new(inputs: I, timer: T, config: HallConfig) -> Self {
        Self {
            inputs,
            timer,
            config,
            state: HallEstimatorState::new(),
        }
    }

    /// Decode the instantaneous sector and start stall timing
    ///
    /// An invalid decode (0 or 7) leaves the estimator in sector 0, base angle 0.
    pub fn init(&self) {
        let raw = self.read_hall_state();
        let sector = if Self::is_valid_state(raw) {
            raw
        } else {
            warn!("Invalid hall state at startup: {}", raw);
            0
        };

        self.state.sector_duration.store(0, Ordering::Relaxed);
        self.state.direction.store(0, Ordering::Relaxed);
        self.state
            .last_transition_ms
            .store(self.timer.now_ms(), Ordering::Relaxed);
        self.state.sector.store(sector, Ordering::Relaxed);

        debug!("Hall estimator initialized: sector={}", sector);
    }

    /// Check if a hall state is valid
    ///
    /// # Returns
    /// `true` if state is valid (1-6), `false` otherwise
    pub fn is_valid_state(state: u8) -> bool {
        (1..=6).contains(&state)
    }

    /// Combine three sensor levels into a 3-bit state (A is the MSB)
    pub fn decode(a: bool, b: bool, c: bool) -> u8 {
        ((a as u8) << 2) | ((b as u8) << 1) | (c as u8)
    }

    /// Base electrical angle of a sector [deg]
    pub fn base_angle(sector: u8) -> f32 {
        HALL_ANGLE_TABLE
            .get(sector as usize)
            .copied()
            .unwrap_or(0.0)
    }

    fn read_hall_state(&self) -> u8 {
        let (a, b, c) = self.inputs.levels();
        Self::decode(a, b, c)
    }

    /// No transition within the stall timeout
    pub fn is_stalled(&self) -> bool {
        let last = self.state.last_transition_ms.load(Ordering::Relaxed);
        self.timer.now_ms().wrapping_sub(last) > self.config.stall_timeout_ms
    }

    /// Current electrical angle [deg], in [0, 360)
    ///
    /// Base angle of the current sector plus a linear interpolation of the
    /// elapsed fraction of the previous sector's duration (at most 60°).
    /// Stalled, or no duration measured yet: base angle only.
    pub fn electrical_angle_deg(&self) -> f32 {
        let sector = self.state.sector.load(Ordering::Relaxed);
        let base = Self::base_angle(sector);

        if self.is_stalled() {
            return base;
        }

        let duration = self.state.sector_duration.load(Ordering::Relaxed);
        let mut interpolated = 0.0;
        if duration > 0 {
            let fraction = self.timer.counter() as f32 / duration as f32;
            interpolated = fraction.min(1.0) * SECTOR_WIDTH_DEG;
        }

        let mut angle = base + interpolated;
        if angle >= 360.0 {
            angle -= 360.0;
        }
        angle
    }

    /// Mechanical speed magnitude [RPM], 0 when stalled or unmeasured
    ///
    /// RPM = (f_timer · 60) / (duration · 6 · pole_pairs)
    pub fn speed_rpm(&self) -> f32 {
        if self.is_stalled() {
            return 0.0;
        }

        let duration = self.state.sector_duration.load(Ordering::Relaxed);
        if duration == 0 || self.config.pole_pairs == 0 {
            return 0.0;
        }

        (self.config.timer_frequency_hz * 60.0)
            / (duration as f32 * SECTORS_PER_REV * self.config.pole_pairs as f32)
    }

    /// Speed with the sign of the detected rotation [RPM]
    ///
    /// Unknown direction reports the magnitude.
    pub fn signed_speed_rpm(&self) -> f32 {
        let speed = self.speed_rpm();
        match self.rotation() {
            Rotation::Reverse => -speed,
            Rotation::Forward | Rotation::Unknown => speed,
        }
    }

    /// Current sector (1-6), or 0 before the first valid decode
    pub fn current_sector(&self) -> u8 {
        self.state.sector.load(Ordering::Relaxed)
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::from_i8(self.state.direction.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> HallSnapshot {
        HallSnapshot {
            sector: self.state.sector.load(Ordering::Relaxed),
            sector_duration: self.state.sector_duration.load(Ordering::Relaxed),
            last_transition_ms: self.state.last_transition_ms.load(Ordering::Relaxed),
            rotation: self.rotation(),
        }
    }

    pub fn config(&self) -> &HallConfig {
        &self.config
    }
}

impl<I: HallInputs, T: HallTimer> SectorTransitionHandler for HallEstimator<I, T> {
    fn on_sector_transition(&self, sector_duration: u32) {
        self.state
            .sector_duration
            .store(sector_duration, Ordering::Relaxed);

        let new_sector = self.read_hall_state();
        if !Self::is_valid_state(new_sector) {
            // Glitch: keep the committed sector
            return;
        }

        let prev_sector = self.state.sector.load(Ordering::Relaxed);
        if new_sector != prev_sector {
            let rotation = Rotation::between(prev_sector, new_sector);
            self.state.direction.store(rotation.to_i8(), Ordering::Relaxed);
        }

        self.state.sector.store(new_sector, Ordering::Relaxed);
        self.state
            .last_transition_ms
            .store(self.timer.now_ms(), Ordering::Relaxed);

        trace!(
            "Hall edge: {} -> {}, duration={} ticks",
            prev_sector,
            new_sector,
            sector_duration
        );
    }
}
