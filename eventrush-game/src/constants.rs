//! Centralized tuning constants for the event simulation and the planner.
//!
//! Values that a game file may override (horizon, overshoot, time modifier)
//! only provide defaults here; the rest are fixed by the replay contract.

// Simulation defaults ------------------------------------------------------
/// Default event length: three days.
pub const DEFAULT_EVENT_SECS: f64 = 3.0 * 24.0 * 60.0 * 60.0;
/// Seconds added to every positive time-to-level estimate.
pub const DEFAULT_OVERSHOOT_SECS: f64 = 20.0;
/// Constant added once to the summed time factor.
pub const DEFAULT_TIME_MODIFIER: f64 = -0.25;
pub const DEFAULT_POINTS_NAME: &str = "points";
pub const DEFAULT_MODE_LABELS: [&str; 2] = ["a", "z"];

// Replay -------------------------------------------------------------------
/// Padding added after rounding a wait up to whole seconds.
pub const REPLAY_WAIT_PADDING_SECS: f64 = 1.0;
/// Returned by `upg_time_after_upg` when the second upgrade becomes unreachable.
pub const UNREACHABLE_DELAY_SECS: f64 = 999_999.0;
/// Spare-time score (in seconds) for a plan whose point rate ends at zero.
pub const UNREACHABLE_SPARE_SECS: f64 = -1.0e30;
pub const SECS_PER_HOUR: f64 = 60.0 * 60.0;

// Random restarts ----------------------------------------------------------
/// Flat weight every reachable option receives.
pub const RANDOM_WEIGHT_FLOOR: f64 = 0.25;
/// Half-life of an option's weight as its time-to-level grows.
pub const RANDOM_WEIGHT_HALF_LIFE_SECS: f64 = 60.0 * 60.0;

// Search -------------------------------------------------------------------
pub const DEFAULT_MAX_DEPTH: usize = 1;
/// Random restarts give up deepening once the score is below this many hours.
pub const DEFAULT_DEPTH_THRESHOLD_HOURS: f64 = -10.0;
