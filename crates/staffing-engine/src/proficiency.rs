//! Skill proficiency to efficiency conversion
//!
//! ```text
//! efficiency = clamp(level / 5, 0, 1) × (certified ? 1.2 : 1.0), capped at 1.5
//! ```
//!
//! An efficiency of 1.0 means one clock hour covers one hour of demand.

use crate::types::WorkerSkillProfile;

/// Highest proficiency level on the roster scale
pub const MAX_PROFICIENCY_LEVEL: u8 = 5;

/// Multiplier applied to certified workers
pub const CERTIFICATION_BONUS: f64 = 1.2;

/// Upper bound of any efficiency score
pub const MAX_EFFICIENCY: f64 = 1.5;

/// Efficiency multiplier for a proficiency level and certification flag
pub fn efficiency(proficiency_level: u8, certified: bool) -> f64 {
    let base = (f64::from(proficiency_level) / f64::from(MAX_PROFICIENCY_LEVEL)).clamp(0.0, 1.0);
    let bonus = if certified { CERTIFICATION_BONUS } else { 1.0 };
    (base * bonus).min(MAX_EFFICIENCY)
}

/// Efficiency multiplier of a skill profile
pub fn profile_efficiency(profile: &WorkerSkillProfile) -> f64 {
    efficiency(profile.proficiency_level, profile.certified)
}
