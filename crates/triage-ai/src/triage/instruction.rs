use super::urgency::UrgencyLevel;

pub const CRITICAL_INSTRUCTION: &str = "CRITICAL: Stay calm. If trapped, conserve air, tap on pipes/walls, and share your exact location. If bleeding, apply firm pressure with cloth. Do not use elevators. Await rescue.";
pub const HIGH_INSTRUCTION: &str = "HIGH: Move to a safer area if possible. Check injuries, turn off gas/electricity if safe, and follow local emergency instructions.";
pub const MEDIUM_INSTRUCTION: &str =
    "MEDIUM: Avoid damaged structures. Keep phone battery, prepare essentials, and monitor official updates.";
pub const LOW_INSTRUCTION: &str =
    "LOW: Remain alert. Stay away from unstable areas and be ready for aftershocks.";

/// Safety guidance read back to the caller.
pub const fn instruction_for_level(level: UrgencyLevel) -> &'static str {
    match level {
        UrgencyLevel::Critical => CRITICAL_INSTRUCTION,
        UrgencyLevel::High => HIGH_INSTRUCTION,
        UrgencyLevel::Medium => MEDIUM_INSTRUCTION,
        UrgencyLevel::Low => LOW_INSTRUCTION,
    }
}

/// Goes through [`UrgencyLevel::from_score`] so level and template share one
/// set of thresholds.
pub const fn instruction_for(urgency: u8) -> &'static str {
    instruction_for_level(UrgencyLevel::from_score(urgency))
}
