//! Pure battery arithmetic with no hidden state.

/// Fully charged battery level.
pub const FULL: u8 = 100;

/// Battery after moving `speed` cells at `rate` units per cell. Clamped at 0.
pub fn discharge(battery: u8, rate: u8, speed: u8) -> u8 {
    battery.saturating_sub(rate.saturating_mul(speed))
}

/// Battery after one tick on a station. Clamped at [`FULL`].
pub fn charge(battery: u8, rate: u8) -> u8 {
    battery.saturating_add(rate).min(FULL)
}

/// Whether a robot should abandon its task and go charge.
pub fn is_low(battery: u8, threshold: u8) -> bool {
    battery <= threshold
}

pub fn is_depleted(battery: u8) -> bool {
    battery == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discharge_clamps_at_zero() {
        assert_eq!(discharge(31, 1, 1), 30);
        assert_eq!(discharge(1, 5, 2), 0);
        assert_eq!(discharge(0, 1, 1), 0);
    }

    #[test]
    fn test_charge_clamps_at_full() {
        assert_eq!(charge(30, 5), 35);
        assert_eq!(charge(98, 5), FULL);
        assert_eq!(charge(250, 5), FULL);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(!is_low(31, 30));
        assert!(is_low(30, 30));
    }
}
