/// Standard rectifier.
pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Passes `leak · x` below zero but never drops under `floor`.
pub fn leaky_clamp(x: f64, leak: f64, floor: f64) -> f64 {
    if x >= 0.0 { x } else { (leak * x).max(floor) }
}

/// Half-width of the swept input domain.
pub const SWEEP_EXTENT: f64 = 1.2;

/// Input the animated dot sits at: a sawtooth over
/// `[-SWEEP_EXTENT, SWEEP_EXTENT]` with the given period.
pub fn sweep_position(clock: f64, period: f64) -> f64 {
    let phase = clock.rem_euclid(period) / period;
    if phase.is_finite() {
        -SWEEP_EXTENT + phase * 2.0 * SWEEP_EXTENT
    } else {
        -SWEEP_EXTENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaky_clamp_matches_relu_above_zero() {
        for x in [0.0, 0.3, 1.1] {
            assert_eq!(leaky_clamp(x, 0.1, -0.1), relu(x));
        }
    }

    #[test]
    fn leaky_clamp_leaks_then_floors() {
        assert!((leaky_clamp(-0.5, 0.1, -0.1) + 0.05).abs() < 1e-12);
        assert_eq!(leaky_clamp(-1.0, 0.1, -0.1), -0.1);
        assert_eq!(leaky_clamp(-3.0, 0.1, -0.1), -0.1);
        assert_eq!(relu(-3.0), 0.0);
    }

    #[test]
    fn sweep_wraps_every_period() {
        assert_eq!(sweep_position(0.0, 4.0), -1.2);
        assert!((sweep_position(2.0, 4.0)).abs() < 1e-12);
        assert_eq!(sweep_position(4.0, 4.0), -1.2);
        assert_eq!(sweep_position(f64::NAN, 4.0), -1.2);
    }
}
