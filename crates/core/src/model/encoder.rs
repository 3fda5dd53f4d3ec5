use crate::config::EncoderParams;

pub const FAST_COLUMNS: usize = 8;
pub const SLOW_COLUMNS: usize = 2;
pub const COLUMNS: usize = FAST_COLUMNS + SLOW_COLUMNS;

/// Slow bars never exceed this fraction of the fast bars' range.
pub const SLOW_CEILING: f64 = 0.33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSample {
    pub kind: ColumnKind,
    /// Bar height as a fraction of the maximum fast bar height.
    pub fraction: f64,
}

/// Temporal current columns: eight volatile fast channels and two gentle
/// slow anchors, all closed-form in the clock.
#[derive(Debug, Clone)]
pub struct TemporalEncoder {
    params: EncoderParams,
}

impl TemporalEncoder {
    pub fn new(params: EncoderParams) -> Self {
        Self { params }
    }

    pub fn column(&self, clock: f64, index: usize) -> ColumnSample {
        let i = index as f64;
        if index < FAST_COLUMNS {
            let rate = self.params.fast_rate + self.params.fast_rate_step * i;
            ColumnSample {
                kind: ColumnKind::Fast,
                fraction: 0.25 + 0.75 * (clock * rate + 0.9 * i).sin().abs(),
            }
        } else {
            ColumnSample {
                kind: ColumnKind::Slow,
                fraction: SLOW_CEILING
                    * (0.55 + 0.45 * (clock * self.params.slow_rate + 1.1 * i).sin().abs()),
            }
        }
    }

    pub fn columns(&self, clock: f64) -> impl Iterator<Item = ColumnSample> + '_ {
        (0..COLUMNS).map(move |i| self.column(clock, i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_stay_in_band() {
        let enc = TemporalEncoder::new(EncoderParams::default());
        for step in 0..500 {
            let t = step as f64 * 0.037;
            for (i, col) in enc.columns(t).enumerate() {
                match col.kind {
                    ColumnKind::Fast => {
                        assert!(i < FAST_COLUMNS);
                        assert!((0.25..=1.0).contains(&col.fraction));
                    }
                    ColumnKind::Slow => {
                        assert!(i >= FAST_COLUMNS);
                        assert!(col.fraction >= SLOW_CEILING * 0.55 - 1e-12);
                        assert!(col.fraction <= SLOW_CEILING + 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn first_fast_column_at_rest() {
        let enc = TemporalEncoder::new(EncoderParams::default());
        assert_eq!(enc.column(0.0, 0).fraction, 0.25);
    }
}
