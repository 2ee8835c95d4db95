// Deterministic, portable pseudo-random number generator for line generation.
//
// xoshiro256++ (Blackman & Vigna, 2019) seeded through SplitMix64. Every
// stochastic decision in the scheduler (formula draws, weighted picks) goes
// through `LineRng`, so one integer seed fully determines a generated line.
//
// **Critical constraint: determinism.** Same seed and same call sequence must
// give identical output on every platform. The integer core never touches
// floats; `next_f64` derives its float from the top 53 bits only.

use serde::{Deserialize, Serialize};

/// Seeded xoshiro256++ stream. One instance per scheduling run; never shared
/// between concurrent runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineRng {
    s: [u64; 4],
}

impl LineRng {
    /// Create a stream from a `u64` seed. Equal seeds give equal streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let s = [
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
        ];
        LineRng { s }
    }

    /// Next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.s;
        let result = s0.wrapping_add(s3).rotate_left(23).wrapping_add(s0);

        let t = s1 << 17;
        let mut next = [s0, s1, s2 ^ s0, s3 ^ s1];
        next[1] ^= next[2];
        next[0] ^= next[3];
        next[2] ^= t;
        next[3] = next[3].rotate_left(45);
        self.s = next;

        result
    }

    /// Uniform `f64` in [0, 1), built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        assert!(low < high, "range_usize: low must be less than high");
        let span = (high - low) as u64;
        if span.is_power_of_two() {
            return low + (self.next_u64() & (span - 1)) as usize;
        }
        let threshold = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % span) as usize;
            }
        }
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Negative and NaN weights count as zero. Returns `None` when nothing
    /// carries positive weight, leaving the fallback to the caller. Consumes
    /// exactly one draw whenever it returns `Some`.
    pub fn choice_weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().copied().map(clean_weight).sum();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let r = self.next_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for (i, &w) in weights.iter().enumerate() {
            let w = clean_weight(w);
            if w <= 0.0 {
                continue;
            }
            cumulative += w;
            last_positive = Some(i);
            if r < cumulative {
                return Some(i);
            }
        }
        // Float accumulation can leave `r` a hair above the final sum.
        last_positive
    }
}

fn clean_weight(w: f64) -> f64 {
    if w.is_nan() || w < 0.0 { 0.0 } else { w }
}

/// SplitMix64 step, used only to expand the seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = LineRng::new(7);
        let mut b = LineRng::new(7);
        for _ in 0..500 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = LineRng::new(7);
        let mut b = LineRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_stays_in_unit_interval() {
        let mut rng = LineRng::new(2024);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = LineRng::new(31);
        for _ in 0..10_000 {
            let v = rng.range_usize(3, 10);
            assert!((3..10).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn weighted_choice_skips_zero_weights() {
        let mut rng = LineRng::new(5);
        for _ in 0..1000 {
            let pick = rng.choice_weighted(&[0.0, 1.0, 0.0, 2.0]).unwrap();
            assert!(pick == 1 || pick == 3, "picked zero-weight index {pick}");
        }
    }

    #[test]
    fn weighted_choice_none_when_all_zero() {
        let mut rng = LineRng::new(5);
        assert_eq!(rng.choice_weighted(&[]), None);
        assert_eq!(rng.choice_weighted(&[0.0, -1.0, f64::NAN]), None);
    }

    #[test]
    fn weighted_choice_follows_weights() {
        let mut rng = LineRng::new(99);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[rng.choice_weighted(&[1.0, 3.0]).unwrap()] += 1;
        }
        let heavy = counts[1] as f64 / 10_000.0;
        assert!(
            (0.70..0.80).contains(&heavy),
            "weight 3 of 4 should land ~75%, got {:.1}%",
            heavy * 100.0
        );
    }

    #[test]
    fn serialized_state_resumes_stream() {
        let mut rng = LineRng::new(42);
        for _ in 0..50 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: LineRng = serde_json::from_str(&json).unwrap();
        for _ in 0..50 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
