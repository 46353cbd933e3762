//! Construction of non-uniform quantization tables by centroid splitting.
//!
//! Starting from a single centroid at the global mean, every round splits each
//! centroid `c` into `c - ε` and `c + ε`, reassigns every sample to its nearest
//! centroid (the lowest index wins a tie) and moves each non-empty cluster's
//! centroid to the mean of its samples. Rounds repeat until there are
//! `2^bit_size` centroids. This is a greedy approximation of a Lloyd-Max
//! quantizer: it is sensitive to ε and to the split order, and both are fixed
//! here so the same image always yields the same table.
//!
//! Samples are 8-bit, so the reassignment runs over the 256-bin intensity
//! histogram instead of the raw samples. Cluster sums are exact integers, which
//! makes the (parallel) histogram reduction order-independent.

use rayon::prelude::*;

use crate::config::LossyConfig;
use crate::error::SqueezeError;

/// Number of distinct 8-bit intensities.
const INTENSITIES: usize = 256;
/// Largest supported bit budget.
pub const MAX_BIT_SIZE: u32 = 8;

/// One quantization level: samples in `[low, high)` are replaced by `centroid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub low: i32,
    pub high: i32,
    pub level: usize,
    pub centroid: u8,
}

impl Interval {
    pub fn contains(&self, value: i32) -> bool {
        self.low <= value && value < self.high
    }
}

/// An ordered set of intervals partitioning `[0, full_scale)`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizationTable {
    intervals: Vec<Interval>,
    centroids: Vec<f64>,
    full_scale: u16,
}

//==================================================================================
// 1. Histogram & Centroid Splitting
//==================================================================================

/// Counts samples per intensity, clipping them to `full_scale - 1`.
pub(crate) fn intensity_histogram(samples: &[u8], full_scale: u16) -> [u64; INTENSITIES] {
    let ceiling = (full_scale.max(1) - 1) as usize;
    samples
        .par_chunks(1 << 16)
        .fold(
            || [0u64; INTENSITIES],
            |mut hist, chunk| {
                for &sample in chunk {
                    hist[(sample as usize).min(ceiling)] += 1;
                }
                hist
            },
        )
        .reduce(
            || [0u64; INTENSITIES],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x += y;
                }
                a
            },
        )
}

/// Index of the centroid nearest to `value`; the first one wins a tie.
fn nearest(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (k, &c) in centroids.iter().enumerate() {
        let distance = (value - c).abs();
        if distance < best_distance {
            best = k;
            best_distance = distance;
        }
    }
    best
}

/// Runs centroid splitting until `levels` centroids exist. Returns them sorted.
pub fn split_centroids(hist: &[u64; INTENSITIES], levels: usize, epsilon: f64) -> Vec<f64> {
    let total: u64 = hist.iter().sum();
    let weighted: u64 = hist.iter().enumerate().map(|(v, &n)| v as u64 * n).sum();
    let mut centroids = vec![weighted as f64 / total as f64];
    let mut rounds = 0;

    while centroids.len() < levels {
        centroids = centroids.iter().flat_map(|&c| [c - epsilon, c + epsilon]).collect();

        let mut sums = vec![0u64; centroids.len()];
        let mut counts = vec![0u64; centroids.len()];
        for (value, &n) in hist.iter().enumerate().filter(|(_, &n)| n > 0) {
            let k = nearest(&centroids, value as f64);
            sums[k] += value as u64 * n;
            counts[k] += n;
        }
        for (k, centroid) in centroids.iter_mut().enumerate() {
            if counts[k] > 0 {
                *centroid = sums[k] as f64 / counts[k] as f64;
            }
        }

        rounds += 1;
        let empty = counts.iter().filter(|&&n| n == 0).count();
        crate::log_metric!(
            "event" = "centroid_split",
            "round" = rounds,
            "centroids" = centroids.len(),
            "empty_clusters" = empty,
        );
    }

    centroids.sort_by(|a, b| a.total_cmp(b));
    centroids
}

//==================================================================================
// 2. Table Construction & Lookup
//==================================================================================

impl QuantizationTable {
    /// Builds a `2^bit_size`-level table from 8-bit samples.
    pub fn build(samples: &[u8], bit_size: u32, config: &LossyConfig) -> Result<Self, SqueezeError> {
        if samples.is_empty() {
            return Err(SqueezeError::EmptyInput(
                "cannot build a quantization table from no samples".to_string(),
            ));
        }
        if bit_size > MAX_BIT_SIZE {
            return Err(SqueezeError::InvalidParameter(format!(
                "bit size must be at most {}, got {}",
                MAX_BIT_SIZE, bit_size
            )));
        }
        if config.full_scale == 0 || config.full_scale as usize > INTENSITIES {
            return Err(SqueezeError::InvalidParameter(format!(
                "full scale must be in 1..={}, got {}",
                INTENSITIES, config.full_scale
            )));
        }

        let levels = 1usize << bit_size;
        let hist = intensity_histogram(samples, config.full_scale);
        let centroids = split_centroids(&hist, levels, config.epsilon);
        Ok(Self::from_centroids(centroids, config.full_scale))
    }

    /// Derives the intervals from sorted centroids: boundaries are midpoints,
    /// the first is 0 and the last is `full_scale`.
    pub fn from_centroids(centroids: Vec<f64>, full_scale: u16) -> Self {
        let levels = centroids.len();
        let ceiling = full_scale as f64;
        let mut boundaries = vec![0.0f64; levels + 1];
        boundaries[levels] = ceiling;
        for i in 1..levels {
            boundaries[i] = 0.5 * (centroids[i - 1] + centroids[i]);
        }

        let intervals = (0..levels)
            .map(|i| {
                let high = if i + 1 < levels {
                    boundaries[i + 1].floor() as i32
                } else {
                    full_scale as i32
                };
                Interval {
                    low: boundaries[i].floor() as i32,
                    high,
                    level: i,
                    centroid: centroids[i].round_ties_even().clamp(0.0, u8::MAX as f64) as u8,
                }
            })
            .collect();

        Self {
            intervals,
            centroids,
            full_scale,
        }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// The unrounded, sorted centroids the table was built from.
    pub fn centroids(&self) -> &[f64] {
        &self.centroids
    }

    pub fn levels(&self) -> usize {
        self.intervals.len()
    }

    pub fn full_scale(&self) -> u16 {
        self.full_scale
    }

    /// The interval `value` falls into, if any.
    pub fn level_for(&self, value: u8) -> Option<&Interval> {
        self.intervals.iter().find(|interval| interval.contains(value as i32))
    }

    /// Maps every intensity to its reconstruction value. Intensities outside
    /// every interval map to 0.
    pub fn lookup(&self) -> [u8; INTENSITIES] {
        let mut lut = [0u8; INTENSITIES];
        for (value, slot) in lut.iter_mut().enumerate() {
            if let Some(interval) = self.level_for(value as u8) {
                *slot = interval.centroid;
            }
        }
        lut
    }

    /// Replaces every sample with its level's centroid.
    pub fn apply(&self, samples: &[u8]) -> Vec<u8> {
        let lut = self.lookup();
        samples.par_iter().map(|&s| lut[s as usize]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(repeats: usize) -> Vec<u8> {
        (0..repeats).flat_map(|_| 0..=255u8).collect()
    }

    #[test]
    fn test_intervals_partition_the_range() {
        let samples = gradient(2);
        for bit_size in 0..=4 {
            let table = QuantizationTable::build(&samples, bit_size, &LossyConfig::default()).unwrap();
            let intervals = table.intervals();
            assert_eq!(intervals.len(), 1 << bit_size);
            assert_eq!(intervals[0].low, 0);
            assert_eq!(intervals.last().unwrap().high, 256);
            for pair in intervals.windows(2) {
                assert_eq!(pair[0].high, pair[1].low);
                assert!(pair[0].centroid <= pair[1].centroid);
            }
        }
    }

    #[test]
    fn test_two_level_split_of_a_gradient() {
        let table = QuantizationTable::build(&gradient(1), 1, &LossyConfig::default()).unwrap();
        assert_eq!(table.centroids(), &[63.5, 191.5]);
        let intervals = table.intervals();
        assert_eq!((intervals[0].low, intervals[0].high, intervals[0].centroid), (0, 127, 64));
        assert_eq!((intervals[1].low, intervals[1].high, intervals[1].centroid), (127, 256, 192));
        assert_eq!(table.level_for(126).unwrap().level, 0);
        assert_eq!(table.level_for(127).unwrap().level, 1);
    }

    #[test]
    fn test_two_clusters_are_reproduced_exactly() {
        let samples = [0u8, 0, 0, 255, 255, 255];
        let table = QuantizationTable::build(&samples, 1, &LossyConfig::default()).unwrap();
        assert_eq!(table.apply(&samples), samples.to_vec());
    }

    #[test]
    fn test_single_level_uses_the_mean() {
        let table = QuantizationTable::build(&[10, 20, 30, 41], 0, &LossyConfig::default()).unwrap();
        assert_eq!(table.levels(), 1);
        assert_eq!(table.apply(&[0, 255]), vec![25, 25]);
    }

    #[test]
    fn test_constant_image_keeps_empty_levels() {
        let table = QuantizationTable::build(&[7u8; 50], 2, &LossyConfig::default()).unwrap();
        assert_eq!(table.levels(), 4);
        assert!(table.centroids().contains(&7.0));
        let applied = table.apply(&[7u8; 5]);
        assert!(applied.iter().all(|&v| v == applied[0]));
    }

    #[test]
    fn test_invalid_inputs() {
        let config = LossyConfig::default();
        assert!(matches!(
            QuantizationTable::build(&[], 2, &config),
            Err(SqueezeError::EmptyInput(_))
        ));
        assert!(matches!(
            QuantizationTable::build(&[1, 2], 9, &config),
            Err(SqueezeError::InvalidParameter(_))
        ));
    }
}
