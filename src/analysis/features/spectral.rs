// Spectral module - Frequency-domain feature extraction
//
// This module computes spectral features from the magnitude spectrum of the
// whole signal. Moments (centroid, spread, skewness, kurtosis) treat the
// normalized magnitude spectrum as a distribution over frequency.
//
// References:
// - Peeters, G. (2004). A large set of audio features for sound description
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

/// Spectral rolloff threshold (85% of spectral energy)
const ROLLOFF_THRESHOLD: f64 = 0.85;

/// Magnitudes below this are treated as zero
const MAGNITUDE_FLOOR: f64 = 1e-10;

/// Magnitude spectrum paired with its bin frequencies
pub struct Spectrum<'a> {
    magnitudes: &'a [f64],
    frequencies: &'a [f64],
}

/// Spectral distribution moments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralMoments {
    pub centroid: f64,
    pub spread: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl<'a> Spectrum<'a> {
    pub fn new(magnitudes: &'a [f64], frequencies: &'a [f64]) -> Self {
        debug_assert_eq!(magnitudes.len(), frequencies.len());
        Self {
            magnitudes,
            frequencies,
        }
    }

    fn magnitude_sum(&self) -> f64 {
        self.magnitudes.iter().sum()
    }

    /// Compute centroid, spread, skewness and kurtosis
    ///
    /// centroid = Σ f·|X| / Σ|X|, spread = sqrt(Σ (f-c)²·|X| / Σ|X|),
    /// skewness and kurtosis are the 3rd and 4th standardized moments.
    /// All four are 0 for an empty spectrum.
    pub fn moments(&self) -> SpectralMoments {
        let total = self.magnitude_sum();
        if total < MAGNITUDE_FLOOR {
            return SpectralMoments {
                centroid: 0.0,
                spread: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }

        let centroid = self.weighted_mean(|f| f) / total;
        let m2 = self.weighted_mean(|f| (f - centroid).powi(2)) / total;
        let m3 = self.weighted_mean(|f| (f - centroid).powi(3)) / total;
        let m4 = self.weighted_mean(|f| (f - centroid).powi(4)) / total;
        let spread = m2.sqrt();

        let (skewness, kurtosis) = if spread > MAGNITUDE_FLOOR {
            (m3 / spread.powi(3), m4 / spread.powi(4))
        } else {
            (0.0, 0.0)
        };

        SpectralMoments {
            centroid,
            spread,
            skewness,
            kurtosis,
        }
    }

    fn weighted_mean(&self, f: impl Fn(f64) -> f64) -> f64 {
        self.magnitudes
            .iter()
            .zip(self.frequencies)
            .map(|(&m, &freq)| f(freq) * m)
            .sum()
    }

    /// Frequency below which 85% of the spectral energy is contained
    pub fn rolloff(&self) -> f64 {
        let total_energy: f64 = self.magnitudes.iter().map(|m| m * m).sum();
        if total_energy < MAGNITUDE_FLOOR {
            return 0.0;
        }

        let threshold = ROLLOFF_THRESHOLD * total_energy;
        let mut cumulative_energy = 0.0;
        for (&mag, &freq) in self.magnitudes.iter().zip(self.frequencies) {
            cumulative_energy += mag * mag;
            if cumulative_energy >= threshold {
                return freq;
            }
        }

        // If we reach here, return Nyquist frequency
        self.frequencies.last().copied().unwrap_or(0.0)
    }

    /// Mean absolute deviation of frequency around the centroid
    pub fn bandwidth(&self, centroid: f64) -> f64 {
        let total = self.magnitude_sum();
        if total < MAGNITUDE_FLOOR {
            return 0.0;
        }
        self.weighted_mean(|f| (f - centroid).abs()) / total
    }

    /// Geometric over arithmetic mean of the magnitudes (0 tonal, 1 noise)
    pub fn flatness(&self) -> f64 {
        let non_zero: Vec<f64> = self
            .magnitudes
            .iter()
            .copied()
            .filter(|&mag| mag > MAGNITUDE_FLOOR)
            .collect();
        if non_zero.is_empty() {
            return 0.0;
        }

        let log_mean = non_zero.iter().map(|m| m.ln()).sum::<f64>() / non_zero.len() as f64;
        let arithmetic_mean = non_zero.iter().sum::<f64>() / non_zero.len() as f64;
        if arithmetic_mean > MAGNITUDE_FLOOR {
            (log_mean.exp() / arithmetic_mean).min(1.0)
        } else {
            0.0
        }
    }

    /// Population standard deviation of the magnitudes
    pub fn std_dev(&self) -> f64 {
        let n = self.magnitudes.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.magnitude_sum() / n as f64;
        let var = self
            .magnitudes
            .iter()
            .map(|m| (m - mean).powi(2))
            .sum::<f64>()
            / n as f64;
        var.sqrt()
    }

    /// Least-squares slope of magnitude against frequency
    pub fn slope(&self) -> f64 {
        let n = self.magnitudes.len() as f64;
        if n < 2.0 {
            return 0.0;
        }
        let mean_f = self.frequencies.iter().sum::<f64>() / n;
        let mean_m = self.magnitude_sum() / n;
        let (cov, var) = self
            .magnitudes
            .iter()
            .zip(self.frequencies)
            .fold((0.0, 0.0), |(cov, var), (&m, &f)| {
                (cov + (f - mean_f) * (m - mean_m), var + (f - mean_f).powi(2))
            });
        if var > 0.0 {
            cov / var
        } else {
            0.0
        }
    }

    /// Spectral decrease: Σ_{k>=1} (|X[k]| - |X[0]|) / k over Σ_{k>=1} |X[k]|
    pub fn decrease(&self) -> f64 {
        if self.magnitudes.len() < 2 {
            return 0.0;
        }
        let first = self.magnitudes[0];
        let tail = &self.magnitudes[1..];
        let denominator: f64 = tail.iter().sum();
        if denominator < MAGNITUDE_FLOOR {
            return 0.0;
        }
        let numerator: f64 = tail
            .iter()
            .enumerate()
            .map(|(i, &m)| (m - first) / (i + 1) as f64)
            .sum();
        numerator / denominator
    }

    /// Frequency of the strongest non-DC bin
    pub fn dominant_frequency(&self) -> f64 {
        self.magnitudes
            .iter()
            .zip(self.frequencies)
            .skip(1)
            .fold((0.0f64, 0.0f64), |(best_mag, best_freq), (&m, &f)| {
                if m > best_mag {
                    (m, f)
                } else {
                    (best_mag, best_freq)
                }
            })
            .1
    }
}
