// Filter module - IIR filter design and zero-phase filtering
//
// Filters are designed from an analog prototype (Butterworth or Chebyshev
// type I), moved to the digital domain with a prewarped bilinear transform,
// and kept as cascaded second-order sections for numerical stability.
//
// Zero-phase filtering runs the cascade forward and backward over an
// odd-extended copy of the signal, starting each pass from the steady-state
// response to the edge sample so the edges carry no start-up transient.
//
// All arithmetic is f64; callers convert at the boundary.

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

use crate::error::AnalysisError;

/// Response type of a designed filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Highpass,
}

/// One second-order section, normalized so that `a[0] == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    fn normalized(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [1.0, a[1] / a0, a[2] / a0],
        }
    }

    /// Gain at DC (z = 1)
    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (self.a[0] + self.a[1] + self.a[2])
    }

    /// Steady-state transposed direct form II state for a unit step input
    fn step_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        let z2 = self.b[2] - self.a[2] * g;
        let z1 = self.b[1] - self.a[1] * g + z2;
        [z1, z2]
    }
}

/// Cascade of second-order sections
#[derive(Debug, Clone, PartialEq)]
pub struct Sos {
    sections: Vec<Biquad>,
}

impl Sos {
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Edge extension used by [`Sos::filtfilt`]
    pub fn padlen(&self) -> usize {
        let n = self.sections.len();
        let zero_b = self.sections.iter().filter(|s| s.b[2] == 0.0).count();
        let zero_a = self.sections.iter().filter(|s| s.a[2] == 0.0).count();
        3 * (2 * n + 1 - zero_b.min(zero_a))
    }

    /// Causal filtering from rest
    pub fn filter(&self, x: &[f64]) -> Vec<f64> {
        let mut state = vec![[0.0; 2]; self.sections.len()];
        self.run(x, &mut state)
    }

    /// Zero-phase forward-backward filtering
    ///
    /// Returns `SignalTooShort` when the signal is not longer than
    /// [`Sos::padlen`].
    pub fn filtfilt(&self, x: &[f64]) -> Result<Vec<f64>, AnalysisError> {
        let padlen = self.padlen();
        if x.len() <= padlen {
            return Err(AnalysisError::SignalTooShort {
                len: x.len(),
                required: padlen,
            });
        }

        let ext = odd_extend(x, padlen);
        let zi = self.steady_state();

        let mut state = scaled_state(&zi, ext[0]);
        let mut forward = self.run(&ext, &mut state);

        forward.reverse();
        let mut state = scaled_state(&zi, forward[0]);
        let mut backward = self.run(&forward, &mut state);
        backward.reverse();

        Ok(backward[padlen..backward.len() - padlen].to_vec())
    }

    /// Per-section initial state for a unit step through the whole cascade
    fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z1, z2] = section.step_state();
                let zi = [z1 * scale, z2 * scale];
                scale *= section.dc_gain();
                zi
            })
            .collect()
    }

    fn run(&self, x: &[f64], state: &mut [[f64; 2]]) -> Vec<f64> {
        let mut y = x.to_vec();
        for (section, z) in self.sections.iter().zip(state.iter_mut()) {
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            for sample in y.iter_mut() {
                let input = *sample;
                let output = b0 * input + z[0];
                z[0] = b1 * input - a1 * output + z[1];
                z[1] = b2 * input - a2 * output;
                *sample = output;
            }
        }
        y
    }
}

fn scaled_state(zi: &[[f64; 2]], x0: f64) -> Vec<[f64; 2]> {
    zi.iter().map(|z| [z[0] * x0, z[1] * x0]).collect()
}

/// Odd extension: reflect about the end points
fn odd_extend(x: &[f64], padlen: usize) -> Vec<f64> {
    let n = x.len();
    let first = x[0];
    let last = x[n - 1];

    let mut ext = Vec::with_capacity(n + 2 * padlen);
    ext.extend((1..=padlen).rev().map(|i| 2.0 * first - x[i]));
    ext.extend_from_slice(x);
    ext.extend((1..=padlen).map(|i| 2.0 * last - x[n - 1 - i]));
    ext
}

/// Butterworth design
///
/// `wn` is the cutoff normalized to Nyquist, in (0, 1).
pub fn butter(order: usize, wn: f64, kind: FilterKind) -> Result<Sos, AnalysisError> {
    let poles = (0..order)
        .map(|k| {
            let theta = PI * (2 * k + order + 1) as f64 / (2 * order) as f64;
            Complex64::from_polar(1.0, theta)
        })
        .collect::<Vec<_>>();
    design(&poles, 1.0, wn, kind)
}

/// Chebyshev type I low-pass design
///
/// `ripple_db` is the peak-to-peak passband ripple; `wn` is the passband
/// edge normalized to Nyquist, in (0, 1).
pub fn cheby1(order: usize, ripple_db: f64, wn: f64) -> Result<Sos, AnalysisError> {
    let eps = (10f64.powf(ripple_db / 10.0) - 1.0).sqrt();
    let mu = (1.0 / eps).asinh() / order as f64;
    let poles = (0..order)
        .map(|k| {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            Complex64::new(-mu.sinh() * theta.sin(), mu.cosh() * theta.cos())
        })
        .collect::<Vec<_>>();
    let gain = if order % 2 == 0 {
        1.0 / (1.0 + eps * eps).sqrt()
    } else {
        1.0
    };
    design(&poles, gain, wn, FilterKind::Lowpass)
}

/// Band-limit with a low-pass (`low == 0`) or a high-pass/low-pass cascade
pub fn band(order: usize, low_hz: f64, high_hz: f64, sample_rate: f64) -> Result<Sos, AnalysisError> {
    let nyquist = sample_rate / 2.0;
    let mut sos = butter(order, high_hz / nyquist, FilterKind::Lowpass)?;
    if low_hz > 0.0 {
        let highpass = butter(order, low_hz / nyquist, FilterKind::Highpass)?;
        sos.sections.extend(highpass.sections);
    }
    Ok(sos)
}

/// Bilinear transform of an analog prototype with unit cutoff
///
/// Conjugate pole pairs become one biquad each (using the pole with positive
/// imaginary part); a real pole becomes a first-order section.
fn design(poles: &[Complex64], gain: f64, wn: f64, kind: FilterKind) -> Result<Sos, AnalysisError> {
    if !(wn > 0.0 && wn < 1.0) {
        return Err(AnalysisError::InvalidCutoff { normalized: wn });
    }

    let warped = (PI * wn / 2.0).tan();
    let mut sections = Vec::with_capacity(poles.len().div_ceil(2));

    for pole in poles {
        if pole.im > 1e-12 {
            let mag2 = pole.norm_sqr();
            let (c1, c0, b) = match kind {
                FilterKind::Lowpass => {
                    let c0 = mag2 * warped * warped;
                    (-2.0 * pole.re * warped, c0, [c0, 2.0 * c0, c0])
                }
                FilterKind::Highpass => (
                    -2.0 * pole.re * warped / mag2,
                    warped * warped / mag2,
                    [1.0, -2.0, 1.0],
                ),
            };
            let a = [1.0 + c1 + c0, 2.0 * c0 - 2.0, 1.0 - c1 + c0];
            sections.push(Biquad::normalized(b, a));
        } else if pole.im.abs() <= 1e-12 {
            let sigma = -pole.re;
            let (c, b) = match kind {
                FilterKind::Lowpass => {
                    let c = sigma * warped;
                    (c, [c, c, 0.0])
                }
                FilterKind::Highpass => (warped / sigma, [1.0, -1.0, 0.0]),
            };
            sections.push(Biquad::normalized(b, [1.0 + c, c - 1.0, 0.0]));
        }
    }

    if let Some(first) = sections.first_mut() {
        for coeff in first.b.iter_mut() {
            *coeff *= gain;
        }
    }

    Ok(Sos { sections })
}
