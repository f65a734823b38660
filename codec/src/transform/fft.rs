//! FFT plans for arbitrary lengths.
//!
//! Lengths whose prime factors are all small run a mixed-radix
//! decimation-in-time transform. Any other length is computed with
//! Bluestein's chirp-z algorithm on a power-of-two plan, so every length
//! stays O(n log n).

use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// Complex number in rectangular form.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };

    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns `e^(i * angle)`.
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn conj(self) -> Self {
        Self::new(self.re, -self.im)
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// Largest prime factor handled by a direct butterfly. Lengths with a larger
/// prime factor go through Bluestein's algorithm.
const MAX_DIRECT_RADIX: usize = 7;

/// Precomputed FFT plan for one transform length.
///
/// The plan is immutable; any number of threads may run transforms on it.
#[derive(Debug, Clone)]
pub struct Fft {
    n: usize,
    plan: Plan,
}

#[derive(Debug, Clone)]
enum Plan {
    /// Decimation in time over the prime factors of `n`.
    MixedRadix {
        factors: Vec<usize>,
        roots: Vec<Complex>,
    },
    /// Chirp-z convolution through a power-of-two plan.
    Bluestein(Box<Bluestein>),
}

#[derive(Debug, Clone)]
struct Bluestein {
    /// `e^(-i pi k^2 / n)` for `k < n`.
    chirp: Vec<Complex>,
    /// Forward transform of the conjugate chirp, wrapped to the inner length.
    kernel: Vec<Complex>,
    inner: Fft,
}

impl Fft {
    /// Builds a plan for length `n` (must be positive).
    pub fn new(n: usize) -> Self {
        let factors = factorize(n);
        if factors.iter().any(|&p| p > MAX_DIRECT_RADIX) {
            return Self::bluestein(n);
        }
        Self::mixed_radix(n, factors)
    }

    fn mixed_radix(n: usize, factors: Vec<usize>) -> Self {
        let roots = (0..n)
            .map(|m| Complex::from_angle(-2.0 * PI * m as f64 / n as f64))
            .collect();
        Self {
            n,
            plan: Plan::MixedRadix { factors, roots },
        }
    }

    fn bluestein(n: usize) -> Self {
        let m = (2 * n - 1).next_power_of_two();
        let inner = Self::mixed_radix(m, factorize(m));

        // k^2 mod 2n keeps the angle small for large k.
        let chirp: Vec<Complex> = (0..n)
            .map(|k| {
                let k2 = (k * k) % (2 * n);
                Complex::from_angle(-PI * k2 as f64 / n as f64)
            })
            .collect();

        let mut kernel = vec![Complex::ZERO; m];
        kernel[0] = chirp[0].conj();
        for k in 1..n {
            kernel[k] = chirp[k].conj();
            kernel[m - k] = chirp[k].conj();
        }
        inner.forward(&mut kernel);

        Self {
            n,
            plan: Plan::Bluestein(Box::new(Bluestein {
                chirp,
                kernel,
                inner,
            })),
        }
    }

    /// Forward DFT, `X[k] = sum x[j] e^(-2 pi i jk / n)`.
    pub fn forward(&self, data: &mut [Complex]) {
        if self.n <= 1 {
            return;
        }
        match &self.plan {
            Plan::MixedRadix { factors, roots } => {
                let input = data.to_vec();
                self.work(roots, &input, 0, 1, data, factors);
            }
            Plan::Bluestein(b) => b.forward(data),
        }
    }

    /// Inverse DFT, scaled by `1/n`.
    pub fn inverse(&self, data: &mut [Complex]) {
        for v in data.iter_mut() {
            *v = v.conj();
        }
        self.forward(data);
        let scale = 1.0 / self.n as f64;
        for v in data.iter_mut() {
            *v = Complex::new(v.re * scale, -v.im * scale);
        }
    }

    /// Transforms `input[offset + j * stride]` for `j < out.len()` into `out`.
    fn work(
        &self,
        roots: &[Complex],
        input: &[Complex],
        offset: usize,
        stride: usize,
        out: &mut [Complex],
        factors: &[usize],
    ) {
        let n = out.len();
        let p = factors[0];
        let m = n / p;

        if m == 1 {
            for (q, o) in out.iter_mut().enumerate() {
                *o = input[offset + q * stride];
            }
        } else {
            for q in 0..p {
                self.work(
                    roots,
                    input,
                    offset + q * stride,
                    stride * p,
                    &mut out[q * m..(q + 1) * m],
                    &factors[1..],
                );
            }
        }

        // out[q*m + u] now holds sub-transform q at bin u.
        let root_step = self.n / n;
        let mut column = vec![Complex::ZERO; p];
        for u in 0..m {
            for (q, c) in column.iter_mut().enumerate() {
                *c = out[q * m + u];
            }
            for r in 0..p {
                let k = u + r * m;
                let mut acc = column[0];
                for (q, &c) in column.iter().enumerate().skip(1) {
                    let idx = (q * k) % n * root_step;
                    acc = acc + c * roots[idx];
                }
                out[k] = acc;
            }
        }
    }
}

impl Bluestein {
    fn forward(&self, data: &mut [Complex]) {
        let n = self.chirp.len();
        let mut a = vec![Complex::ZERO; self.kernel.len()];
        for (dst, (&x, &w)) in a.iter_mut().zip(data.iter().zip(self.chirp.iter())) {
            *dst = x * w;
        }

        self.inner.forward(&mut a);
        for (x, &k) in a.iter_mut().zip(self.kernel.iter()) {
            *x = *x * k;
        }
        self.inner.inverse(&mut a);

        for k in 0..n {
            data[k] = a[k] * self.chirp[k];
        }
    }
}

/// Prime factors of `n` in ascending order.
fn factorize(mut n: usize) -> Vec<usize> {
    let mut factors = Vec::new();
    if n <= 1 {
        factors.push(1);
        return factors;
    }
    let mut p = 2;
    while n > 1 {
        if p * p > n {
            factors.push(n);
            break;
        }
        while n % p == 0 {
            factors.push(p);
            n /= p;
        }
        p += if p == 2 { 1 } else { 2 };
    }
    factors
}
