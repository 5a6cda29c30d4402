/**
 * LatentReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::similarity::{Similarity, SimilarityRun};

/// A scalar product over the spectrum `f(λ)`.
///
/// When normalized, every eigenvalue is divided by the first one seen (the largest in
/// magnitude), passed through `f` and scaled back, which makes kernels like `exp(αλ)`
/// independent of the graph's spectral radius.
#[derive(Clone)]
pub struct SpectralTransformation {
    function: Rc<dyn Fn(f64) -> f64>,
    normalized: bool,
}

impl fmt::Debug for SpectralTransformation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SpectralTransformation").field("normalized", &self.normalized).finish()
    }
}

impl SpectralTransformation {

    pub fn new<F>(function: F, normalized: bool) -> Self
        where F: Fn(f64) -> f64 + 'static {
        SpectralTransformation { function: Rc::new(function), normalized }
    }

    /// Exponential graph kernel `exp(αλ)`.
    pub fn exponential(alpha: f64) -> Self {
        SpectralTransformation::new(move |lambda| (alpha * lambda).exp(), true)
    }

    /// Von Neumann kernel `1 / (1 - αλ)`; only meaningful for `α < 1`.
    pub fn von_neumann(alpha: f64) -> Self {
        SpectralTransformation::new(move |lambda| 1.0 / (1.0 - alpha * lambda), true)
    }

    /// Sign-preserving power `sign(λ)·|λ|^p`.
    pub fn power(exponent: f64) -> Self {
        SpectralTransformation::new(
            move |lambda: f64| lambda.signum() * lambda.abs().powf(exponent),
            false,
        )
    }

    fn transform(&self, lambda: f64, scale: f64) -> f64 {
        if !self.normalized {
            return (self.function)(lambda);
        }
        if scale == 0.0 {
            return 0.0;
        }
        scale * (self.function)(lambda / scale)
    }
}

struct SpectralRun {
    transformation: SpectralTransformation,
    scale: Option<f64>,
    sum: f64,
}

impl Similarity for SpectralTransformation {

    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(SpectralRun { transformation: self.clone(), scale: None, sum: 0.0 })
    }

    fn is_spectral(&self) -> bool {
        true
    }

    fn transform_spectrum(&self, lambda: &[f64]) -> Result<Vec<f64>> {
        let scale = lambda.first().cloned().unwrap_or(0.0);
        Ok(lambda.iter().map(|value| self.transform(*value, scale)).collect())
    }
}

impl SimilarityRun for SpectralRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        let scale = *self.scale.get_or_insert(lambda);
        self.sum += self.transformation.transform(lambda, scale) * x * y;
    }

    fn similarity(&self) -> Result<f64> {
        Ok(self.sum)
    }
}

/// Scalar product over the first `rank` latent dimensions only; later ones are ignored.
#[derive(Clone, Copy, Debug)]
pub struct RankReduction {
    pub rank: usize,
}

struct RankReductionRun {
    rank: usize,
    seen: usize,
    sum: f64,
}

impl RankReduction {
    pub fn new(rank: usize) -> Self {
        RankReduction { rank }
    }
}

impl Similarity for RankReduction {

    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(RankReductionRun { rank: self.rank, seen: 0, sum: 0.0 })
    }

    fn is_spectral(&self) -> bool {
        true
    }

    fn transform_spectrum(&self, lambda: &[f64]) -> Result<Vec<f64>> {
        Ok(lambda.iter()
            .enumerate()
            .map(|(k, value)| if k < self.rank { *value } else { 0.0 })
            .collect())
    }
}

impl SimilarityRun for RankReductionRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        if self.seen < self.rank {
            self.sum += lambda * x * y;
        }
        self.seen += 1;
    }

    fn similarity(&self) -> Result<f64> {
        Ok(self.sum)
    }
}
