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

use crate::error::{Error, Result};
use crate::similarity::{Similarity, SimilarityRun};

/// How a distance-based similarity treats negative eigenvalues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LambdaMode {
    /// Negative eigenvalues are an error.
    Positive,
    /// Eigenvalues are weighted by their magnitude.
    Absolute,
    /// Eigenvalues are used as they are; a negative squared distance counts as zero.
    Signed,
}

impl Default for LambdaMode {
    fn default() -> Self {
        LambdaMode::Positive
    }
}

struct SquaredDistanceRun {
    mode: LambdaMode,
    squared_distance: f64,
    negative: Option<f64>,
}

impl SquaredDistanceRun {

    fn new(mode: LambdaMode) -> Self {
        SquaredDistanceRun { mode, squared_distance: 0.0, negative: None }
    }

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        let weight = match self.mode {
            LambdaMode::Positive => {
                if lambda < 0.0 {
                    self.negative.get_or_insert(lambda);
                    return;
                }
                lambda
            },
            LambdaMode::Absolute => lambda.abs(),
            LambdaMode::Signed => lambda,
        };

        let difference = x - y;
        self.squared_distance += weight * difference * difference;
    }

    fn squared_distance(&self) -> Result<f64> {
        match self.negative {
            Some(lambda) => Err(Error::NegativeEigenvalue(lambda)),
            None => Ok(self.squared_distance.max(0.0)),
        }
    }
}

/// `1 / (1 + d)` with `d` the λ-weighted Euclidean distance.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean {
    pub mode: LambdaMode,
}

struct EuclideanRun(SquaredDistanceRun);

impl Euclidean {
    pub fn new(mode: LambdaMode) -> Self {
        Euclidean { mode }
    }
}

impl Similarity for Euclidean {
    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(EuclideanRun(SquaredDistanceRun::new(self.mode)))
    }
}

impl SimilarityRun for EuclideanRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        self.0.add(x, y, lambda);
    }

    fn similarity(&self) -> Result<f64> {
        Ok(1.0 / (1.0 + self.0.squared_distance()?.sqrt()))
    }
}

/// Gaussian kernel `exp(-d² / (2σ²))` over the λ-weighted Euclidean distance.
#[derive(Clone, Copy, Debug)]
pub struct Gaussian {
    pub mode: LambdaMode,
    pub sigma: f64,
}

struct GaussianRun {
    distance: SquaredDistanceRun,
    sigma: f64,
}

impl Gaussian {
    pub fn new(mode: LambdaMode, sigma: f64) -> Result<Self> {
        if !(sigma > 0.0) {
            return Err(Error::InvalidConfig(
                format!("gaussian width must be positive, got {}", sigma)));
        }
        Ok(Gaussian { mode, sigma })
    }
}

impl Similarity for Gaussian {
    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(GaussianRun { distance: SquaredDistanceRun::new(self.mode), sigma: self.sigma })
    }
}

impl SimilarityRun for GaussianRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        self.distance.add(x, y, lambda);
    }

    fn similarity(&self) -> Result<f64> {
        let squared_distance = self.distance.squared_distance()?;
        Ok((-squared_distance / (2.0 * self.sigma * self.sigma)).exp())
    }
}
