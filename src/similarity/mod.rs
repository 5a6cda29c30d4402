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

// Similarities between two latent vectors, computed as a streaming reduction over
// `(x, y, λ)` triples, one triple per latent dimension.

use std::rc::Rc;

use crate::error::{Error, Result};

mod compound;
mod distance;
mod spectral;

pub use self::compound::CompoundSimilarity;
pub use self::distance::{Euclidean, Gaussian, LambdaMode};
pub use self::spectral::{RankReduction, SpectralTransformation};

/// A stateless strategy that hands out fresh accumulators.
pub trait Similarity {
    fn run(&self) -> Box<dyn SimilarityRun>;

    /// Whether the similarity is a pure function of the eigenvalues, i.e. equivalent to a scalar
    /// product over a transformed spectrum.
    fn is_spectral(&self) -> bool {
        false
    }

    /// The spectrum this similarity effectively multiplies with.
    fn transform_spectrum(&self, _lambda: &[f64]) -> Result<Vec<f64>> {
        Err(Error::NotSpectral)
    }
}

/// Accumulator for one pair of latent vectors. `similarity` may be read at any point.
pub trait SimilarityRun {
    fn add(&mut self, x: f64, y: f64, lambda: f64);
    fn similarity(&self) -> Result<f64>;
}

pub type SharedSimilarity = Rc<dyn Similarity>;

pub fn scalar_product() -> SharedSimilarity {
    Rc::new(ScalarProduct)
}

/// Σ λ·x·y, i.e. ordinary matrix multiplication. The default similarity of every model.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarProduct;

struct ScalarProductRun {
    sum: f64,
}

impl Similarity for ScalarProduct {

    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(ScalarProductRun { sum: 0.0 })
    }

    fn is_spectral(&self) -> bool {
        true
    }

    fn transform_spectrum(&self, lambda: &[f64]) -> Result<Vec<f64>> {
        Ok(lambda.to_vec())
    }
}

impl SimilarityRun for ScalarProductRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        self.sum += lambda * x * y;
    }

    fn similarity(&self) -> Result<f64> {
        Ok(self.sum)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Statistic {
    Cosine,
    Correlation,
    Jaccard,
}

/// λ-weighted first and second moments of both vectors.
#[derive(Default)]
struct Moments {
    weight: f64,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
    negative: Option<f64>,
}

struct StatisticRun {
    statistic: Statistic,
    moments: Moments,
}

impl SimilarityRun for StatisticRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        let moments = &mut self.moments;

        if lambda < 0.0 {
            moments.negative.get_or_insert(lambda);
            return;
        }

        moments.weight += lambda;
        moments.sum_x += lambda * x;
        moments.sum_y += lambda * y;
        moments.sum_xx += lambda * x * x;
        moments.sum_yy += lambda * y * y;
        moments.sum_xy += lambda * x * y;
    }

    fn similarity(&self) -> Result<f64> {
        let m = &self.moments;

        if let Some(lambda) = m.negative {
            return Err(Error::NegativeEigenvalue(lambda));
        }

        let (numerator, denominator) = match self.statistic {
            Statistic::Cosine => (m.sum_xy, (m.sum_xx * m.sum_yy).sqrt()),
            Statistic::Correlation => (
                m.weight * m.sum_xy - m.sum_x * m.sum_y,
                ((m.weight * m.sum_xx - m.sum_x * m.sum_x)
                    * (m.weight * m.sum_yy - m.sum_y * m.sum_y)).max(0.0).sqrt(),
            ),
            Statistic::Jaccard => (m.sum_xy, m.sum_xx + m.sum_yy - m.sum_xy),
        };

        Ok(ratio(numerator, denominator))
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

macro_rules! statistic_similarity {
    ($(#[$meta:meta])* $name:ident => $statistic:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl Similarity for $name {
            fn run(&self) -> Box<dyn SimilarityRun> {
                Box::new(StatisticRun { statistic: $statistic, moments: Moments::default() })
            }
        }
    };
}

statistic_similarity!(
    /// λ-weighted cosine of the angle between both vectors. Requires λ ≥ 0.
    Cosine => Statistic::Cosine
);

statistic_similarity!(
    /// λ-weighted Pearson correlation. Requires λ ≥ 0.
    Correlation => Statistic::Correlation
);

statistic_similarity!(
    /// Extended (Tanimoto) Jaccard coefficient `xy / (xx + yy - xy)`. Requires λ ≥ 0.
    Jaccard => Statistic::Jaccard
);

/// λ-weighted agreement of signs, in [-1, 1]. Requires λ ≥ 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignCorrelation;

#[derive(Default)]
struct SignCorrelationRun {
    agreement: f64,
    weight: f64,
    negative: Option<f64>,
}

impl Similarity for SignCorrelation {
    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(SignCorrelationRun::default())
    }
}

impl SimilarityRun for SignCorrelationRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        if lambda < 0.0 {
            self.negative.get_or_insert(lambda);
            return;
        }
        self.agreement += lambda * sign(x) * sign(y);
        self.weight += lambda;
    }

    fn similarity(&self) -> Result<f64> {
        match self.negative {
            Some(lambda) => Err(Error::NegativeEigenvalue(lambda)),
            None => Ok(ratio(self.agreement, self.weight)),
        }
    }
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Streams aligned latent coordinates and eigenvalues through a fresh run of `similarity`.
pub fn compute(similarity: &dyn Similarity, x: &[f64], y: &[f64], lambda: &[f64]) -> Result<f64> {
    assert!(x.len() == lambda.len() && y.len() == lambda.len(), "latent dimensions do not match");

    let mut run = similarity.run();
    for k in 0..lambda.len() {
        run.add(x[k], y[k], lambda[k]);
    }
    run.similarity()
}
