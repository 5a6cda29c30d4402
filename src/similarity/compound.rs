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
use crate::similarity::{SharedSimilarity, Similarity, SimilarityRun};

/// Similarity of a model made of two concatenated latent spaces: the first `first_rank`
/// additions go to a run of `first`, the next `second_rank` to a run of `second`, and the
/// result is the sum of both. Reading the result after any other number of additions fails.
#[derive(Clone)]
pub struct CompoundSimilarity {
    first_rank: usize,
    second_rank: usize,
    first: SharedSimilarity,
    second: SharedSimilarity,
}

impl CompoundSimilarity {
    pub fn new(
        first_rank: usize,
        second_rank: usize,
        first: SharedSimilarity,
        second: SharedSimilarity,
    ) -> Self {
        CompoundSimilarity { first_rank, second_rank, first, second }
    }

    fn rank(&self) -> usize {
        self.first_rank + self.second_rank
    }
}

struct CompoundRun {
    first_rank: usize,
    expected: usize,
    added: usize,
    first: Box<dyn SimilarityRun>,
    second: Box<dyn SimilarityRun>,
}

impl Similarity for CompoundSimilarity {

    fn run(&self) -> Box<dyn SimilarityRun> {
        Box::new(CompoundRun {
            first_rank: self.first_rank,
            expected: self.rank(),
            added: 0,
            first: self.first.run(),
            second: self.second.run(),
        })
    }

    fn is_spectral(&self) -> bool {
        self.first.is_spectral() && self.second.is_spectral()
    }

    fn transform_spectrum(&self, lambda: &[f64]) -> Result<Vec<f64>> {
        if lambda.len() != self.rank() {
            return Err(Error::SpectrumLength { expected: self.rank(), actual: lambda.len() });
        }

        let (first, second) = lambda.split_at(self.first_rank);
        let mut spectrum = self.first.transform_spectrum(first)?;
        spectrum.extend(self.second.transform_spectrum(second)?);

        Ok(spectrum)
    }
}

impl SimilarityRun for CompoundRun {

    fn add(&mut self, x: f64, y: f64, lambda: f64) {
        if self.added < self.first_rank {
            self.first.add(x, y, lambda);
        } else if self.added < self.expected {
            self.second.add(x, y, lambda);
        }
        self.added += 1;
    }

    fn similarity(&self) -> Result<f64> {
        if self.added != self.expected {
            return Err(Error::SimilarityProtocol { expected: self.expected, actual: self.added });
        }
        Ok(self.first.similarity()? + self.second.similarity()?)
    }
}

#[cfg(test)]
mod tests {

    use std::rc::Rc;

    use super::*;
    use crate::similarity::{compute, scalar_product, RankReduction};
    use approx::assert_abs_diff_eq;

    #[test]
    fn sums_both_parts() {
        let similarity = CompoundSimilarity::new(2, 1, scalar_product(), scalar_product());
        let value = compute(&similarity, &[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0], &[1.0, 1.0, 2.0])
            .unwrap();
        assert_abs_diff_eq!(value, 1.0 + 2.0 + 6.0);
    }

    #[test]
    fn too_few_additions_fail() {
        let similarity = CompoundSimilarity::new(2, 1, scalar_product(), scalar_product());
        let mut run = similarity.run();
        run.add(1.0, 1.0, 1.0);
        run.add(1.0, 1.0, 1.0);

        match run.similarity() {
            Err(Error::SimilarityProtocol { expected: 3, actual: 2 }) => {},
            other => panic!("expected a protocol violation, got {:?}", other),
        }
    }

    #[test]
    fn too_many_additions_fail() {
        let similarity = CompoundSimilarity::new(1, 1, scalar_product(), scalar_product());
        let mut run = similarity.run();
        for _ in 0..3 {
            run.add(1.0, 1.0, 1.0);
        }
        assert!(run.similarity().is_err());
    }

    #[test]
    fn spectrum_is_transformed_per_part() {
        let similarity = CompoundSimilarity::new(2, 2, Rc::new(RankReduction::new(1)),
            scalar_product());

        assert!(similarity.is_spectral());
        assert_eq!(similarity.transform_spectrum(&[4.0, 3.0, 2.0, 1.0]).unwrap(),
            vec![4.0, 0.0, 2.0, 1.0]);
        assert!(similarity.transform_spectrum(&[4.0, 3.0]).is_err());
    }
}
