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

use crate::dataset::RelationshipSet;
use crate::error::Result;
use crate::latent::LatentPredictorModel;
use crate::matrix::Matrix;
use crate::types::{Entity, EntityType};

/// Maps the entries of one relationship matrix to and from a normalized form.
pub trait Normalizer {
    fn normalize(&self, value: f64, row: usize, col: usize) -> Result<f64>;
    fn denormalize(&self, value: f64, row: usize, col: usize) -> Result<f64>;
}

/// Normalizes entries by subtracting the prediction of a model for the (subject, object) pair.
pub struct PredictorNormalizer<'a, M: ?Sized + 'a> {
    model: &'a M,
    subject: EntityType,
    object: EntityType,
}

impl<'a, M: LatentPredictorModel + ?Sized> PredictorNormalizer<'a, M> {
    pub fn new(model: &'a M, relationship: &RelationshipSet) -> Self {
        PredictorNormalizer {
            model,
            subject: relationship.subject.clone(),
            object: relationship.object.clone(),
        }
    }

    fn predict(&self, row: usize, col: usize) -> Result<f64> {
        self.model.predict(&Entity::new(&self.subject, row), &Entity::new(&self.object, col))
    }
}

impl<'a, M: LatentPredictorModel + ?Sized> Normalizer for PredictorNormalizer<'a, M> {

    fn normalize(&self, value: f64, row: usize, col: usize) -> Result<f64> {
        Ok(value - self.predict(row, col)?)
    }

    fn denormalize(&self, value: f64, row: usize, col: usize) -> Result<f64> {
        Ok(value + self.predict(row, col)?)
    }
}

/// Writes the normalized form of every explicit entry of `source` into `target`. Only the
/// sparsity pattern of `source` is visited, implicit zeros stay zero.
pub fn normalize_into(
    source: &dyn Matrix,
    normalizer: &dyn Normalizer,
    target: &mut dyn Matrix,
) -> Result<()> {
    for (row, col, value) in source.all() {
        target.set(row, col, normalizer.normalize(value, row, col)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::Error;
    use crate::matrix::WeightedMatrix;

    struct Shift(f64);

    impl Normalizer for Shift {
        fn normalize(&self, value: f64, row: usize, _col: usize) -> Result<f64> {
            Ok(value - self.0 * row as f64)
        }

        fn denormalize(&self, value: f64, row: usize, _col: usize) -> Result<f64> {
            Ok(value + self.0 * row as f64)
        }
    }

    struct Failing;

    impl Normalizer for Failing {
        fn normalize(&self, _value: f64, _row: usize, _col: usize) -> Result<f64> {
            Err(Error::UnsupportedOperation("normalize".to_string()))
        }

        fn denormalize(&self, _value: f64, _row: usize, _col: usize) -> Result<f64> {
            Err(Error::UnsupportedOperation("denormalize".to_string()))
        }
    }

    #[test]
    fn only_explicit_entries_are_written() {
        let mut source = WeightedMatrix::new(3, 2);
        source.set(0, 1, 4.0);
        source.set(2, 0, 7.0);

        let mut target = WeightedMatrix::new(3, 2);
        normalize_into(&source, &Shift(1.5), &mut target).unwrap();

        assert_eq!(target.nnz(), 2);
        assert_eq!(target.get(0, 1), 4.0);
        assert_eq!(target.get(2, 0), 4.0);
        assert_eq!(target.get(1, 1), 0.0);
    }

    #[test]
    fn normalizer_errors_propagate() {
        let mut source = WeightedMatrix::new(1, 1);
        source.set(0, 0, 1.0);
        let mut target = WeightedMatrix::new(1, 1);

        assert!(normalize_into(&source, &Failing, &mut target).is_err());
    }
}
