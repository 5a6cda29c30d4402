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

use log::{debug, info};

use crate::config::AdditiveNormalization;
use crate::dataset::{Dataset, RelationshipSet};
use crate::error::{Error, Result};
use crate::latent::{self, Embedding, LatentPredictor, LatentPredictorModel, LatentState};
use crate::matrix::Matrix;
use crate::similarity;
use crate::types::{new_dense_vector, DenseVector, EntityType, Factors, RelationshipType};

/// Additive normalization written as a latent model, so that it composes with any other
/// latent predictor. Every `Signed` or `Weighted` relationship gets a block of three latent
/// dimensions: global mean, row means and column means. Unweighted relationships are left
/// alone, their implicit zeros are meaningful.
pub struct LatentNormalizationPredictor {
    normalization: AdditiveNormalization,
}

impl LatentNormalizationPredictor {
    pub fn new(normalization: AdditiveNormalization) -> Result<Self> {
        normalization.validate()?;
        Ok(LatentNormalizationPredictor { normalization })
    }
}

impl LatentPredictor for LatentNormalizationPredictor {

    type Model = LatentNormalizationPredictorModel;

    fn build(&self, dataset: &Dataset, update: bool) -> Result<Self::Model> {
        let types: Vec<RelationshipType> = dataset.relationship_sets()
            .iter()
            .filter(|relationship| relationship.weight_range.is_normalizable())
            .map(|relationship| relationship.ty.clone())
            .collect();

        let rank = 3 * types.len();
        let embedding = Embedding::Separate {
            u: latent::zero_factors(dataset, rank),
            v: latent::zero_factors(dataset, rank),
        };

        let mut model = LatentNormalizationPredictorModel {
            dataset: dataset.clone(),
            normalization: self.normalization,
            types,
            state: LatentState::new(rank, embedding, similarity::scalar_product()),
        };

        if update {
            model.update()?;
        }

        Ok(model)
    }
}

pub struct LatentNormalizationPredictorModel {
    dataset: Dataset,
    normalization: AdditiveNormalization,
    types: Vec<RelationshipType>,
    state: LatentState,
}

/// Row, column and global sums and counts of the explicit entries of a matrix.
struct Marginals {
    row_sums: DenseVector,
    row_counts: Vec<usize>,
    col_sums: DenseVector,
    col_counts: Vec<usize>,
    sum: f64,
    count: usize,
}

impl Marginals {

    fn of(matrix: &dyn Matrix) -> Self {
        let mut marginals = Marginals {
            row_sums: new_dense_vector(matrix.rows()),
            row_counts: vec![0; matrix.rows()],
            col_sums: new_dense_vector(matrix.cols()),
            col_counts: vec![0; matrix.cols()],
            sum: 0.0,
            count: 0,
        };

        for (row, col, value) in matrix.all() {
            marginals.row_sums[row] += value;
            marginals.row_counts[row] += 1;
            marginals.col_sums[col] += value;
            marginals.col_counts[col] += 1;
            marginals.sum += value;
            marginals.count += 1;
        }

        marginals
    }

    fn global_mean(&self) -> f64 {
        mean(self.sum, self.count)
    }

    fn row_means(&self) -> DenseVector {
        self.row_sums.iter().zip(self.row_counts.iter())
            .map(|(sum, count)| mean(*sum, *count))
            .collect()
    }

    fn col_means(&self) -> DenseVector {
        self.col_sums.iter().zip(self.col_counts.iter())
            .map(|(sum, count)| mean(*sum, *count))
            .collect()
    }
}

/// Zero for empty rows and columns instead of NaN.
fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn columns_mut<'a>(
    factors: &'a mut Factors,
    relationship: &RelationshipSet,
    side: &EntityType,
) -> Result<&'a mut Vec<DenseVector>> {
    factors.get_mut(side).ok_or_else(|| Error::UnknownEntityType(format!(
        "{} (side of {})", side, relationship.ty)))
}

impl LatentNormalizationPredictorModel {

    /// Recomputes the block `[k, k + 3)` of one relationship from a full pass over its matrix.
    fn normalize_block(
        &mut self,
        k: usize,
        relationship: &RelationshipSet,
    ) -> Result<()> {

        let marginals = Marginals::of(&*relationship.matrix.borrow());
        let weights = self.normalization;
        let total = weights.total();

        debug!("Normalizing {} with global mean {} over {} entries", relationship.ty,
            marginals.global_mean(), marginals.count);

        {
            let lambda = self.state.lambda_mut();
            lambda[k] = (weights.constant + weights.global * marginals.global_mean()) / total;
            lambda[k + 1] = weights.row / total;
            lambda[k + 2] = weights.column / total;
        }

        let (u, v) = match *self.state.embedding_mut() {
            Embedding::Separate { ref mut u, ref mut v } => (u, v),
            Embedding::Shared(_) => return Err(Error::UnsupportedOperation(
                "normalization requires separate left and right vectors".to_string())),
        };

        let subject_columns = columns_mut(u, relationship, &relationship.subject)?;
        let rows = subject_columns[k].len();
        subject_columns[k] = vec![1.0; rows];
        subject_columns[k + 1] = marginals.row_means();
        subject_columns[k + 2] = vec![1.0; rows];

        let object_columns = columns_mut(v, relationship, &relationship.object)?;
        let cols = object_columns[k].len();
        object_columns[k] = vec![1.0; cols];
        object_columns[k + 1] = vec![1.0; cols];
        object_columns[k + 2] = marginals.col_means();

        Ok(())
    }
}

impl LatentPredictorModel for LatentNormalizationPredictorModel {

    fn state(&self) -> &LatentState {
        &self.state
    }

    /// The normalization is computed exactly, so a step is a full update.
    fn iterate(&mut self) -> Result<f64> {
        self.update()?;
        Ok(0.0)
    }

    fn update(&mut self) -> Result<()> {
        let types = self.types.clone();

        for (block, ty) in types.iter().enumerate() {
            let relationship = self.dataset.relationship_set(ty)?.clone();
            self.normalize_block(3 * block, &relationship)?;
        }

        info!("Additive normalization of {} relationship types updated", types.len());

        Ok(())
    }

    fn normalized_types(&self) -> Vec<RelationshipType> {
        self.types.clone()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::normalizer::Normalizer;
    use crate::types::{Entity, EntityType, WeightRange};
    use approx::assert_abs_diff_eq;

    struct Ratings {
        dataset: Dataset,
        users: EntityType,
        items: EntityType,
        rates: RelationshipType,
    }

    fn ratings() -> Ratings {
        let mut dataset = Dataset::new();
        let users = dataset.add_entity_type("user", 3).unwrap();
        let items = dataset.add_entity_type("item", 3).unwrap();
        let rates = dataset
            .add_relationship_type("rates", &users, &items, WeightRange::Weighted)
            .unwrap();
        dataset
            .add_relationship_type("views", &users, &items, WeightRange::Unweighted)
            .unwrap();

        {
            let mut matrix = dataset.relationship_set(&rates).unwrap().matrix.borrow_mut();
            matrix.set(0, 0, 5.0);
            matrix.set(0, 1, 3.0);
            matrix.set(1, 0, 4.0);
            matrix.set(1, 2, 1.0);
        }

        Ratings { dataset, users, items, rates }
    }

    #[test]
    fn only_weighted_relationships_are_normalized() {
        let r = ratings();
        let model = LatentNormalizationPredictor::new(AdditiveNormalization::default())
            .unwrap()
            .build(&r.dataset, true)
            .unwrap();

        assert_eq!(model.rank(), 3);
        assert_eq!(model.normalized_types(), vec![r.rates.clone()]);
        assert!(!model.state().embedding().is_shared());
    }

    #[test]
    fn prediction_is_weighted_average_of_means() {
        let r = ratings();
        let model = LatentNormalizationPredictor::new(AdditiveNormalization::default())
            .unwrap()
            .build(&r.dataset, true)
            .unwrap();

        let global = 13.0 / 4.0;
        let row = 8.0 / 2.0;
        let column = 9.0 / 2.0;

        let prediction = model
            .predict(&Entity::new(&r.users, 0), &Entity::new(&r.items, 0))
            .unwrap();
        assert_abs_diff_eq!(prediction, (global + row + column) / 3.0, epsilon = 1e-12);

        // No ratings for user 2: its row mean is zero, not NaN
        let prediction = model
            .predict(&Entity::new(&r.users, 2), &Entity::new(&r.items, 1))
            .unwrap();
        assert_abs_diff_eq!(prediction, (global + 0.0 + 3.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn constant_term_shifts_baseline() {
        let r = ratings();
        let normalization = AdditiveNormalization::new(1.0, 1.0, 0.0, 0.0).unwrap();
        let model = LatentNormalizationPredictor::new(normalization)
            .unwrap()
            .build(&r.dataset, true)
            .unwrap();

        assert_abs_diff_eq!(model.lambda()[0], (1.0 + 13.0 / 4.0) / 2.0, epsilon = 1e-12);
        let prediction = model
            .predict(&Entity::new(&r.users, 1), &Entity::new(&r.items, 2))
            .unwrap();
        assert_abs_diff_eq!(prediction, (1.0 + 13.0 / 4.0) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn normalization_round_trips() {
        let r = ratings();
        let model = LatentNormalizationPredictor::new(AdditiveNormalization::default())
            .unwrap()
            .build(&r.dataset, true)
            .unwrap();

        let relationship = r.dataset.relationship_set(&r.rates).unwrap();
        let normalizer = model.normalizer(relationship);
        let matrix = relationship.matrix.borrow();

        for (row, col, value) in matrix.all() {
            let normalized = normalizer.normalize(value, row, col).unwrap();
            assert!((normalized - value).abs() > 0.0);
            let restored = normalizer.denormalize(normalized, row, col).unwrap();
            assert_abs_diff_eq!(restored, value, epsilon = 1e-12);
        }
    }

    #[test]
    fn update_follows_matrix_changes() {
        let r = ratings();
        let mut model = LatentNormalizationPredictor::new(AdditiveNormalization::new(
            0.0, 1.0, 0.0, 0.0).unwrap())
            .unwrap()
            .build(&r.dataset, true)
            .unwrap();
        assert_abs_diff_eq!(model.lambda()[0], 13.0 / 4.0);

        r.dataset.relationship_set(&r.rates).unwrap().matrix.borrow_mut().set(2, 2, 2.0);
        assert_eq!(model.iterate().unwrap(), 0.0);

        assert_abs_diff_eq!(model.lambda()[0], 15.0 / 5.0);
    }
}
