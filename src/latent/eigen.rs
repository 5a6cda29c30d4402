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

use std::time::Instant;

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use crate::config::{EigenConfig, Ponderation};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::latent::{self, Embedding, LatentPredictor, LatentPredictorModel, LatentState};
use crate::similarity::SharedSimilarity;
use crate::types::Factors;
use crate::utils;

/// Dominant eigendecomposition of the whole graph, treated as one symmetric operator
/// `Σ_t w(t)·(M_t + M_tᵗ)` on the concatenation of all entity types.
///
/// Directed relationships are symmetrized, so left and right latent vectors coincide.
pub struct EigenvalueDecompositionPredictor {
    config: EigenConfig,
    similarity: SharedSimilarity,
}

impl EigenvalueDecompositionPredictor {

    pub fn new(config: EigenConfig) -> Result<Self> {
        if !(config.tolerance > 0.0) {
            return Err(Error::InvalidConfig("tolerance must be positive".to_string()));
        }
        let similarity = config.similarity.build()?;
        Ok(EigenvalueDecompositionPredictor { config, similarity })
    }

    pub fn with_rank(rank: usize) -> Self {
        EigenvalueDecompositionPredictor {
            config: EigenConfig::with_rank(rank),
            similarity: crate::similarity::scalar_product(),
        }
    }

    /// Replaces the similarity the built models score pairs with.
    pub fn with_similarity(mut self, similarity: SharedSimilarity) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_ponderation(mut self, ponderation: Ponderation) -> Self {
        self.config.ponderation = ponderation;
        self
    }
}

impl LatentPredictor for EigenvalueDecompositionPredictor {

    type Model = EigenvalueDecompositionPredictorModel;

    fn build(&self, dataset: &Dataset, update: bool) -> Result<Self::Model> {
        let rank = self.config.rank;
        let mut rng = XorShiftRng::seed_from_u64(self.config.seed);

        let mut factors = latent::zero_factors(dataset, rank);
        for entity_set in dataset.entity_sets() {
            if let Some(columns) = factors.get_mut(&entity_set.ty) {
                for column in columns.iter_mut() {
                    for value in column.iter_mut() {
                        *value = rng.gen::<f64>();
                    }
                }
            }
        }

        let state = LatentState::new(rank, Embedding::Shared(factors), self.similarity.clone());

        let mut model = EigenvalueDecompositionPredictorModel {
            dataset: dataset.clone(),
            ponderation: self.config.ponderation.clone(),
            tolerance: self.config.tolerance,
            max_iterations: self.config.max_iterations,
            state,
        };

        if update {
            model.update()?;
        }

        Ok(model)
    }
}

pub struct EigenvalueDecompositionPredictorModel {
    dataset: Dataset,
    ponderation: Ponderation,
    tolerance: f64,
    max_iterations: usize,
    state: LatentState,
}

impl EigenvalueDecompositionPredictorModel {

    /// One block power-iteration step: the new latent columns of every entity type
    /// accumulate the ponderated product of each relationship with the current columns of
    /// the entity type on its other side.
    fn multiply(&self) -> Result<Factors> {
        let rank = self.state.rank();
        let current = self.state.embedding().u();
        let mut next = latent::zero_factors(&self.dataset, rank);

        for relationship in self.dataset.relationship_sets() {
            let weight = self.ponderation.weight(&relationship.ty);
            if weight == 0.0 {
                continue;
            }

            let matrix = relationship.matrix.borrow();

            let subject_columns = current.get(&relationship.subject)
                .ok_or_else(|| Error::UnknownEntityType(relationship.subject.to_string()))?;
            let object_columns = current.get(&relationship.object)
                .ok_or_else(|| Error::UnknownEntityType(relationship.object.to_string()))?;

            for k in 0..rank {
                {
                    let next_subject = next.get_mut(&relationship.subject)
                        .ok_or_else(|| Error::UnknownEntityType(relationship.subject.to_string()))?;
                    matrix.mult(&object_columns[k], weight, &mut next_subject[k]);
                }
                let next_object = next.get_mut(&relationship.object)
                    .ok_or_else(|| Error::UnknownEntityType(relationship.object.to_string()))?;
                matrix.mult_transpose(&subject_columns[k], weight, &mut next_object[k]);
            }
        }

        Ok(next)
    }
}

impl LatentPredictorModel for EigenvalueDecompositionPredictorModel {

    fn state(&self) -> &LatentState {
        &self.state
    }

    fn iterate(&mut self) -> Result<f64> {
        let next = self.multiply()?;
        *self.state.embedding_mut() = Embedding::Shared(next);
        self.state.orthogonalize()
    }

    /// Iterates until the eigenvalues settle. Power iteration converges slowly, so the
    /// tolerance is loose and an iteration cap keeps degenerate spectra from looping forever.
    fn update(&mut self) -> Result<()> {
        let start = Instant::now();
        let mut iterations = 0;

        loop {
            let convergence = self.iterate()?;
            iterations += 1;
            debug!("Eigendecomposition iteration {}: convergence {:e}", iterations, convergence);

            if convergence < self.tolerance {
                break;
            }
            if iterations >= self.max_iterations {
                warn!("Eigendecomposition stopped after {} iterations at convergence {:e}",
                    iterations, convergence);
                break;
            }
        }

        info!("Rank {} eigendecomposition after {} iterations, {}ms, lambda {:?}",
            self.state.rank(), iterations, utils::to_millis(start.elapsed()), self.state.lambda());

        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use std::rc::Rc;
    use crate::similarity::{Euclidean, LambdaMode, SpectralTransformation};
    use crate::types::{Entity, WeightRange};
    use approx::assert_abs_diff_eq;

    fn single_edge() -> (Dataset, crate::types::EntityType, crate::types::EntityType) {
        let mut dataset = Dataset::new();
        let subjects = dataset.add_entity_type("subject", 2).unwrap();
        let objects = dataset.add_entity_type("object", 2).unwrap();
        let edge = dataset
            .add_relationship_type("edge", &subjects, &objects, WeightRange::Unweighted)
            .unwrap();
        dataset.relationship_set(&edge).unwrap().matrix.borrow_mut().set(0, 0, 1.0);

        (dataset, subjects, objects)
    }

    /// Path a - b - c - d inside a single entity type.
    fn path() -> Dataset {
        let mut dataset = Dataset::new();
        let nodes = dataset.add_entity_type("node", 4).unwrap();
        let link = dataset
            .add_relationship_type("link", &nodes, &nodes, WeightRange::Unweighted)
            .unwrap();
        {
            let matrix = &dataset.relationship_set(&link).unwrap().matrix;
            matrix.borrow_mut().set(0, 1, 1.0);
            matrix.borrow_mut().set(1, 2, 1.0);
            matrix.borrow_mut().set(2, 3, 1.0);
        }
        dataset
    }

    #[test]
    fn single_edge_is_predicted_strongest() {
        let (dataset, subjects, objects) = single_edge();
        let model = EigenvalueDecompositionPredictor::with_rank(1).build(&dataset, true).unwrap();

        let connected = model
            .predict(&Entity::new(&subjects, 0), &Entity::new(&objects, 0)).unwrap();
        let other_object = model
            .predict(&Entity::new(&subjects, 0), &Entity::new(&objects, 1)).unwrap();
        let other_subject = model
            .predict(&Entity::new(&subjects, 1), &Entity::new(&objects, 0)).unwrap();

        assert!(connected > other_object);
        assert!(connected > other_subject);
        assert_abs_diff_eq!(model.lambda()[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn left_and_right_vectors_coincide() {
        let (dataset, subjects, _) = single_edge();
        let model = EigenvalueDecompositionPredictor::with_rank(2).build(&dataset, true).unwrap();

        assert!(model.state().embedding().is_shared());
        assert_eq!(model.u(&subjects).unwrap(), model.v(&subjects).unwrap());
    }

    #[test]
    fn recovers_dominant_eigenvalue_of_path() {
        // The adjacency matrix of a path on four nodes has eigenvalues ±(1 ± √5) / 2
        let model = EigenvalueDecompositionPredictor::with_rank(1).build(&path(), true).unwrap();
        let golden = (1.0 + 5f64.sqrt()) / 2.0;

        assert_abs_diff_eq!(model.lambda()[0], golden, epsilon = 1e-4);
    }

    #[test]
    fn spectrum_follows_similarity() {
        let exponential = EigenvalueDecompositionPredictor::with_rank(1)
            .with_similarity(Rc::new(SpectralTransformation::exponential(1.0)))
            .build(&path(), true)
            .unwrap();
        let golden = (1.0 + 5f64.sqrt()) / 2.0;

        let spectrum = exponential.spectrum().unwrap();
        assert_eq!(spectrum.len(), 1);
        assert_abs_diff_eq!(spectrum[0], exponential.lambda()[0] * 1f64.exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(spectrum[0], golden * 1f64.exp(), epsilon = 1e-3);

        let plain = EigenvalueDecompositionPredictor::with_rank(1).build(&path(), true).unwrap();
        assert_eq!(plain.spectrum().unwrap(), plain.lambda().to_vec());

        let euclidean = EigenvalueDecompositionPredictor::with_rank(1)
            .with_similarity(Rc::new(Euclidean::new(LambdaMode::Absolute)))
            .build(&path(), true)
            .unwrap();
        assert!(euclidean.spectrum().is_err());
    }

    #[test]
    fn second_update_is_stable() {
        let mut model = EigenvalueDecompositionPredictor::with_rank(1)
            .build(&path(), true)
            .unwrap();
        let before = model.lambda().to_vec();

        model.update().unwrap();

        for (old, new) in before.iter().zip(model.lambda().iter()) {
            assert!((old - new).abs() < 1e-5, "lambda moved from {} to {}", old, new);
        }
    }

    #[test]
    fn latent_columns_stay_orthonormal() {
        let model = EigenvalueDecompositionPredictor::with_rank(2).build(&path(), true).unwrap();
        let columns = model.u(&crate::types::EntityType::new("node")).unwrap();

        let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();
        assert_abs_diff_eq!(dot(&columns[0], &columns[0]), 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(dot(&columns[1], &columns[1]), 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(dot(&columns[0], &columns[1]), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn zero_ponderation_ignores_relationship() {
        let (dataset, subjects, objects) = single_edge();
        let edge = dataset.relationship_sets()[0].ty.clone();
        let model = EigenvalueDecompositionPredictor::with_rank(1)
            .with_ponderation(Ponderation::default().with(&edge, 0.0))
            .build(&dataset, true)
            .unwrap();

        assert_eq!(model.lambda()[0], 0.0);
        assert_eq!(model.predict(&Entity::new(&subjects, 0), &Entity::new(&objects, 0)).unwrap(),
            0.0);
    }

    #[test]
    fn update_observes_caller_mutations() {
        let (dataset, subjects, objects) = single_edge();
        let mut model = EigenvalueDecompositionPredictor::with_rank(1)
            .build(&dataset, true)
            .unwrap();

        let matrix = dataset.relationship_sets()[0].matrix.clone();
        matrix.borrow_mut().set(1, 1, 1.0);
        matrix.borrow_mut().set(0, 1, 1.0);
        matrix.borrow_mut().set(1, 0, 1.0);
        model.update().unwrap();

        // Complete bipartite K2,2 has dominant eigenvalue 2
        assert_abs_diff_eq!(model.lambda()[0], 2.0, epsilon = 1e-4);
        let prediction = model
            .predict(&Entity::new(&subjects, 1), &Entity::new(&objects, 1)).unwrap();
        assert!(prediction > 0.0);
    }
}
