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

// Latent predictor models. Every model represents the graph as `U·Λ·Vᵗ`: per entity type a
// set of `rank` latent columns on both sides, and one eigenvalue per latent dimension.
// Pairs are scored by streaming their latent coordinates through a similarity.

use crate::dataset::{Dataset, RelationshipSet};
use crate::error::{Error, Result};
use crate::normalizer::PredictorNormalizer;
use crate::similarity::{SharedSimilarity, Similarity};
use crate::types::{Entity, EntityType, Factors, LatentColumns, RelationshipType};

mod compound;
mod eigen;
mod normalization;

pub use self::compound::{CompoundLatentPredictor, CompoundLatentPredictorModel};
pub use self::eigen::{EigenvalueDecompositionPredictor, EigenvalueDecompositionPredictorModel};
pub use self::normalization::{LatentNormalizationPredictor, LatentNormalizationPredictorModel};

/// Left and right latent vectors. Symmetric models keep a single copy for both sides.
#[derive(Clone, Debug)]
pub enum Embedding {
    Shared(Factors),
    Separate { u: Factors, v: Factors },
}

impl Embedding {

    pub fn u(&self) -> &Factors {
        match *self {
            Embedding::Shared(ref factors) => factors,
            Embedding::Separate { ref u, .. } => u,
        }
    }

    pub fn v(&self) -> &Factors {
        match *self {
            Embedding::Shared(ref factors) => factors,
            Embedding::Separate { ref v, .. } => v,
        }
    }

    pub fn is_shared(&self) -> bool {
        match *self {
            Embedding::Shared(_) => true,
            Embedding::Separate { .. } => false,
        }
    }
}

/// Rank, eigenvalues, latent vectors and default similarity of a model.
#[derive(Clone)]
pub struct LatentState {
    rank: usize,
    lambda: Vec<f64>,
    embedding: Embedding,
    similarity: SharedSimilarity,
}

impl LatentState {

    /// Eigenvalues start out as 1.
    pub fn new(rank: usize, embedding: Embedding, similarity: SharedSimilarity) -> Self {
        LatentState { rank, lambda: vec![1.0; rank], embedding, similarity }
    }

    pub fn from_parts(
        lambda: Vec<f64>,
        embedding: Embedding,
        similarity: SharedSimilarity,
    ) -> Self {
        LatentState { rank: lambda.len(), lambda, embedding, similarity }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn lambda(&self) -> &[f64] {
        &self.lambda
    }

    pub fn lambda_mut(&mut self) -> &mut [f64] {
        &mut self.lambda
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub fn embedding_mut(&mut self) -> &mut Embedding {
        &mut self.embedding
    }

    pub fn similarity(&self) -> &SharedSimilarity {
        &self.similarity
    }

    pub fn u(&self, ty: &EntityType) -> Result<&LatentColumns> {
        columns(self.embedding.u(), ty)
    }

    pub fn v(&self, ty: &EntityType) -> Result<&LatentColumns> {
        columns(self.embedding.v(), ty)
    }

    pub fn predict_with(
        &self,
        source: &Entity,
        target: &Entity,
        similarity: &dyn Similarity,
    ) -> Result<f64> {

        if self.rank == 0 {
            return Ok(0.0);
        }

        let u = self.u(&source.ty)?;
        let v = self.v(&target.ty)?;

        let mut run = similarity.run();
        for k in 0..self.rank {
            run.add(u[k][source.id], v[k][target.id], self.lambda[k]);
        }

        run.similarity()
    }

    /// Gram-Schmidt over the shared latent space, see [`orthogonalize`].
    pub fn orthogonalize(&mut self) -> Result<f64> {
        match self.embedding {
            Embedding::Shared(ref mut factors) => Ok(orthogonalize(factors, &mut self.lambda)),
            Embedding::Separate { .. } => Err(Error::UnsupportedOperation(
                "orthogonalization requires a shared embedding".to_string())),
        }
    }
}

/// Orthonormalizes the latent columns in place and stores their former lengths in `lambda`.
///
/// Column `k` is the concatenation of column `k` of every entity type. It is made orthogonal
/// to all previous columns, then divided by `λ[k] = sign(Σ values)·‖column‖`, so it ends up
/// with unit length and a positive sum. A column whose values sum to zero gets `λ[k] = 0` and
/// is left undivided.
///
/// Returns `sqrt(mean((λ_old - λ_new)²) / |λ_new[0]|)`, which tends to zero as power
/// iteration converges.
pub fn orthogonalize(factors: &mut Factors, lambda: &mut [f64]) -> f64 {
    let rank = lambda.len();
    let previous_lambda = lambda.to_vec();

    for k in 0..rank {
        for previous in 0..k {
            let projection: f64 = factors.values()
                .map(|columns| dot(&columns[k], &columns[previous]))
                .sum();

            if projection != 0.0 {
                for columns in factors.values_mut() {
                    let (head, tail) = columns.split_at_mut(k);
                    for (value, previous_value) in tail[0].iter_mut().zip(head[previous].iter()) {
                        *value -= projection * previous_value;
                    }
                }
            }
        }

        let sum: f64 = factors.values().map(|columns| columns[k].iter().sum::<f64>()).sum();
        let length = factors.values()
            .map(|columns| dot(&columns[k], &columns[k]))
            .sum::<f64>()
            .sqrt();

        let value = if sum > 0.0 {
            length
        } else if sum < 0.0 {
            -length
        } else {
            0.0
        };
        lambda[k] = value;

        if value != 0.0 {
            for columns in factors.values_mut() {
                for entry in columns[k].iter_mut() {
                    *entry /= value;
                }
            }
        }
    }

    convergence(&previous_lambda, lambda)
}

fn convergence(previous: &[f64], current: &[f64]) -> f64 {
    if current.is_empty() {
        return 0.0;
    }

    let mean_squared_change = previous.iter()
        .zip(current.iter())
        .map(|(before, after)| (before - after) * (before - after))
        .sum::<f64>() / current.len() as f64;

    let scale = current[0].abs();
    if scale == 0.0 {
        mean_squared_change.sqrt()
    } else {
        (mean_squared_change / scale).sqrt()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// A model of the graph in `U·Λ·Vᵗ` form.
pub trait LatentPredictorModel {

    fn state(&self) -> &LatentState;

    /// Performs one refinement step and returns a convergence measure that tends to zero.
    fn iterate(&mut self) -> Result<f64>;

    /// Brings the model up to date with the current content of its dataset.
    fn update(&mut self) -> Result<()>;

    /// Relationship types whose values this model approximates, and which a model composed
    /// on top of it therefore sees as residuals.
    fn normalized_types(&self) -> Vec<RelationshipType> {
        Vec::new()
    }

    fn rank(&self) -> usize {
        self.state().rank()
    }

    fn lambda(&self) -> &[f64] {
        self.state().lambda()
    }

    fn u(&self, ty: &EntityType) -> Result<&LatentColumns> {
        self.state().u(ty)
    }

    fn v(&self, ty: &EntityType) -> Result<&LatentColumns> {
        self.state().v(ty)
    }

    fn similarity(&self) -> &SharedSimilarity {
        self.state().similarity()
    }

    fn predict(&self, source: &Entity, target: &Entity) -> Result<f64> {
        let state = self.state();
        state.predict_with(source, target, &**state.similarity())
    }

    /// Like `predict`, with `similarity` instead of the model's own for this call only.
    fn predict_with(&self, source: &Entity, target: &Entity, similarity: &dyn Similarity)
        -> Result<f64> {
        self.state().predict_with(source, target, similarity)
    }

    /// The eigenvalues as transformed by the model's similarity, if it is spectral.
    fn spectrum(&self) -> Result<Vec<f64>> {
        self.similarity().transform_spectrum(self.lambda())
    }

    /// Subtracts the predictions of this model from the entries of `relationship`.
    fn normalizer(&self, relationship: &RelationshipSet) -> PredictorNormalizer<'_, Self>
    where
        Self: Sized,
    {
        PredictorNormalizer::new(self, relationship)
    }
}

impl<M: LatentPredictorModel + ?Sized> LatentPredictorModel for Box<M> {

    fn state(&self) -> &LatentState {
        (**self).state()
    }

    fn iterate(&mut self) -> Result<f64> {
        (**self).iterate()
    }

    fn update(&mut self) -> Result<()> {
        (**self).update()
    }

    fn normalized_types(&self) -> Vec<RelationshipType> {
        (**self).normalized_types()
    }
}

/// Builds latent models from a dataset.
pub trait LatentPredictor {
    type Model: LatentPredictorModel;

    /// Initializes a model on `dataset`, which stays shared with the model. With `update` set,
    /// the model is brought up to date before it is returned.
    fn build(&self, dataset: &Dataset, update: bool) -> Result<Self::Model>;
}

pub(crate) fn columns<'a>(factors: &'a Factors, ty: &EntityType) -> Result<&'a LatentColumns> {
    factors.get(ty).ok_or_else(|| Error::UnknownEntityType(ty.to_string()))
}

/// Zero-filled latent columns for every entity type of the dataset.
pub(crate) fn zero_factors(dataset: &Dataset, rank: usize) -> Factors {
    dataset.entity_sets()
        .iter()
        .map(|entity_set| {
            (entity_set.ty.clone(), crate::types::new_latent_columns(rank, entity_set.size))
        })
        .collect()
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::similarity::{scalar_product, Cosine};
    use approx::assert_abs_diff_eq;
    use fnv::FnvHashMap;

    fn factors(columns: Vec<(&str, LatentColumns)>) -> Factors {
        let mut factors = FnvHashMap::default();
        for (name, latent) in columns {
            factors.insert(EntityType::new(name), latent);
        }
        factors
    }

    fn global_dot(factors: &Factors, a: usize, b: usize) -> f64 {
        factors.values().map(|columns| dot(&columns[a], &columns[b])).sum()
    }

    #[test]
    fn orthogonalized_columns_are_orthonormal() {
        let mut latent = factors(vec![
            ("user", vec![vec![1.0, 2.0], vec![0.5, 1.0], vec![3.0, 0.0]]),
            ("item", vec![vec![0.3, 0.1, 0.4], vec![1.0, 0.0, 2.0], vec![0.0, 1.0, 1.0]]),
        ]);
        let mut lambda = vec![1.0; 3];

        orthogonalize(&mut latent, &mut lambda);

        for k in 0..3 {
            assert_abs_diff_eq!(global_dot(&latent, k, k), 1.0, epsilon = 1e-10);
            for other in 0..k {
                assert_abs_diff_eq!(global_dot(&latent, k, other), 0.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn eigenvalue_carries_length_and_sign() {
        let mut latent = factors(vec![("user", vec![vec![-3.0, -4.0]])]);
        let mut lambda = vec![1.0];

        let convergence = orthogonalize(&mut latent, &mut lambda);

        assert_abs_diff_eq!(lambda[0], -5.0);
        assert_eq!(latent[&EntityType::new("user")][0], vec![0.6, 0.8]);
        assert_abs_diff_eq!(convergence, (36.0f64 / 5.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn zero_sum_column_gets_zero_eigenvalue() {
        let mut latent = factors(vec![("node", vec![vec![1.0, -1.0]])]);
        let mut lambda = vec![1.0];

        let convergence = orthogonalize(&mut latent, &mut lambda);

        assert_eq!(lambda[0], 0.0);
        assert_eq!(latent[&EntityType::new("node")][0], vec![1.0, -1.0]);
        assert_abs_diff_eq!(convergence, 1.0);
    }

    #[test]
    fn zero_columns_are_left_alone() {
        let mut latent = factors(vec![("user", vec![vec![1.0, 0.0], vec![2.0, 0.0]])]);
        let mut lambda = vec![1.0, 1.0];

        orthogonalize(&mut latent, &mut lambda);

        assert_abs_diff_eq!(lambda[0], 1.0);
        assert_eq!(lambda[1], 0.0);
        assert!(latent[&EntityType::new("user")][1].iter().all(|value| value.is_finite()));
    }

    #[test]
    fn zero_rank_predicts_zero() {
        let state = LatentState::new(0, Embedding::Shared(FnvHashMap::default()),
            scalar_product());
        let user = EntityType::new("user");

        let prediction = state.predict_with(&Entity::new(&user, 3), &Entity::new(&user, 7),
            &*scalar_product());
        assert_eq!(prediction.unwrap(), 0.0);
    }

    #[test]
    fn predict_streams_latent_coordinates() {
        let user = EntityType::new("user");
        let item = EntityType::new("item");
        let embedding = Embedding::Separate {
            u: factors(vec![("user", vec![vec![1.0, 2.0], vec![3.0, 4.0]])]),
            v: factors(vec![("item", vec![vec![5.0], vec![6.0]])]),
        };
        let state = LatentState::from_parts(vec![2.0, -1.0], embedding, scalar_product());

        let prediction = state
            .predict_with(&Entity::new(&user, 1), &Entity::new(&item, 0), &*scalar_product())
            .unwrap();
        assert_abs_diff_eq!(prediction, 2.0 * 2.0 * 5.0 - 4.0 * 6.0);

        assert!(state.predict_with(&Entity::new(&item, 0), &Entity::new(&item, 0), &Cosine)
            .is_err());
    }

    #[test]
    fn separate_embeddings_cannot_be_orthogonalized() {
        let mut state = LatentState::new(1, Embedding::Separate {
            u: FnvHashMap::default(),
            v: FnvHashMap::default(),
        }, scalar_product());

        assert!(state.orthogonalize().is_err());
        assert!(!state.embedding().is_shared());
    }
}
