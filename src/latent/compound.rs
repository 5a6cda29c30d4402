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

use std::rc::Rc;

use fnv::FnvHashMap;
use log::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::latent::{self, Embedding, LatentPredictor, LatentPredictorModel, LatentState};
use crate::matrix::{self, WeightedMatrix};
use crate::normalizer;
use crate::similarity::CompoundSimilarity;
use crate::types::{Factors, LatentColumns, RelationshipType};

/// Fits `second` to what `first` leaves unexplained. The relationships `first` normalizes are
/// replaced by their residuals `value - first.predict(subject, object)` before `second` sees
/// them, and the two latent spaces are concatenated.
pub struct CompoundLatentPredictor<P1, P2> {
    first: P1,
    second: P2,
}

impl<P1, P2> CompoundLatentPredictor<P1, P2>
where
    P1: LatentPredictor,
    P2: LatentPredictor,
{
    pub fn new(first: P1, second: P2) -> Self {
        CompoundLatentPredictor { first, second }
    }
}

impl<P1, P2> LatentPredictor for CompoundLatentPredictor<P1, P2>
where
    P1: LatentPredictor,
    P2: LatentPredictor,
{
    type Model = CompoundLatentPredictorModel<P1::Model, P2::Model>;

    fn build(&self, dataset: &Dataset, update: bool) -> Result<Self::Model> {
        // The residuals are only meaningful once the first model has converged
        let first = self.first.build(dataset, true)?;

        let mut residual = dataset.clone();
        for ty in first.normalized_types() {
            let relationship = dataset.relationship_set(&ty)?;
            let rows = relationship.matrix.borrow().rows();
            let cols = relationship.matrix.borrow().cols();
            residual = residual.with_matrix(&ty, matrix::share(WeightedMatrix::new(rows, cols)))?;
        }
        derive_residuals(&first, dataset, &residual)?;

        let second = self.second.build(&residual, update)?;
        let state = compose(dataset, &first, &second)?;

        Ok(CompoundLatentPredictorModel {
            dataset: dataset.clone(),
            residual,
            first,
            second,
            state,
        })
    }
}

pub struct CompoundLatentPredictorModel<M1, M2> {
    dataset: Dataset,
    residual: Dataset,
    first: M1,
    second: M2,
    state: LatentState,
}

impl<M1, M2> CompoundLatentPredictorModel<M1, M2>
where
    M1: LatentPredictorModel,
    M2: LatentPredictorModel,
{
    pub fn first(&self) -> &M1 {
        &self.first
    }

    pub fn second(&self) -> &M2 {
        &self.second
    }

    /// The graph the second model is fitted to.
    pub fn residual(&self) -> &Dataset {
        &self.residual
    }

    fn refresh(&mut self) -> Result<()> {
        derive_residuals(&self.first, &self.dataset, &self.residual)?;
        Ok(())
    }
}

/// Overwrites the residual matrices in place, so the second model, which shares them,
/// observes the new values.
fn derive_residuals<M: LatentPredictorModel>(
    first: &M,
    dataset: &Dataset,
    residual: &Dataset,
) -> Result<()> {

    for ty in first.normalized_types() {
        let relationship = dataset.relationship_set(&ty)?;
        let baseline = first.normalizer(relationship);

        let source = relationship.matrix.borrow();
        let mut target = residual.relationship_set(&ty)?.matrix.borrow_mut();
        normalizer::normalize_into(&*source, &baseline, &mut *target)?;

        debug!("Derived {} residual entries of {}", source.nnz(), ty);
    }

    Ok(())
}

fn concatenate(
    dataset: &Dataset,
    first: &Factors,
    second: &Factors,
) -> Result<Factors> {
    let mut factors = FnvHashMap::default();

    for ty in dataset.entity_types() {
        let mut columns: LatentColumns = latent::columns(first, ty)?.clone();
        columns.extend(latent::columns(second, ty)?.iter().cloned());
        factors.insert(ty.clone(), columns);
    }

    Ok(factors)
}

fn compose<M1, M2>(dataset: &Dataset, first: &M1, second: &M2) -> Result<LatentState>
where
    M1: LatentPredictorModel,
    M2: LatentPredictorModel,
{
    let mut lambda = first.lambda().to_vec();
    lambda.extend_from_slice(second.lambda());

    let first_embedding = first.state().embedding();
    let second_embedding = second.state().embedding();

    let embedding = if first_embedding.is_shared() && second_embedding.is_shared() {
        Embedding::Shared(concatenate(dataset, first_embedding.u(), second_embedding.u())?)
    } else {
        Embedding::Separate {
            u: concatenate(dataset, first_embedding.u(), second_embedding.u())?,
            v: concatenate(dataset, first_embedding.v(), second_embedding.v())?,
        }
    };

    let similarity = CompoundSimilarity::new(
        first.rank(),
        second.rank(),
        first.similarity().clone(),
        second.similarity().clone(),
    );

    Ok(LatentState::from_parts(lambda, embedding, Rc::new(similarity)))
}

impl<M1, M2> LatentPredictorModel for CompoundLatentPredictorModel<M1, M2>
where
    M1: LatentPredictorModel,
    M2: LatentPredictorModel,
{
    fn state(&self) -> &LatentState {
        &self.state
    }

    fn iterate(&mut self) -> Result<f64> {
        let first = self.first.iterate()?;
        self.refresh()?;
        let second = self.second.iterate()?;
        self.state = compose(&self.dataset, &self.first, &self.second)?;

        Ok(first.max(second))
    }

    fn update(&mut self) -> Result<()> {
        self.first.update()?;
        self.refresh()?;
        self.second.update()?;
        self.state = compose(&self.dataset, &self.first, &self.second)?;

        Ok(())
    }

    fn normalized_types(&self) -> Vec<RelationshipType> {
        let mut types = self.first.normalized_types();
        for ty in self.second.normalized_types() {
            if !types.contains(&ty) {
                types.push(ty);
            }
        }
        types
    }
}
