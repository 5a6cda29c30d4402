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
use crate::matrix::{self, SharedMatrix};
use crate::types::{EntityType, RelationshipType, WeightRange};

#[derive(Clone, Debug)]
pub struct EntitySet {
    pub ty: EntityType,
    pub size: usize,
}

/// A typed relationship between two entity sets. The matrix has one row per subject and one
/// column per object.
#[derive(Clone)]
pub struct RelationshipSet {
    pub ty: RelationshipType,
    pub subject: EntityType,
    pub object: EntityType,
    pub weight_range: WeightRange,
    pub matrix: SharedMatrix,
}

/// Entity sets and relationship sets of a heterogeneous graph.
///
/// Cloning a dataset is cheap: every relationship matrix is shared by reference, so
/// changes made through one handle are visible to every model built on any of its clones.
#[derive(Clone, Default)]
pub struct Dataset {
    entity_sets: Vec<EntitySet>,
    relationship_sets: Vec<RelationshipSet>,
}

impl Dataset {

    pub fn new() -> Self {
        Dataset::default()
    }

    pub fn add_entity_type(&mut self, name: &str, size: usize) -> Result<EntityType> {
        if self.entity_sets.iter().any(|entity_set| entity_set.ty.name() == name) {
            return Err(Error::DuplicateType(name.to_string()));
        }

        let ty = EntityType::new(name);
        self.entity_sets.push(EntitySet { ty: ty.clone(), size });

        Ok(ty)
    }

    /// Registers a relationship with an empty matrix sized after both entity sets.
    pub fn add_relationship_type(
        &mut self,
        name: &str,
        subject: &EntityType,
        object: &EntityType,
        weight_range: WeightRange,
    ) -> Result<RelationshipType> {

        let rows = self.entity_count(subject)?;
        let cols = self.entity_count(object)?;

        self.add_relationship_set(name, subject, object, weight_range,
            matrix::new_matrix(rows, cols, weight_range))
    }

    /// Registers a relationship backed by an existing matrix.
    pub fn add_relationship_set(
        &mut self,
        name: &str,
        subject: &EntityType,
        object: &EntityType,
        weight_range: WeightRange,
        matrix: SharedMatrix,
    ) -> Result<RelationshipType> {

        if self.relationship_sets.iter().any(|set| set.ty.name() == name) {
            return Err(Error::DuplicateType(name.to_string()));
        }

        let rows = self.entity_count(subject)?;
        let cols = self.entity_count(object)?;
        {
            let matrix = matrix.borrow();
            if matrix.rows() != rows || matrix.cols() != cols {
                return Err(Error::InvalidConfig(format!(
                    "matrix of {} is {}x{}, entity sets require {}x{}",
                    name, matrix.rows(), matrix.cols(), rows, cols)));
            }
        }

        let ty = RelationshipType::new(name);
        self.relationship_sets.push(RelationshipSet {
            ty: ty.clone(),
            subject: subject.clone(),
            object: object.clone(),
            weight_range,
            matrix,
        });

        Ok(ty)
    }

    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }

    pub fn entity_types<'a>(&'a self) -> impl Iterator<Item=&'a EntityType> + 'a {
        self.entity_sets.iter().map(|entity_set| &entity_set.ty)
    }

    pub fn entity_count(&self, ty: &EntityType) -> Result<usize> {
        self.entity_sets.iter()
            .find(|entity_set| &entity_set.ty == ty)
            .map(|entity_set| entity_set.size)
            .ok_or_else(|| Error::UnknownEntityType(ty.to_string()))
    }

    pub fn relationship_sets(&self) -> &[RelationshipSet] {
        &self.relationship_sets
    }

    pub fn relationship_set(&self, ty: &RelationshipType) -> Result<&RelationshipSet> {
        self.relationship_sets.iter()
            .find(|set| &set.ty == ty)
            .ok_or_else(|| Error::UnknownRelationshipType(ty.to_string()))
    }

    /// A copy of this dataset in which `ty` is backed by `matrix`. All other matrices stay shared.
    pub fn with_matrix(&self, ty: &RelationshipType, matrix: SharedMatrix) -> Result<Dataset> {
        let mut copy = self.clone();

        let set = copy.relationship_sets.iter_mut()
            .find(|set| &set.ty == ty)
            .ok_or_else(|| Error::UnknownRelationshipType(ty.to_string()))?;

        {
            let current = set.matrix.borrow();
            let replacement = matrix.borrow();
            if current.rows() != replacement.rows() || current.cols() != replacement.cols() {
                return Err(Error::InvalidConfig(format!(
                    "replacement matrix for {} has the wrong dimensions", ty)));
            }
        }

        set.matrix = matrix;
        Ok(copy)
    }
}
