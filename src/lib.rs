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

// Low-rank latent embeddings of typed entity-relationship graphs.
//
// Relationship matrices live in a sparse store indexed by row and by column. Latent predictor
// models turn a `Dataset` into per entity type latent vectors and one eigenvalue per latent
// dimension, and score arbitrary entity pairs through a pluggable similarity.

#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod latent;
pub mod matrix;
pub mod normalizer;
pub mod recommend;
pub mod similarity;
pub mod stats;
pub mod types;
pub mod utils;
pub mod vector;

mod usage_tests;

pub use crate::config::{AdditiveNormalization, EigenConfig, ModelConfig, Ponderation};
pub use crate::dataset::{Dataset, RelationshipSet};
pub use crate::error::{Error, Result};
pub use crate::latent::{LatentPredictor, LatentPredictorModel};
pub use crate::types::{Entity, EntityType, RelationshipType, WeightRange};
