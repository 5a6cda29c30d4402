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

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;

use fnv::FnvHashMap;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::latent::{
    CompoundLatentPredictor, EigenvalueDecompositionPredictor, LatentNormalizationPredictor,
    LatentPredictor, LatentPredictorModel,
};
use crate::similarity::{
    self, Correlation, Cosine, Euclidean, Gaussian, Jaccard, LambdaMode, RankReduction,
    SharedSimilarity, SignCorrelation, SpectralTransformation,
};
use crate::types::RelationshipType;

/// Relative weight of every relationship type, `default` for the ones not listed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ponderation {
    pub overrides: FnvHashMap<RelationshipType, f64>,
    pub default: f64,
}

impl Default for Ponderation {
    fn default() -> Self {
        Ponderation { overrides: FnvHashMap::default(), default: 1.0 }
    }
}

impl Ponderation {

    pub fn with(mut self, ty: &RelationshipType, weight: f64) -> Self {
        self.overrides.insert(ty.clone(), weight);
        self
    }

    pub fn weight(&self, ty: &RelationshipType) -> f64 {
        self.overrides.get(ty).cloned().unwrap_or(self.default)
    }
}

/// Weights of the four terms of an additive normalization. The baseline of an entry is
/// the weighted average of the constant 1, the global mean, its row mean and its column mean.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditiveNormalization {
    pub constant: f64,
    pub global: f64,
    pub row: f64,
    pub column: f64,
}

impl Default for AdditiveNormalization {
    fn default() -> Self {
        AdditiveNormalization { constant: 0.0, global: 1.0, row: 1.0, column: 1.0 }
    }
}

impl AdditiveNormalization {

    pub fn new(constant: f64, global: f64, row: f64, column: f64) -> Result<Self> {
        let normalization = AdditiveNormalization { constant, global, row, column };
        normalization.validate()?;
        Ok(normalization)
    }

    pub fn validate(&self) -> Result<()> {
        let weights = [self.constant, self.global, self.row, self.column];

        if weights.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(Error::InvalidConfig(
                format!("normalization weights must be finite and nonnegative: {:?}", self)));
        }
        if self.total() == 0.0 {
            return Err(Error::InvalidConfig("normalization weights are all zero".to_string()));
        }

        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.constant + self.global + self.row + self.column
    }
}

/// Settings of the power-iteration eigensolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenConfig {
    pub rank: usize,
    /// Seed of the random initial latent vectors.
    pub seed: u64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub ponderation: Ponderation,
    pub similarity: SimilarityConfig,
}

impl Default for EigenConfig {
    fn default() -> Self {
        EigenConfig {
            rank: 10,
            seed: 42,
            tolerance: 1e-5,
            max_iterations: 10_000,
            ponderation: Ponderation::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl EigenConfig {
    pub fn with_rank(rank: usize) -> Self {
        EigenConfig { rank, ..EigenConfig::default() }
    }
}

/// Named similarity, as it appears in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimilarityConfig {
    ScalarProduct,
    Cosine,
    Correlation,
    Jaccard,
    SignCorrelation,
    Euclidean { #[serde(default)] mode: LambdaMode },
    Gaussian { #[serde(default)] mode: LambdaMode, sigma: f64 },
    Exponential { alpha: f64 },
    VonNeumann { alpha: f64 },
    Power { exponent: f64 },
    RankReduction { rank: usize },
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        SimilarityConfig::ScalarProduct
    }
}

impl SimilarityConfig {
    pub fn build(&self) -> Result<SharedSimilarity> {
        let similarity: SharedSimilarity = match *self {
            SimilarityConfig::ScalarProduct => similarity::scalar_product(),
            SimilarityConfig::Cosine => Rc::new(Cosine),
            SimilarityConfig::Correlation => Rc::new(Correlation),
            SimilarityConfig::Jaccard => Rc::new(Jaccard),
            SimilarityConfig::SignCorrelation => Rc::new(SignCorrelation),
            SimilarityConfig::Euclidean { mode } => Rc::new(Euclidean::new(mode)),
            SimilarityConfig::Gaussian { mode, sigma } => Rc::new(Gaussian::new(mode, sigma)?),
            SimilarityConfig::Exponential { alpha } =>
                Rc::new(SpectralTransformation::exponential(alpha)),
            SimilarityConfig::VonNeumann { alpha } =>
                Rc::new(SpectralTransformation::von_neumann(alpha)),
            SimilarityConfig::Power { exponent } =>
                Rc::new(SpectralTransformation::power(exponent)),
            SimilarityConfig::RankReduction { rank } => Rc::new(RankReduction::new(rank)),
        };

        Ok(similarity)
    }
}

/// A latent predictor as described in a JSON configuration file, e.g.
///
/// ```json
/// { "model": "compound",
///   "first": { "model": "normalization", "row": 1.0, "column": 1.0 },
///   "second": { "model": "eigen", "rank": 5 } }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum ModelConfig {
    Eigen(EigenConfig),
    Normalization(AdditiveNormalization),
    Compound {
        first: Box<ModelConfig>,
        second: Box<ModelConfig>,
    },
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Compound {
            first: Box::new(ModelConfig::Normalization(AdditiveNormalization::default())),
            second: Box::new(ModelConfig::Eigen(EigenConfig::default())),
        }
    }
}

impl ModelConfig {

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: ModelConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ModelConfig::Eigen(ref config) => {
                if !(config.tolerance > 0.0) {
                    return Err(Error::InvalidConfig("tolerance must be positive".to_string()));
                }
                config.similarity.build().map(|_| ())
            },
            ModelConfig::Normalization(ref normalization) => normalization.validate(),
            ModelConfig::Compound { ref first, ref second } => {
                first.validate()?;
                second.validate()
            },
        }
    }

    /// Overrides the rank of every eigendecomposition in this configuration.
    pub fn set_rank(&mut self, rank: usize) {
        match *self {
            ModelConfig::Eigen(ref mut config) => config.rank = rank,
            ModelConfig::Normalization(_) => {},
            ModelConfig::Compound { ref mut first, ref mut second } => {
                first.set_rank(rank);
                second.set_rank(rank);
            },
        }
    }
}

impl LatentPredictor for ModelConfig {

    type Model = Box<dyn LatentPredictorModel>;

    fn build(&self, dataset: &Dataset, update: bool) -> Result<Self::Model> {
        let model: Box<dyn LatentPredictorModel> = match *self {
            ModelConfig::Eigen(ref config) => {
                let predictor = EigenvalueDecompositionPredictor::new(config.clone())?;
                Box::new(predictor.build(dataset, update)?)
            },
            ModelConfig::Normalization(normalization) => {
                let predictor = LatentNormalizationPredictor::new(normalization)?;
                Box::new(predictor.build(dataset, update)?)
            },
            ModelConfig::Compound { ref first, ref second } => {
                let predictor = CompoundLatentPredictor::new((**first).clone(), (**second).clone());
                Box::new(predictor.build(dataset, update)?)
            },
        };

        Ok(model)
    }
}
