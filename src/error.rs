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

use thiserror::Error;

/// Errors raised by the latent-factor engine and its command-line driver.
#[derive(Error, Debug)]
pub enum Error {
    /// The entity type is not part of the dataset or has no latent vectors.
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// The relationship type is not part of the dataset.
    #[error("Unknown relationship type: {0}")]
    UnknownRelationshipType(String),

    /// An entity or relationship type was registered twice.
    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    /// A similarity run was fed a different number of triples than it was built for.
    #[error("Similarity protocol violation: expected {expected} additions, got {actual}")]
    SimilarityProtocol { expected: usize, actual: usize },

    /// A spectrum handed to a spectral similarity has the wrong length.
    #[error("Spectrum length mismatch: expected {expected}, got {actual}")]
    SpectrumLength { expected: usize, actual: usize },

    /// The similarity depends on more than the eigenvalues.
    #[error("Similarity is not spectral")]
    NotSpectral,

    /// A similarity that requires nonnegative eigenvalues saw a negative one.
    #[error("Negative eigenvalue {0} passed to a similarity requiring nonnegative eigenvalues")]
    NegativeEigenvalue(f64),

    /// Configuration values are out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation not supported by the model.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A line of an input file could not be parsed.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
