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
use std::io::prelude::*;
use std::io::{stdout, BufWriter};
use std::path::Path;

use log::info;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::recommend::ScoredItem;
use crate::stats::{DataDictionary, Renaming};
use crate::types::{RelationshipType, WeightRange};
use crate::utils;

pub const SUBJECT: &str = "subject";
pub const OBJECT: &str = "object";
pub const INTERACTION: &str = "interaction";

/// One line of an edge list. Lines without a weight are unweighted edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    pub subject: String,
    pub object: String,
    pub weight: Option<f64>,
}

/// Reads CSV input. We expect NO headers, and a subject-object pair per line with tab
/// separation, optionally followed by a weight.
pub fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(input)
}

pub fn read_interactions<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<Interaction>> {
    let mut interactions = Vec::new();

    for record in reader.records() {
        let record = record?;

        let (subject, object) = match (record.get(0), record.get(1)) {
            (Some(subject), Some(object)) => (subject, object),
            _ => return Err(Error::MalformedInput(format!(
                "line {}: expected a subject and an object", utils::line_of(&record)))),
        };

        let weight = match record.get(2) {
            Some(weight) => Some(weight.trim().parse::<f64>().map_err(|failure| {
                Error::MalformedInput(format!("line {}: weight {:?}: {}",
                    utils::line_of(&record), weight, failure))
            })?),
            None => None,
        };

        interactions.push(Interaction {
            subject: subject.to_string(),
            object: object.to_string(),
            weight,
        });
    }

    Ok(interactions)
}

pub fn read_interactions_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Interaction>> {
    let mut reader = csv_reader(File::open(path)?);
    read_interactions(&mut reader)
}

/// A two-type dataset built from an edge list.
pub struct InteractionData {
    pub dataset: Dataset,
    pub relationship: RelationshipType,
    pub data_dict: DataDictionary,
}

/// Subjects and objects become the entity types `subject` and `object`, the edges the
/// relationship `interaction`. The relationship is weighted as soon as one line has a weight.
/// Repeated edges keep the last weight.
pub fn to_dataset(interactions: &[Interaction]) -> Result<InteractionData> {
    let data_dict = DataDictionary::from_pairs(interactions.iter()
        .map(|interaction| (&interaction.subject, &interaction.object)));

    info!("Found {} interactions between {} subjects and {} objects.",
        data_dict.num_interactions(), data_dict.num_subjects(), data_dict.num_objects());

    let weight_range = if interactions.iter().any(|interaction| interaction.weight.is_some()) {
        WeightRange::Weighted
    } else {
        WeightRange::Unweighted
    };

    let mut dataset = Dataset::new();
    let subjects = dataset.add_entity_type(SUBJECT, data_dict.num_subjects())?;
    let objects = dataset.add_entity_type(OBJECT, data_dict.num_objects())?;
    let relationship =
        dataset.add_relationship_type(INTERACTION, &subjects, &objects, weight_range)?;

    {
        let mut matrix = dataset.relationship_set(&relationship)?.matrix.borrow_mut();
        for interaction in interactions {
            let row = lookup(data_dict.subject_index(&interaction.subject), &interaction.subject)?;
            let col = lookup(data_dict.object_index(&interaction.object), &interaction.object)?;
            matrix.set(row, col, interaction.weight.unwrap_or(1.0));
        }
    }

    Ok(InteractionData { dataset, relationship, data_dict })
}

fn lookup(index: Option<usize>, name: &str) -> Result<usize> {
    index.ok_or_else(|| Error::MalformedInput(format!("{} is not in the data dictionary", name)))
}

/// Struct used for JSON serialization of predictions. Field names will be used in JSON.
#[derive(Serialize)]
struct Predictions<'a> {
    for_subject: &'a str,
    predicted_objects: Vec<PredictedObject<'a>>,
}

#[derive(Serialize)]
struct PredictedObject<'a> {
    object: &'a str,
    score: f64,
}

/// Writes one JSON object per subject, using the original identifiers from the input file.
pub fn write_predictions<W: Write>(
    out: &mut W,
    recommendations: &[Vec<ScoredItem>],
    renaming: &Renaming,
) -> Result<()> {

    for (subject, scored_items) in recommendations.iter().enumerate() {
        let predictions = Predictions {
            for_subject: renaming.subject_name(subject),
            predicted_objects: scored_items.iter()
                .map(|scored_item| PredictedObject {
                    object: renaming.object_name(scored_item.item),
                    score: scored_item.score,
                })
                .collect(),
        };

        serde_json::to_writer(&mut *out, &predictions)?;
        writeln!(out)?;
    }

    out.flush()?;

    Ok(())
}

/// Writes to a file at `path` if one is supplied, otherwise to stdout.
pub fn write_predictions_to(
    path: Option<&str>,
    recommendations: &[Vec<ScoredItem>],
    renaming: &Renaming,
) -> Result<()> {

    let mut out: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(Path::new(path))?)),
        None => Box::new(stdout()),
    };

    write_predictions(&mut out, recommendations, renaming)
}
