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

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use fnv::FnvHashSet;
use log::info;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::latent::LatentPredictorModel;
use crate::types::{Entity, RelationshipType};
use crate::utils;

/// Candidate object with its predicted score, ordered so that a `BinaryHeap` keeps the
/// lowest score on top.
#[derive(PartialEq, Debug)]
pub struct ScoredItem {
    pub item: usize,
    pub score: f64,
}

/// There is no total order on floating point numbers, NaN compares as equal.
fn cmp_reverse(scored_item_a: &ScoredItem, scored_item_b: &ScoredItem) -> Ordering {
    match scored_item_a.score.partial_cmp(&scored_item_b.score) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        Some(Ordering::Equal) => Ordering::Equal,
        None => Ordering::Equal
    }
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// For every subject of `relationship`, the `num_items_to_recommend` objects with the highest
/// prediction among those the subject has no explicit entry for, best first.
pub fn recommend<M: LatentPredictorModel + ?Sized>(
    model: &M,
    dataset: &Dataset,
    relationship: &RelationshipType,
    num_items_to_recommend: usize,
) -> Result<Vec<Vec<ScoredItem>>> {

    let start = Instant::now();

    let relationship = dataset.relationship_set(relationship)?;
    let matrix = relationship.matrix.borrow();

    let mut recommendations: Vec<Vec<ScoredItem>> = Vec::with_capacity(matrix.rows());

    for subject in 0..matrix.rows() {
        let source = Entity::new(&relationship.subject, subject);
        let seen: FnvHashSet<usize> = matrix.row(subject).map(|(object, _)| object).collect();

        let mut heap = BinaryHeap::with_capacity(num_items_to_recommend);

        if num_items_to_recommend > 0 {
            for object in (0..matrix.cols()).filter(|object| !seen.contains(object)) {
                let score = model.predict(&source, &Entity::new(&relationship.object, object))?;
                let scored_item = ScoredItem { item: object, score };

                if heap.len() < num_items_to_recommend {
                    heap.push(scored_item);
                } else if let Some(mut top) = heap.peek_mut() {
                    if scored_item < *top {
                        *top = scored_item;
                    }
                }
            }
        }

        recommendations.push(heap.into_sorted_vec());
    }

    info!("Computed {} recommendations for {} subjects of {} in {}ms", num_items_to_recommend,
        recommendations.len(), relationship.ty, utils::to_millis(start.elapsed()));

    Ok(recommendations)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::config::AdditiveNormalization;
    use crate::latent::{LatentNormalizationPredictor, LatentPredictor};
    use crate::types::WeightRange;

    #[test]
    fn heap_keeps_lowest_score_on_top() {
        let mut heap = BinaryHeap::new();
        heap.push(ScoredItem { item: 0, score: 0.5 });
        heap.push(ScoredItem { item: 1, score: -1.0 });
        heap.push(ScoredItem { item: 2, score: 3.0 });

        assert_eq!(heap.peek().map(|top| top.item), Some(1));
        let sorted: Vec<usize> = heap.into_sorted_vec().into_iter().map(|s| s.item).collect();
        assert_eq!(sorted, vec![2, 0, 1]);
    }

    #[test]
    fn recommends_best_unseen_objects() {
        let mut dataset = Dataset::new();
        let users = dataset.add_entity_type("user", 2).unwrap();
        let items = dataset.add_entity_type("item", 4).unwrap();
        let rates = dataset
            .add_relationship_type("rates", &users, &items, WeightRange::Weighted)
            .unwrap();
        {
            let mut matrix = dataset.relationship_set(&rates).unwrap().matrix.borrow_mut();
            matrix.set(0, 0, 5.0);
            matrix.set(0, 1, 1.0);
            matrix.set(1, 2, 4.0);
            matrix.set(1, 3, 2.0);
        }

        // Only column means count, so items rank by their mean rating
        let normalization = AdditiveNormalization::new(0.0, 0.0, 0.0, 1.0).unwrap();
        let model = LatentNormalizationPredictor::new(normalization)
            .unwrap()
            .build(&dataset, true)
            .unwrap();

        let recommendations = recommend(&model, &dataset, &rates, 1).unwrap();
        assert_eq!(recommendations.len(), 2);
        assert_eq!(recommendations[0], vec![ScoredItem { item: 2, score: 4.0 }]);
        assert_eq!(recommendations[1], vec![ScoredItem { item: 0, score: 5.0 }]);

        let recommendations = recommend(&model, &dataset, &rates, 5).unwrap();
        let items: Vec<usize> = recommendations[1].iter().map(|s| s.item).collect();
        assert_eq!(items, vec![0, 1]);

        assert!(recommend(&model, &dataset, &rates, 0).unwrap().iter().all(|r| r.is_empty()));
    }
}
