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

use std::fmt;
use std::rc::Rc;

use fnv::FnvHashMap;

macro_rules! interned_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(Rc<str>);

        impl $name {
            pub fn new(name: &str) -> Self {
                $name(Rc::from(name))
            }

            pub fn name(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                $name(Rc::from(name))
            }
        }

        impl<'a> From<&'a str> for $name {
            fn from(name: &'a str) -> Self {
                $name::new(name)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

interned_name!(
    /// Name of a kind of node in the graph, e.g. `user` or `item`.
    EntityType
);

interned_name!(
    /// Name of a kind of typed, directed edge, e.g. `rates` or `follows`.
    RelationshipType
);

/// A single node: its type and its consecutive id within that type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Entity {
    pub ty: EntityType,
    pub id: usize,
}

impl Entity {
    pub fn new(ty: &EntityType, id: usize) -> Self {
        Entity { ty: ty.clone(), id }
    }
}

/// What kind of values the edges of a relationship carry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightRange {
    /// Edges are present or absent; implicit zeros carry meaning.
    Unweighted,
    Positive,
    Signed,
    Weighted,
}

impl WeightRange {
    /// Whether explicit values can be centered by an additive normalization.
    pub fn is_normalizable(self) -> bool {
        match self {
            WeightRange::Signed | WeightRange::Weighted => true,
            WeightRange::Unweighted | WeightRange::Positive => false,
        }
    }
}

pub type DenseVector = Vec<f64>;

/// Latent vectors of one entity type: `rank` columns, one value per entity in each.
pub type LatentColumns = Vec<DenseVector>;

/// Latent vectors of every entity type.
pub type Factors = FnvHashMap<EntityType, LatentColumns>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}

pub fn new_latent_columns(rank: usize, dimensions: usize) -> LatentColumns {
    vec![new_dense_vector(dimensions); rank]
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn interned_names_compare_by_content() {
        let a = EntityType::new("user");
        let b = EntityType::from(String::from("user"));

        assert_eq!(a, b);
        assert_eq!(a.name(), "user");
        assert_eq!(format!("{}", b), "user");
    }

    #[test]
    fn names_deserialize_from_plain_strings() {
        let ty: RelationshipType = serde_json::from_str("\"rates\"").unwrap();
        assert_eq!(ty, RelationshipType::new("rates"));
        assert_eq!(serde_json::to_string(&ty).unwrap(), "\"rates\"");
    }

    #[test]
    fn only_signed_and_weighted_are_normalizable() {
        assert!(WeightRange::Signed.is_normalizable());
        assert!(WeightRange::Weighted.is_normalizable());
        assert!(!WeightRange::Unweighted.is_normalizable());
        assert!(!WeightRange::Positive.is_normalizable());
    }
}
