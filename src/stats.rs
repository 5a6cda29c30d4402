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

use fnv::FnvHashMap;

/// Consecutive ids for the subject and object names of an edge list, in order of first
/// appearance, plus the number of edges seen.
pub struct DataDictionary {
    subject_dict: FnvHashMap<String, usize>,
    object_dict: FnvHashMap<String, usize>,
    num_interactions: u64,
}

impl DataDictionary {

    pub fn num_subjects(&self) -> usize {
        self.subject_dict.len()
    }

    pub fn num_objects(&self) -> usize {
        self.object_dict.len()
    }

    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn subject_index(&self, name: &str) -> Option<usize> {
        self.subject_dict.get(name).cloned()
    }

    pub fn object_index(&self, name: &str) -> Option<usize> {
        self.object_dict.get(name).cloned()
    }

    pub fn from_pairs<I, S, O>(pairs: I) -> Self
    where
        I: IntoIterator<Item=(S, O)>,
        S: AsRef<str>,
        O: AsRef<str>,
    {
        let mut subject_dict: FnvHashMap<String, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());
        let mut object_dict: FnvHashMap<String, usize> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        let mut num_interactions: u64 = 0;

        for (subject, object) in pairs {
            intern(&mut subject_dict, subject.as_ref());
            intern(&mut object_dict, object.as_ref());
            num_interactions += 1;
        }

        DataDictionary { subject_dict, object_dict, num_interactions }
    }
}

fn intern(dict: &mut FnvHashMap<String, usize>, name: &str) {
    if !dict.contains_key(name) {
        let index = dict.len();
        dict.insert(name.to_string(), index);
    }
}

/// Reverse of a `DataDictionary`.
pub struct Renaming {
    subject_names: Vec<String>,
    object_names: Vec<String>,
}

impl Renaming {

    pub fn subject_name(&self, subject_index: usize) -> &str {
        &self.subject_names[subject_index]
    }

    pub fn object_name(&self, object_index: usize) -> &str {
        &self.object_names[object_index]
    }
}

fn invert(dict: FnvHashMap<String, usize>) -> Vec<String> {
    let mut names = vec![String::new(); dict.len()];
    for (name, index) in dict.into_iter() {
        names[index] = name;
    }
    names
}

impl From<DataDictionary> for Renaming {

    fn from(data_dict: DataDictionary) -> Self {
        Renaming {
            subject_names: invert(data_dict.subject_dict),
            object_names: invert(data_dict.object_dict),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn ids_follow_first_appearance() {
        let data_dict = DataDictionary::from_pairs(vec![
            ("alice", "apple"),
            ("bob", "pony"),
            ("alice", "pony"),
            ("charles", "bike"),
        ]);

        assert_eq!(data_dict.num_subjects(), 3);
        assert_eq!(data_dict.num_objects(), 3);
        assert_eq!(data_dict.num_interactions(), 4);
        assert_eq!(data_dict.subject_index("bob"), Some(1));
        assert_eq!(data_dict.object_index("bike"), Some(2));
        assert_eq!(data_dict.object_index("dog"), None);

        let renaming = Renaming::from(data_dict);
        assert_eq!(renaming.subject_name(2), "charles");
        assert_eq!(renaming.object_name(1), "pony");
    }
}
