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

#[cfg(test)]
mod tests {

    use crate::config::ModelConfig;
    use crate::io;
    use crate::latent::{LatentPredictor, LatentPredictorModel};
    use crate::recommend;
    use crate::stats::Renaming;
    use crate::types::Entity;
    use approx::assert_abs_diff_eq;

    const RATINGS: &str = "alice\tapple\t5\n\
                           alice\tdog\t1\n\
                           alice\tpony\t4\n\
                           bob\tapple\t4\n\
                           bob\tpony\t5\n\
                           charles\tpony\t2\n\
                           charles\tbike\t5\n\
                           dora\tbike\t4\n\
                           dora\tdog\t2\n";

    #[test]
    fn programmatic_usage() {

        /* Our input data comprises rated interactions between subjects and objects. The
           identifiers used can be strings of arbitrary length and structure. */
        let interactions = io::read_interactions(&mut io::csv_reader(RATINGS.as_bytes())).unwrap();

        /* Internally, latentreco uses consecutive integer ids per entity type. The data
           dictionary maps the string identifiers to them, and the dataset holds the
           interactions as a sparse matrix. */
        let data = io::to_dataset(&interactions).unwrap();

        /* The default model removes the additive baseline of the ratings and decomposes the
           residuals. Models are configured in JSON, here we only lower the rank. */
        let mut config = ModelConfig::default();
        config.set_rank(2);
        let model = config.build(&data.dataset, true).unwrap();

        println!("Model of rank {} with eigenvalues {:?}", model.rank(), model.lambda());
        assert_eq!(model.rank(), 3 + 2);
        assert_eq!(model.normalized_types(), vec![data.relationship.clone()]);

        /* We predict the best two objects per subject among the ones it has not rated yet. */
        let recommendations = recommend::recommend(&model, &data.dataset, &data.relationship, 2)
            .unwrap();

        let subject_index = data.data_dict.subject_index("alice").unwrap();
        let pony = data.data_dict.object_index("pony").unwrap();

        /* The renaming data structure helps us map the integer ids back to the original
           string ids. */
        let renaming = Renaming::from(data.data_dict);

        for (subject, predictions) in recommendations.iter().enumerate() {
            println!("Predictions for {}:", renaming.subject_name(subject));
            for prediction in predictions {
                println!("\t{} ({})", renaming.object_name(prediction.item), prediction.score);
                assert!(prediction.score.is_finite());
            }
        }

        /* Alice rated three of the four objects */
        assert_eq!(recommendations[subject_index].len(), 1);
        assert!(recommendations[subject_index].iter().all(|prediction| prediction.item != pony));
    }

    #[test]
    fn feedback_is_observed_after_update() {
        let interactions = io::read_interactions(&mut io::csv_reader(RATINGS.as_bytes())).unwrap();
        let data = io::to_dataset(&interactions).unwrap();

        let config = ModelConfig::from_json_str(r#"{
            "model": "compound",
            "first": { "model": "normalization" },
            "second": { "model": "eigen", "rank": 2, "seed": 1 }
        }"#).unwrap();
        let mut model = config.build(&data.dataset, true).unwrap();

        let bob = data.data_dict.subject_index("bob").unwrap();
        let before = recommend::recommend(&model, &data.dataset, &data.relationship, 1).unwrap();
        let recommended = before[bob][0].item;

        let subjects = data.dataset.relationship_set(&data.relationship).unwrap().subject.clone();
        let objects = data.dataset.relationship_set(&data.relationship).unwrap().object.clone();
        let pair = (Entity::new(&subjects, bob), Entity::new(&objects, recommended));

        /* The first latent dimension carries the global mean of the nine ratings. */
        assert_abs_diff_eq!(model.lambda()[0], 32.0 / 9.0 / 3.0, epsilon = 1e-12);
        let predicted_before = model.predict(&pair.0, &pair.1).unwrap();

        /* Bob dislikes what we recommended: we record the rating and bring the model up to
           date, the same dataset is shared with the model. */
        data.dataset.relationship_set(&data.relationship).unwrap()
            .matrix.borrow_mut()
            .set(bob, recommended, 1.0);
        model.update().unwrap();

        assert_abs_diff_eq!(model.lambda()[0], 33.0 / 10.0 / 3.0, epsilon = 1e-12);

        let predicted_after = model.predict(&pair.0, &pair.1).unwrap();
        assert!(predicted_after.is_finite());
        assert!((predicted_after - predicted_before).abs() > 1e-6,
            "prediction stayed at {}", predicted_before);
    }
}
