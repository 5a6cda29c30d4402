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

use std::env;
use std::process;

use getopts::Options;
use log::{error, info};

use latentreco::io;
use latentreco::recommend;
use latentreco::stats::Renaming;
use latentreco::{LatentPredictor, LatentPredictorModel, ModelConfig, Result};

fn main() {

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input consists of \
        interactions between subjects and objects. The input file must contain a subject and \
        object pair per line, separated by a tab, optionally followed by a weight.", "PATH");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
    opts.optopt("c", "config", "JSON model configuration (optional, defaults to an additive \
        normalization followed by an eigendecomposition of the residuals).", "PATH");
    opts.optopt("r", "rank", "Rank of the eigendecompositions (optional, overrides the \
        configuration).", "NUMBER");
    opts.optopt("n", "num-predictions", "Number of objects to predict per subject (optional, \
        defaults to 10).", "NUMBER");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let interactions_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        ),
    };

    let num_predictions: usize = match matches.opt_get_default("n", 10) {
        Ok(n) => n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let rank: Option<usize> = match matches.opt_get("r") {
        Ok(rank) => rank,
        Err(failure) => {
            let hint = format!("Problem with option 'r': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let outcome = predict(
        &interactions_path,
        matches.opt_str("c"),
        rank,
        num_predictions,
        matches.opt_str("o"),
    );

    if let Err(failure) = outcome {
        error!("{}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
    process::exit(if hint.is_some() { 2 } else { 0 });
}

fn predict(
    interactions_path: &str,
    config_path: Option<String>,
    rank: Option<usize>,
    num_predictions: usize,
    output_path: Option<String>,
) -> Result<()> {

    let mut config = match config_path {
        Some(path) => ModelConfig::from_json_file(path)?,
        None => ModelConfig::default(),
    };
    if let Some(rank) = rank {
        config.set_rank(rank);
    }

    info!("Reading {}", interactions_path);
    let interactions = io::read_interactions_from_file(interactions_path)?;
    let data = io::to_dataset(&interactions)?;

    let model = config.build(&data.dataset, true)?;
    info!("Built model of rank {}", model.rank());

    let recommendations =
        recommend::recommend(&model, &data.dataset, &data.relationship, num_predictions)?;

    let renaming = Renaming::from(data.data_dict);

    info!("Writing predictions...");
    io::write_predictions_to(output_path.as_ref().map(String::as_str), &recommendations,
        &renaming)?;

    Ok(())
}
