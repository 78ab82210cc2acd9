/*****************************************************************************************[main.rs]
Copyright (c) 2023-2024, Andrew Haberlandt, Harrison Green, Marijn J.H. Heule (SBVA)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

extern crate clap;
extern crate cpu_time;
extern crate flate2;
extern crate sbva;

#[cfg(not(feature = "logging"))]
#[macro_use]
pub(crate) mod log {
    macro_rules! debug {
        ($( $x:expr ),*) => {};
    }
}

#[cfg(not(feature = "logging"))]
mod env_logger {
    pub fn init() {}
}

#[cfg(feature = "logging")]
extern crate env_logger;

#[cfg(feature = "logging")]
#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process::exit;
use clap::{App, Arg};
use flate2::bufread::GzDecoder;
use sbva::{Config, Formula, Tiebreak};

mod system;

fn main() {
    env_logger::init();
    let exitcode = main2().unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(1)
    });
    exit(exitcode);
}

fn main2() -> io::Result<i32> {
    let resource = system::ResourceMeasure::new();

    let matches = App::new("SBVA")
        .version("0.1.0")
        .about("Structured bounded variable addition: CNF preprocessing with DRAT proofs")
        .arg(Arg::with_name("input-file"))
        .arg(Arg::with_name("output-file"))
        .arg(Arg::with_name("proof")
             .long("proof")
             .short("p")
             .help("Write a DRAT proof of the rewrite to this file")
             .takes_value(true))
        .arg(Arg::with_name("verbosity")
             .long("verb")
             .short("v")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("steps")
             .long("steps")
             .short("s")
             .help("Work budget; the engine stops cleanly once it is spent")
             .takes_value(true))
        .arg(Arg::with_name("max-replacements")
             .long("max-replacements")
             .short("c")
             .help("Stop after this many auxiliary variables (0 = unbounded)")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("matched-lits-cutoff")
             .long("matched-lits-cutoff")
             .short("l")
             .help("Discard tiles with at most this many matched literals (and at most the clause cutoff)")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("matched-cls-cutoff")
             .long("matched-cls-cutoff")
             .short("m")
             .help("Discard tiles with at most this many matched clauses (and at most the literal cutoff)")
             .default_value("0")
             .takes_value(true))
        .arg(Arg::with_name("preserve-model-count")
             .long("preserve-model-count")
             .help("Add a blocking clause per substitution so the model count is preserved exactly"))
        .arg(Arg::with_name("no-tiebreak")
             .long("no-tiebreak")
             .short("n")
             .help("Disable the three-hop tiebreak heuristic"))
        .get_matches();

    let mut opts = Config::default();
    opts.steps = matches
        .value_of("steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.steps);
    opts.max_replacements = matches
        .value_of("max-replacements")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.max_replacements);
    opts.matched_lits_cutoff = matches
        .value_of("matched-lits-cutoff")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.matched_lits_cutoff);
    opts.matched_cls_cutoff = matches
        .value_of("matched-cls-cutoff")
        .and_then(|s| s.parse().ok())
        .unwrap_or(opts.matched_cls_cutoff);
    opts.preserve_model_cnt = matches.is_present("preserve-model-count");
    opts.generate_proof = matches.is_present("proof");
    let verbosity = matches
        .value_of("verbosity")
        .unwrap()
        .parse::<u32>()
        .unwrap_or(0);
    opts.verbosity = verbosity;

    let tiebreak = if matches.is_present("no-tiebreak") {
        Tiebreak::None
    } else {
        Tiebreak::ThreeHop
    };

    let input_file = matches.value_of("input-file");
    let output_file = matches.value_of("output-file");
    let proof_file = matches.value_of("proof");

    let mut formula = Formula::new(opts);
    if let Some(input_file) = input_file {
        debug!("preprocessing file {}", input_file);
        let file = BufReader::new(File::open(input_file)?);
        read_input_autogz(file, &mut formula)?;
    } else {
        eprintln!("c Reading from standard input... Use '--help' for help.");
        let stdin = io::stdin();
        read_input_autogz(stdin.lock(), &mut formula)?;
    }

    if verbosity > 0 {
        eprintln!("c |  Number of variables:  {:12}  |", formula.num_vars());
        eprintln!("c |  Number of clauses:    {:12}  |", formula.num_live_clauses());
    }

    formula.run(tiebreak);

    if verbosity > 0 {
        eprintln!("c |  Replacements:         {:12}  |", formula.num_replacements());
        eprintln!("c |  Vars after:           {:12}  |", formula.num_vars());
        eprintln!("c |  Clauses after:        {:12}  |", formula.num_live_clauses());
        eprintln!("c CPU time              : {:.3}s", resource.cpu_time());
    }

    if let Some(output_file) = output_file {
        let mut out = BufWriter::new(File::create(output_file)?);
        formula.to_cnf(&mut out)?;
        out.flush()?;
    } else {
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        formula.to_cnf(&mut out)?;
        out.flush()?;
    }

    if let Some(proof_file) = proof_file {
        let mut out = BufWriter::new(File::create(proof_file)?);
        formula.to_proof(&mut out)?;
        out.flush()?;
    }

    Ok(0)
}

fn read_input_autogz<R: BufRead>(mut input: R, formula: &mut Formula) -> io::Result<()> {
    let is_gz = input.fill_buf()?.starts_with(b"\x1F\x8B");
    if is_gz {
        sbva::dimacs::parse(&mut BufReader::new(GzDecoder::new(input)), formula)
    } else {
        sbva::dimacs::parse(&mut input, formula)
    }
}
