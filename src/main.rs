//! CLI interface for querying a word space

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use wordspace::{
    Composed, FileWordSpace, ScanMode, Similarity, SimilarityMeasure, WordSpace, WordSpaceConfig,
};

const USAGE: &str = "\
Usage: wordspace [--in-memory] [--parallel] [--config FILE] <STORE> <OPTION> [ARGS...]
Options:\t-f <w>\t\treturn corpus frequency of word <w>
\t\t-s <w1> <w2>\treturn first order similarity between words <w1> and <w2>
\t\t-s2 <w1> <w2>\treturn second order similarity between words <w1> and <w2>
\t\t-bn <w> <n>\treturn the <n> most similar words for word <w>
\t\t-bs <w> <s>\treturn all words that are at least <s> similar to word <w>
\t\t-bc <w> <n>\treturn the <n> best collocations for word <w>
\t\t-cc <w1> <w2>\treturn the common context for <w1> and <w2>
\t\t-n\t\treturn the number of words in the word space
\t\t-wl <file>\twrite word frequency list to file
\t\t-cs <p1> <p2> [method] [measure]
\t\t\t\treturn compositional similarity of phrases <p1> and <p2>
\t\t-sv <p> <n> [method] [measure]
\t\t\t\treturn the <n> words most similar to phrase <p> (full scan)
Methods: addition, multiplication, combined, dilation. Measures: dice, cosine.";

#[derive(Parser)]
#[command(name = "wordspace")]
#[command(about = "Distributional-semantics queries over a word space", long_about = None)]
struct Cli {
    /// Load the whole word space into memory instead of mapping it
    #[arg(long)]
    in_memory: bool,

    /// Run corpus scans on all cores
    #[arg(long)]
    parallel: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Word-space directory
    store: Option<PathBuf>,

    /// Query option followed by its arguments, e.g. `-s house building`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    query: Vec<String>,
}

enum Command {
    Frequency(String),
    FirstOrder(String, String),
    SecondOrder(String, String),
    BestNeighbors { word: String, n: usize },
    NeighborsAbove { word: String, threshold: f32 },
    BestCollocations { word: String, n: usize },
    CommonContext(String, String),
    NumberOfWords,
    WordList(PathBuf),
    Compositional {
        phrase1: String,
        phrase2: String,
        method: Option<String>,
        measure: Option<String>,
    },
    SimilarToPhrase {
        phrase: String,
        n: usize,
        method: Option<String>,
        measure: Option<String>,
    },
}

enum Parsed {
    Run(Command),
    Usage,
    Unknown(String),
}

fn parse_command(query: &[String]) -> Result<Parsed> {
    let Some((option, args)) = query.split_first() else {
        return Ok(Parsed::Usage);
    };
    let arg = |i: usize| args.get(i).cloned();
    let number = |i: usize| -> Result<usize> {
        args[i]
            .parse()
            .with_context(|| format!("invalid number: {}", args[i]))
    };

    let command = match (option.as_str(), args.len()) {
        ("-f", 1..) => Command::Frequency(args[0].clone()),
        ("-s", 2..) => Command::FirstOrder(args[0].clone(), args[1].clone()),
        ("-s2", 2..) => Command::SecondOrder(args[0].clone(), args[1].clone()),
        ("-bn", 2..) => Command::BestNeighbors {
            word: args[0].clone(),
            n: number(1)?,
        },
        ("-bs", 2..) => Command::NeighborsAbove {
            word: args[0].clone(),
            threshold: args[1]
                .parse()
                .with_context(|| format!("invalid similarity: {}", args[1]))?,
        },
        ("-bc", 2..) => Command::BestCollocations {
            word: args[0].clone(),
            n: number(1)?,
        },
        ("-cc", 2..) => Command::CommonContext(args[0].clone(), args[1].clone()),
        ("-n", _) => Command::NumberOfWords,
        ("-wl", 1..) => Command::WordList(PathBuf::from(&args[0])),
        ("-cs", 2..) => Command::Compositional {
            phrase1: args[0].clone(),
            phrase2: args[1].clone(),
            method: arg(2),
            measure: arg(3),
        },
        ("-sv", 2..) => Command::SimilarToPhrase {
            phrase: args[0].clone(),
            n: number(1)?,
            method: arg(2),
            measure: arg(3),
        },
        ("-f" | "-s" | "-s2" | "-bn" | "-bs" | "-bc" | "-cc" | "-wl" | "-cs" | "-sv", _) => {
            return Ok(Parsed::Usage)
        }
        (other, _) => return Ok(Parsed::Unknown(other.to_string())),
    };
    Ok(Parsed::Run(command))
}

fn parse_measure(name: Option<&str>) -> Result<SimilarityMeasure> {
    Ok(match name {
        Some(name) => name.parse()?,
        None => SimilarityMeasure::default(),
    })
}

fn print_similarity(similarity: Similarity) {
    match similarity {
        Similarity::Score(s) => println!("{}", s),
        Similarity::WordNotFound(_) => println!("Error: Word not found in index."),
        Similarity::Undefined => println!("Error: Similarity is undefined for these words."),
    }
}

fn not_found(word: &str) {
    println!("The word \"{}\" was not found.", word);
}

fn run(space: &WordSpace<FileWordSpace>, command: Command) -> Result<()> {
    match command {
        Command::Frequency(word) => {
            println!("{}", space.frequency(&word)?.unwrap_or(0));
        }
        Command::FirstOrder(w1, w2) => print_similarity(space.first_order_similarity(&w1, &w2)?),
        Command::SecondOrder(w1, w2) => print_similarity(space.second_order_similarity(&w1, &w2)?),
        Command::BestNeighbors { word, n } => match space.similar_words(&word)? {
            Some(neighbors) => {
                for neighbor in neighbors.iter().take(n) {
                    println!("{}\t{}", neighbor.word, neighbor.similarity);
                }
            }
            None => not_found(&word),
        },
        Command::NeighborsAbove { word, threshold } => match space.similar_words(&word)? {
            Some(neighbors) => {
                // neighbor lists are stored most similar first
                for neighbor in neighbors.iter().take_while(|n| n.similarity >= threshold) {
                    println!("{}\t{}", neighbor.word, neighbor.similarity);
                }
            }
            None => not_found(&word),
        },
        Command::BestCollocations { word, n } => match space.collocations(&word)? {
            Some(collocations) => {
                for c in collocations.iter().take(n) {
                    println!("{}\t{}", c.word, c.value);
                }
            }
            None => not_found(&word),
        },
        Command::CommonContext(w1, w2) => match space.common_context(&w1, &w2)? {
            None => println!("One of the input words was not found."),
            Some(shared) if shared.is_empty() => println!("No common context."),
            Some(shared) => {
                for f in shared {
                    println!("{}\t{}\t{}\t{}", f.word, f.relation, f.value_first, f.value_second);
                }
            }
        },
        Command::NumberOfWords => println!("{}", space.number_of_words()),
        Command::WordList(path) => {
            let report = space
                .word_frequency_list(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "{} of {} words were written.",
                report.written,
                space.number_of_words()
            );
        }
        Command::Compositional {
            phrase1,
            phrase2,
            method,
            measure,
        } => {
            let method = space
                .config()
                .composition_method(method.as_deref().unwrap_or("addition"))?;
            let measure = parse_measure(measure.as_deref())?;
            match space.compositional_similarity(&phrase1, &phrase2, &method, measure)? {
                Similarity::WordNotFound(token) => not_found(&token),
                other => print_similarity(other),
            }
        }
        Command::SimilarToPhrase {
            phrase,
            n,
            method,
            measure,
        } => {
            let method = space
                .config()
                .composition_method(method.as_deref().unwrap_or("addition"))?;
            let measure = parse_measure(measure.as_deref())?;
            let query = match space.compose_phrase(&phrase, &method)? {
                Composed::Vector(v) => v,
                Composed::WordNotFound(token) => {
                    not_found(&token);
                    return Ok(());
                }
            };
            let report = space.similar_words_for_vector(&query, measure);
            for m in report.matches.iter().take(n) {
                println!("{}\t{}", m.word, m.score);
            }
            if report.skipped > 0 {
                eprintln!("{} corrupt entries skipped", report.skipped);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let Some(store) = cli.store else {
        println!("{}", USAGE);
        return Ok(());
    };
    let command = match parse_command(&cli.query)? {
        Parsed::Run(command) => command,
        Parsed::Usage => {
            println!("{}", USAGE);
            return Ok(());
        }
        Parsed::Unknown(option) => {
            println!("Error: unknown command line option: {}", option);
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let mut config = match &cli.config {
        Some(path) => WordSpaceConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => WordSpaceConfig::default(),
    };
    if cli.in_memory {
        config.load_into_memory = true;
    }
    if cli.parallel {
        config.scan = ScanMode::Parallel;
    }

    let space = WordSpace::open(&store, config)
        .with_context(|| format!("can't open word space {}", store.display()))?;
    tracing::debug!(words = space.number_of_words(), "word space ready");

    let result = run(&space, command);
    space.close();
    result
}
