use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, eyre};
use log::info;

use rcbdd_rs::embed::{embed_pla, EmbeddingSettings, EmbeddingStrategy, PlaSpecification};
use rcbdd_rs::rcbdd::{Rcbdd, VariableOrder};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Strategy {
    Bennett,
    MinimalGarbage,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Order {
    Interleaved,
    Blocked,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Cubes as `INPUTS:OUTPUTS`, e.g. `1-0:10`.
    #[arg(value_name = "CUBE", required = true)]
    cubes: Vec<String>,

    /// Embedding strategy.
    #[clap(long, value_enum, default_value = "bennett")]
    strategy: Strategy,

    /// Variable order of the characteristic function.
    #[clap(long, value_enum, default_value = "interleaved")]
    order: Order,

    /// Constant lines carry 1 instead of 0.
    #[clap(long)]
    constant_one: bool,

    /// Print the truth table of the embedding.
    #[clap(long)]
    truth_table: bool,

    /// Write the embedding as PLA to this file.
    #[clap(long, value_name = "FILE")]
    write_pla: Option<PathBuf>,

    /// Abort when the characteristic function exceeds this many nodes.
    #[clap(long, value_name = "INT")]
    node_limit: Option<usize>,
}

fn parse_spec(cubes: &[String]) -> color_eyre::Result<PlaSpecification> {
    let mut parsed = Vec::with_capacity(cubes.len());
    for cube in cubes {
        let (inputs, outputs) = cube
            .split_once(':')
            .ok_or_else(|| eyre!("cube {:?} is not of the form INPUTS:OUTPUTS", cube))?;
        parsed.push((inputs, outputs));
    }
    let Some(&(first_in, first_out)) = parsed.first() else {
        bail!("no cubes given");
    };

    let mut spec = PlaSpecification::new(first_in.chars().count(), first_out.chars().count());
    for (inputs, outputs) in parsed {
        spec.add_cube(inputs, outputs)?;
    }
    Ok(spec)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let spec = parse_spec(&args.cubes)?;
    println!(
        "Specification: {} inputs, {} outputs, {} cubes",
        spec.num_inputs,
        spec.num_outputs,
        spec.cubes.len()
    );

    let mut settings = EmbeddingSettings {
        strategy: match args.strategy {
            Strategy::Bennett => EmbeddingStrategy::Bennett,
            Strategy::MinimalGarbage => EmbeddingStrategy::MinimalGarbage,
        },
        constant_value: args.constant_one,
        variable_order: match args.order {
            Order::Interleaved => VariableOrder::Interleaved,
            Order::Blocked => VariableOrder::Blocked,
        },
        truth_table: args.truth_table,
        write_pla: args.write_pla.clone(),
        ..Default::default()
    };
    if let Some(limit) = args.node_limit {
        settings.budget = settings.budget.with_node_limit(limit);
    }

    let mut cf: Rcbdd = Rcbdd::new();
    let stats = embed_pla(&mut cf, &spec, &settings)?;
    println!(
        "Embedded into {} lines ({} constant, {} garbage), max multiplicity {}, in {:?}",
        stats.lines, stats.constant_lines, stats.garbage_lines, stats.max_multiplicity, stats.runtime
    );
    if let Some(table) = &stats.truth_table {
        println!("{}", table);
    }

    let chi = cf.chi().ok_or_else(|| eyre!("embedding left no characteristic function"))?;
    let circuit = cf.to_circuit(chi)?;
    println!("Synthesized {} gates:", circuit.num_gates());
    println!("{}", circuit);

    // The synthesized circuit must realize the embedded function exactly.
    let check = cf.create_from_circuit(&circuit)?;
    if check != chi {
        bail!("synthesized circuit does not match the embedding");
    }
    info!("Circuit verified against the characteristic function");

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
