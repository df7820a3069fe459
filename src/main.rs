// Command-line entry point for Tangle.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;

use tangle::application::InlineUsecase;
use tangle::infrastructure::{unparse_or_dump, DefaultParser, FsFragmentLoader};
use tangle::ports::SourceParser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root source file to assemble
    input: String,

    /// Directory fragments are loaded from
    #[arg(short = 'd', long, default_value = "src")]
    src_dir: String,

    /// Fragment file extension
    #[arg(long, default_value = "py")]
    extension: String,

    /// Output file path (stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Wrap the structural-dump fallback as an explanatory comment
    #[arg(long)]
    explain: bool,
}

fn run(cli: &Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file {}", cli.input))?;

    let parser = DefaultParser;
    let tree = parser.parse(&text, &cli.input)?;
    println!("[tangle] parsed {} ({} top-level statements)", cli.input, tree.body.len());

    let loader = FsFragmentLoader::new(&cli.src_dir).with_extension(&cli.extension);
    let usecase = InlineUsecase { loader: &loader, parser: &parser };
    let assembled = usecase.run(&tree)?;
    println!(
        "[tangle] assembled {} top-level statements",
        assembled.body.len()
    );

    let rendered = unparse_or_dump(&assembled, cli.explain);
    match &cli.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output file {}", path))?;
            println!("[tangle] wrote {}", path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}
