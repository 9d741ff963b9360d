use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use git_unidiff::{NormalizeOptions, PrintOptions, normalize, parse_multi_file_diff};
use log::LevelFilter;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "git-unidiff")]
#[command(about = "Parse and print git-style unified diffs")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a diff and print it back in canonical form
    Normalize {
        /// Diff file to read (stdin if omitted or "-")
        file: Option<PathBuf>,
        /// Quote file names in headers
        #[arg(long)]
        quote_names: bool,
        /// Put extended headers into canonical order
        #[arg(long)]
        sort_headers: bool,
    },
    /// List the files a diff touches
    Files {
        /// Diff file to read (stdin if omitted or "-")
        file: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Generate a man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        })
        .parse_default_env()
        .init();

    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Normalize {
            file,
            quote_names,
            sort_headers,
        } => {
            let input = read_input(file.as_deref())?;
            let options = NormalizeOptions {
                print: PrintOptions::default().quote_names(quote_names),
                sort_headers,
            };
            stdout.write_all(&normalize(&input, &options)?)?;
        }
        Commands::Files { file } => {
            let input = read_input(file.as_deref())?;
            for diff in parse_multi_file_diff(&input)? {
                if diff.new_name.is_empty() {
                    writeln!(stdout, "{} (only on one side)", diff.orig_name)?;
                } else {
                    writeln!(stdout, "{} -> {}", diff.orig_name, diff.new_name)?;
                }
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "git-unidiff", &mut stdout);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut stdout)?;
        }
    }

    Ok(())
}

/// Read the whole diff from a file, or stdin for `None` and `-`
fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            log::info!("Reading diff from {}", path.display());
            std::fs::read_to_string(path)
        }
        _ => {
            log::info!("Reading diff from stdin");
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            Ok(input)
        }
    }
}
