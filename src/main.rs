/*!
Main binary for chunklex.
*/

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::generate;
use colored::{ColoredString, Colorize};
use std::fs::File;
use std::io::stdout;
use std::io::{self, BufWriter, ErrorKind, IsTerminal, Read, Write};
use std::path::PathBuf;

use chunklex::commands;
use chunklex::tokenizer::{ChunkedTokenStream, Token, json_tokenizer};

/// Stream a JSON document through the incremental tokenizer and print the
/// token sequence.
#[derive(Parser)]
#[command(name = "clx", version, about, long_about = None, disable_help_subcommand = true)]
struct Args {
    /// Optional subcommands
    #[command(subcommand)]
    command: Option<Commands>,
    /// Optional path to JSON file. If omitted, reads from STDIN
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
    /// Read size in bytes used to chunk the input
    #[arg(long, default_value_t = 8192, value_name = "BYTES")]
    chunk_size: usize,
    /// Emit tokens as JSON lines instead of the readable listing
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Display the number of surfaced tokens
    #[arg(long, action = ArgAction::SetTrue)]
    count: bool,
    /// Do not display the token listing
    #[arg(short, long, action = ArgAction::SetTrue)]
    no_display: bool,
    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity,
}

/// Available subcommands for `clx`
#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    /// Generate additional documentation and/or completions
    Generate(GenerateCommand),
}

/// Generate shell completions and man pages
#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate shell completions for the given shell to stdout.
    Shell { shell: clap_complete::Shell },
    /// Generate man pages for clx to the output directory if specified,
    /// else the current directory.
    Man {
        /// The output directory to write the man pages.
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Entry point for the main binary.
///
/// Reads the input file (or piped STDIN) chunk by chunk, never holding the
/// whole document in memory, and prints one line per token. Exits non-zero
/// on malformed or truncated input.
fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    match args.command {
        Some(Commands::Generate(cmd)) => match cmd {
            GenerateCommand::Shell { shell } => {
                let mut cmd = Args::command();
                generate(shell, &mut cmd, "clx", &mut stdout().lock());
            }
            GenerateCommand::Man { output_dir } => {
                commands::generate::generate_man_pages(
                    Args::command(),
                    output_dir,
                )?;
            }
        },
        None => {
            let reader: Box<dyn Read> = if let Some(path) = &args.input {
                Box::new(
                    File::open(path).with_context(|| {
                        format!("Failed to open file {path:?}")
                    })?,
                )
            } else {
                if io::stdin().is_terminal() {
                    // No piped input and no file specified
                    let mut cmd = Args::command();
                    return Ok(cmd.print_help()?);
                }
                Box::new(io::stdin().lock())
            };

            let stream = ChunkedTokenStream::with_chunk_size(
                json_tokenizer(),
                reader,
                args.chunk_size,
            );

            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let mut count: usize = 0;
            for item in stream {
                let token = item.context("Failed to tokenize input")?;
                count += 1;
                if args.no_display {
                    continue;
                }
                match write_token(&mut out, &token, args.json) {
                    Ok(()) => {}
                    // Piping into `head` or `less` exits cleanly.
                    Err(err) if err.kind() == ErrorKind::BrokenPipe => break,
                    Err(err) => {
                        return Err(err).context("write token to stdout");
                    }
                }
            }
            out.flush().or_else(|err| {
                if err.kind() == ErrorKind::BrokenPipe {
                    Ok(())
                } else {
                    Err(err)
                }
            })?;

            if args.count {
                println!("Tokens: {count}");
            }
        }
    }

    Ok(())
}

/// Write a single token as either a colorized `kind "value"` line or a
/// JSON line.
fn write_token<W: Write>(
    writer: &mut W,
    token: &Token,
    as_json: bool,
) -> io::Result<()> {
    if as_json {
        let line = serde_json::to_string(token)
            .expect("token serialization cannot fail");
        writeln!(writer, "{line}")
    } else {
        writeln!(writer, "{} {:?}", colored_kind(&token.kind), token.value)
    }
}

/// Per-type color for the readable listing.
fn colored_kind(kind: &str) -> ColoredString {
    match kind {
        "string" => kind.green(),
        "number" => kind.yellow(),
        "boolean" => kind.yellow().bold(),
        "null" => kind.red().dimmed(),
        "begin-object" | "end-object" | "begin-array" | "end-array" => {
            kind.cyan()
        }
        "end-label" | "comma" => kind.blue(),
        _ => kind.magenta(),
    }
}
