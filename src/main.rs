use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use awful::config::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_DEPTH};
use awful::{CommentStyle, Config, Flow, Interpreter, LineReader, Session};
use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "AWFUL - A Weird FUnctional Language", long_about = None)]
struct Args {
    /// Evaluate FILE in batch mode instead of starting the REPL
    file: Option<PathBuf>,

    /// Maximum evaluation nesting
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Cells reserved per arena chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Fail an evaluation once this many list cells are in use
    #[arg(long)]
    max_cells: Option<usize>,

    /// Forget interned strings between top-level evaluations
    #[arg(long)]
    reset_interner: bool,

    /// A backslash comments out the rest of the input instead of the line
    #[arg(long)]
    comment_to_end: bool,
}

impl Args {
    fn config(&self) -> Config {
        let comment = if self.comment_to_end {
            CommentStyle::ToEndOfInput
        } else {
            CommentStyle::ToEndOfLine
        };
        Config::default()
            .with_max_depth(self.max_depth)
            .with_chunk_size(self.chunk_size)
            .with_max_cells(self.max_cells)
            .with_comment(comment)
            .with_reset_interner(self.reset_interner)
    }
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".awful_history"))
}

fn repl(session: &mut Session<io::Stdout>) -> Result<(), String> {
    println!("AWFUL - A Weird FUnctional Language");
    println!();
    println!("Type: 'bye' to leave, 'batch FILENAME' to process a file");
    println!("Lines starting with backslash or empty are skipped");
    println!("A line ending with backslash is joined to the following one");

    let mut rl = DefaultEditor::new().map_err(|e| format!("Could not start line editor: {e}"))?;
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    let mut reader = LineReader::new();
    loop {
        let prompt = if reader.is_continuing() {
            format!("awful {}| ", reader.line() + 1)
        } else {
            format!("\nawful {}: ", reader.line() + 1)
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let Some(command) = reader.feed(&line) else {
                    continue;
                };
                match session.execute(command, reader.line()) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Stop) => break,
                    Err(e) => return Err(e.to_string()),
                }
                let _ = io::stdout().flush();
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(e) => return Err(format!("Error reading input: {e}")),
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    println!("Goodbye");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let interp = Interpreter::with_config(args.config());
    let mut session = Session::new(interp, io::stdout());

    let result = match &args.file {
        Some(path) => session.run_file(path).map_err(|e| e.to_string()),
        None => repl(&mut session),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
