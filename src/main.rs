use std::path::PathBuf;

use anyhow::Result;
use log::{info, LevelFilter};
use rustyline::{error::ReadlineError, Editor};
use structopt::StructOpt;

use relq::{DirStorage, Engine};

#[derive(Debug, StructOpt)]
#[structopt(name = "relq", about = "Relational algebra over flat text relations")]
struct Opt {
    /// Directory holding one `<relation>.csv` file per relation
    #[structopt(long, default_value = "data", parse(from_os_str))]
    data_dir: PathBuf,

    #[structopt(long, default_value = "> ")]
    prompt: String,

    /// Load readline history from this file and save it on exit
    #[structopt(long, parse(from_os_str))]
    history: Option<PathBuf>,

    /// Run the given statements and exit instead of prompting
    #[structopt(short, long)]
    execute: Vec<String>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn handle_input(engine: &mut Engine<DirStorage>, code: &str) {
    match engine.execute(code) {
        Ok(outcome) => println!("{}", outcome),
        Err(e) => println!("Error: {}", e),
    }
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logging(opt.verbose);

    let mut engine = Engine::new(DirStorage::new(&opt.data_dir));
    info!("using relations in {}", opt.data_dir.display());

    if !opt.execute.is_empty() {
        for code in &opt.execute {
            handle_input(&mut engine, code);
        }
        return Ok(());
    }

    let mut editor = Editor::<()>::new();
    if let Some(history) = &opt.history {
        if let Err(e) = editor.load_history(history) {
            info!("no history loaded from {}: {}", history.display(), e);
        }
    }

    loop {
        match editor.readline(&opt.prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str());
                handle_input(&mut engine, &line);
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Some(history) = &opt.history {
        editor.save_history(history)?;
    }

    Ok(())
}
