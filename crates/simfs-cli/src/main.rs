#![forbid(unsafe_code)]
//! Interactive shell over the SimFS engine.
//!
//! Reads commands from stdin one line at a time and dispatches them to
//! a single [`FileSystem`] instance. Engine errors render as
//! `<command>: <message>` on the shell, matching the usual coreutils
//! shape; only startup failures abort the process.

use anyhow::{bail, Context, Result};
use simfs_core::{FileSystem, SimfsError, DEFAULT_CAPACITY};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let options = Options::parse(env::args().skip(1))?;
    let mut fs = match options.seed {
        Some(seed) => FileSystem::with_capacity_and_seed(options.capacity, seed),
        None => FileSystem::with_capacity(options.capacity),
    }
    .context("failed to initialize the simulation")?;
    if let Some(strategy) = &options.strategy {
        fs.set_allocation_strategy(strategy)
            .context("invalid --strategy")?;
    }

    println!("SimFS shell. Type 'help' for commands, 'exit' to quit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{}$ ", fs.pwd())?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let tokens = tokenize(&line);
        let Some((command, args)) = tokens.split_first() else {
            continue;
        };
        if matches!(command.as_str(), "exit" | "quit") {
            break;
        }
        match dispatch(&mut fs, command, args) {
            Ok(Some(output)) => println!("{output}"),
            Ok(None) => {}
            Err(err) => println!("{command}: {err}"),
        }
    }
    Ok(())
}

// ── Startup options ─────────────────────────────────────────────────────────

struct Options {
    capacity: u64,
    seed: Option<u64>,
    strategy: Option<String>,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            capacity: DEFAULT_CAPACITY,
            seed: None,
            strategy: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--capacity" => {
                    let value = args.next().context("--capacity requires a byte count")?;
                    options.capacity = value
                        .parse()
                        .with_context(|| format!("invalid --capacity value: {value}"))?;
                }
                "--seed" => {
                    let value = args.next().context("--seed requires a number")?;
                    options.seed = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid --seed value: {value}"))?,
                    );
                }
                "--strategy" => {
                    options.strategy =
                        Some(args.next().context("--strategy requires a name")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => bail!("unknown option: {other}"),
            }
        }
        Ok(options)
    }
}

fn print_usage() {
    println!("simfs\n");
    println!("USAGE:");
    println!("  simfs [--capacity <bytes>] [--seed <n>] [--strategy <contiguous|linked|indexed>]");
}

// ── Dispatch ────────────────────────────────────────────────────────────────

/// Run one command. `Ok(None)` means success with nothing to print.
fn dispatch(fs: &mut FileSystem, command: &str, args: &[String]) -> simfs_core::Result<Option<String>> {
    debug!(command, ?args, "dispatching");
    let arg = |index: usize| -> simfs_core::Result<&str> {
        args.get(index)
            .map(String::as_str)
            .ok_or(SimfsError::MissingOperand)
    };

    match command {
        "ls" => Ok(Some(fs.ls(args.first().map(String::as_str))?)),
        "cd" => {
            fs.change_directory(args.first().map_or("", String::as_str))?;
            Ok(None)
        }
        "pwd" => Ok(Some(fs.pwd())),
        "mkdir" => Ok(Some(fs.mkdir(arg(0)?)?)),
        "touch" => {
            let name = arg(0)?.to_owned();
            let mut size = None;
            let mut content = None;
            let mut rest = args[1..].iter();
            while let Some(flag) = rest.next() {
                match flag.as_str() {
                    "--size" => {
                        let value = rest.next().ok_or(SimfsError::MissingOperand)?;
                        size = Some(
                            value
                                .parse()
                                .map_err(|_| SimfsError::InvalidArgument(value.clone()))?,
                        );
                    }
                    "--content" => {
                        content = Some(
                            rest.next().ok_or(SimfsError::MissingOperand)?.as_str(),
                        );
                    }
                    other => return Err(SimfsError::InvalidArgument(other.to_owned())),
                }
            }
            Ok(Some(fs.touch_with(&name, size, content)?))
        }
        "rm" => {
            let recursive = args.iter().any(|a| a == "-r" || a == "-rf");
            let name = args
                .iter()
                .find(|a| !a.starts_with('-'))
                .ok_or(SimfsError::MissingOperand)?;
            Ok(Some(fs.rm(name, recursive)?))
        }
        "cat" => Ok(Some(fs.cat(arg(0)?)?)),
        "file" => Ok(Some(fs.file_info(arg(0)?)?)),
        "chmod" => Ok(Some(fs.chmod(arg(0)?, arg(1)?)?)),
        "chown" => Ok(Some(fs.chown(arg(0)?, arg(1)?)?)),
        "df" => Ok(Some(fs.df())),
        "tree" => Ok(Some(fs.tree())),
        "find" => Ok(Some(fs.find(arg(0)?, args.get(1).map(String::as_str))?)),
        "strategy" => Ok(Some(fs.set_allocation_strategy(arg(0)?)?)),
        "blocks" => match args.first() {
            Some(name) => {
                let blocks = fs.file_blocks(name)?;
                // Files restored from a snapshot own no blocks.
                if blocks.blocks.is_empty() {
                    return Ok(Some(format!(
                        "No block allocation information for '{name}'"
                    )));
                }
                serde_json::to_string_pretty(&blocks)
                    .map(Some)
                    .map_err(|err| SimfsError::Snapshot(err.to_string()))
            }
            None => {
                let report = fs.block_report();
                Ok(Some(format!(
                    "blocks: {} total, {} used, {} free ({} bytes each)\nfragmentation: {}%",
                    report.total_blocks,
                    report.used_blocks,
                    report.free_blocks,
                    report.block_size,
                    report.fragmentation_index,
                )))
            }
        },
        "frag" => Ok(Some(format!("fragmentation: {}%", fs.fragmentation_index()))),
        "save" => Ok(Some(fs.save_state(Path::new(arg(0)?))?)),
        "load" => {
            let path = Path::new(arg(0)?);
            *fs = FileSystem::load_state(path)?;
            Ok(Some(format!(
                "File system state loaded from {}",
                path.display()
            )))
        }
        "reset" => {
            *fs = FileSystem::with_capacity(fs.capacity())?;
            Ok(Some("File system reset to initial state".to_owned()))
        }
        "help" => Ok(Some(help_text())),
        other => Ok(Some(format!("{other}: command not found"))),
    }
}

fn help_text() -> String {
    [
        "Commands:",
        "  ls [path]                     list directory contents",
        "  cd [path]                     change directory ('' = /home/user)",
        "  pwd                           print working directory",
        "  mkdir <name>                  create a directory",
        "  touch <name> [--size N] [--content TEXT]",
        "                                create a file or refresh its timestamp",
        "  rm [-r] <name>                remove a file or directory",
        "  cat <name>                    show file contents",
        "  file <name>                   show file metadata",
        "  chmod <mode> <name>           change permissions (octal or rwx form)",
        "  chown <owner> <name>          change owner",
        "  df                            disk usage",
        "  tree                          render the whole tree",
        "  find <name> [path]            search by exact name",
        "  strategy <name>               set allocation strategy for new files",
        "  blocks [name]                 pool report, or one file's blocks",
        "  frag                          fragmentation index",
        "  save <path> / load <path>     snapshot to / from a JSON file",
        "  reset                         fresh bootstrapped state",
        "  exit                          quit",
    ]
    .join("\n")
}

// ── Tokenizer ───────────────────────────────────────────────────────────────

/// Split a command line on whitespace, honoring double quotes so
/// `touch notes.txt --content "two words"` keeps its payload intact.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// ── Tests ───────────────────────────────────────────────────────────────────
