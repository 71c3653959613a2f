//! poolsim interactive menu
//!
//! Text front end over the pool simulator: prompts for values, parses them
//! and renders statistics and layouts.

use anyhow::{Context, Result};
use clap::Parser;
use poolsim::{PoolConfig, PoolError, Simulator, Strategy};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "poolsim")]
#[command(about = "Interactive first-fit / best-fit / worst-fit allocator simulator")]
struct Args {
    /// Initialize a pool of this many bytes at startup
    #[arg(short = 'c', long)]
    capacity: Option<u64>,

    /// Placement strategy (first-fit, best-fit, worst-fit, or 0/1/2)
    #[arg(short = 's', long, default_value = "first-fit")]
    strategy: String,

    /// TOML pool configuration (overrides --capacity and --strategy)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print statistics and layouts as JSON
    #[arg(long)]
    json: bool,

    /// Show adjacent free blocks as separate layout rows
    #[arg(long)]
    no_coalesce: bool,
}

/// Parse a pool offset, accepting decimal or `0x` hex
fn parse_offset(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| format!("Invalid offset '{}'. Use decimal or 0x-prefixed hex", s))
}

/// Parse a byte count
fn parse_size(s: &str) -> Result<u64, String> {
    s.trim()
        .parse::<u64>()
        .map_err(|_| format!("Invalid size '{}'. Expected a non-negative integer", s.trim()))
}

/// Parse the --strategy argument
///
/// Numeric values follow the menu codes, so unknown codes fall back to
/// first fit; anything else must be a strategy name.
fn parse_strategy_arg(s: &str) -> Result<Strategy, PoolError> {
    match s.trim().parse::<i64>() {
        Ok(code) => Ok(Strategy::from_code(code)),
        Err(_) => s.parse::<Strategy>(),
    }
}

/// Parse a menu strategy code; unknown codes fall back to first fit
fn parse_strategy_code(s: &str) -> Strategy {
    s.trim()
        .parse::<i64>()
        .map(Strategy::from_code)
        .unwrap_or(Strategy::FirstFit)
}

struct Menu<R, W> {
    input: R,
    output: W,
    sim: Simulator,
    json: bool,
    coalesce_free: bool,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    /// Print a prompt and read one line; `None` on end of input
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn report(&mut self, err: &PoolError) -> Result<()> {
        let message = match err {
            PoolError::NotInitialized => "Initialize the pool first.".to_string(),
            PoolError::AlreadyInitialized => {
                "Pool is already initialized. Clean it up before reinitializing.".to_string()
            }
            PoolError::NoFit { requested } => format!(
                "Allocation of {} bytes failed. Try a smaller size or free some blocks.",
                requested
            ),
            other => other.to_string(),
        };
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "--- Pool Simulator ---")?;
            writeln!(self.output, "1. Initialize pool")?;
            writeln!(self.output, "2. Allocate")?;
            writeln!(self.output, "3. Free")?;
            writeln!(self.output, "4. Show layout")?;
            writeln!(self.output, "5. Show statistics")?;
            writeln!(self.output, "6. Clean up and exit")?;

            let Some(choice) = self.prompt("Choose an option: ")? else {
                break;
            };

            match choice.as_str() {
                "1" => self.init()?,
                "2" => self.allocate()?,
                "3" => self.free()?,
                "4" => self.layout()?,
                "5" => self.stats()?,
                "6" => break,
                _ => writeln!(self.output, "Invalid option. Try again.")?,
            }
        }

        if self.sim.is_active() {
            self.sim.cleanup()?;
            writeln!(self.output, "Pool cleaned up and all resources released.")?;
        }
        writeln!(self.output, "Exiting.")?;
        Ok(())
    }

    fn init(&mut self) -> Result<()> {
        if self.sim.is_active() {
            return self.report(&PoolError::AlreadyInitialized);
        }

        let Some(capacity) = self.prompt("Pool size in bytes: ")? else {
            return Ok(());
        };
        let capacity = match parse_size(&capacity) {
            Ok(capacity) => capacity,
            Err(message) => return Ok(writeln!(self.output, "{}", message)?),
        };

        let Some(code) =
            self.prompt("Strategy (0: First Fit, 1: Best Fit, 2: Worst Fit): ")?
        else {
            return Ok(());
        };
        let strategy = parse_strategy_code(&code);

        let config = PoolConfig::new(capacity)
            .strategy(strategy)
            .coalesce_free(self.coalesce_free);
        match self.sim.init_with(&config) {
            Ok(()) => writeln!(
                self.output,
                "Pool initialized with {} bytes using {} (strategy {}).",
                capacity,
                strategy,
                strategy.code()
            )?,
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn allocate(&mut self) -> Result<()> {
        if !self.sim.is_active() {
            return self.report(&PoolError::NotInitialized);
        }

        let Some(size) = self.prompt("Block size to allocate: ")? else {
            return Ok(());
        };
        let size = match parse_size(&size) {
            Ok(size) => size,
            Err(message) => return Ok(writeln!(self.output, "{}", message)?),
        };

        match self.sim.allocate(size) {
            Ok(offset) => writeln!(self.output, "Allocated at offset {:#x} ({}).", offset, offset)?,
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn free(&mut self) -> Result<()> {
        if !self.sim.is_active() {
            return self.report(&PoolError::NotInitialized);
        }

        let Some(offset) = self.prompt("Offset of the block to free: ")? else {
            return Ok(());
        };
        let offset = match parse_offset(&offset) {
            Ok(offset) => offset,
            Err(message) => return Ok(writeln!(self.output, "{}", message)?),
        };

        match self.sim.free(offset) {
            Ok(()) => writeln!(self.output, "Block at offset {:#x} freed.", offset)?,
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn layout(&mut self) -> Result<()> {
        let layout = match self.sim.layout() {
            Ok(layout) => layout,
            Err(err) => return self.report(&err),
        };

        if self.json {
            let rows = layout.rows();
            writeln!(self.output, "{}", serde_json::to_string_pretty(&rows)?)?;
        } else {
            write!(self.output, "{}", layout)?;
        }
        Ok(())
    }

    fn stats(&mut self) -> Result<()> {
        let stats = match self.sim.stats() {
            Ok(stats) => stats,
            Err(err) => return self.report(&err),
        };

        if self.json {
            writeln!(self.output, "{}", serde_json::to_string_pretty(&stats)?)?;
        } else {
            writeln!(self.output, "{}", stats)?;
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    // Keep log lines out of the menu unless RUST_LOG asks for them
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut sim = Simulator::new();
    let config = match (&args.config, args.capacity) {
        (Some(path), _) => Some(
            PoolConfig::from_file(path)
                .with_context(|| format!("loading pool config from {:?}", path))?,
        ),
        (None, Some(capacity)) => {
            let strategy = parse_strategy_arg(&args.strategy).context("parsing --strategy")?;
            Some(PoolConfig::new(capacity).strategy(strategy))
        }
        (None, None) => None,
    };

    if let Some(mut config) = config {
        if args.no_coalesce {
            config.coalesce_free = false;
        }
        sim.init_with(&config)?;
        info!(
            "Started with {} byte pool using {}",
            config.capacity, config.strategy
        );
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut menu = Menu {
        input: stdin.lock(),
        output: stdout.lock(),
        sim,
        json: args.json,
        coalesce_free: !args.no_coalesce,
    };

    menu.run()
}
