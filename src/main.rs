/*!
 * PoolFS Inspector
 *
 * Loads a pool configuration and answers policy and listing queries against
 * the branches without mounting anything.
 */

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use tracing::info;

use poolfs::{init_tracing, Caller, Config, DirEntries, Func, PoolFs};

#[derive(Parser)]
#[command(name = "poolfs", author, version, about = "Inspect a pooled filesystem", long_about = None)]
struct Cli {
    /// Pool configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the branch paths a function's policy picks
    Select {
        /// Function name, e.g. getattr, create, unlink
        func: Func,
        path: PathBuf,
    },
    /// Merged directory listing
    Ls {
        path: PathBuf,
        #[arg(long, help = "Print entries as JSON")]
        json: bool,
    },
    /// Attributes as the pool reports them
    Stat { path: PathBuf },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let pool = PoolFs::local(config)?;
    let caller = Caller::current();
    info!(config = %cli.config.display(), "pool loaded");

    match cli.command {
        Commands::Select { func, path } => {
            let targets = pool.select(caller, func, &path)?;
            for target in targets.iter() {
                println!("{}", target.full_path.display());
            }
        }
        Commands::Ls { path, json } => {
            let fh = pool.opendir(caller, &path)?;
            let mut entries = DirEntries::new();
            let merged = pool.readdir(caller, fh, &mut entries);
            pool.releasedir(fh)?;
            merged?;

            if json {
                let out = serde_json::to_string_pretty(entries.as_slice()).into_diagnostic()?;
                println!("{}", out);
            } else {
                let mut stdout = std::io::stdout().lock();
                for entry in entries.iter() {
                    stdout.write_all(entry.name().as_bytes()).into_diagnostic()?;
                    writeln!(stdout, "\t{}\t{:?}", entry.ino, entry.file_type).into_diagnostic()?;
                }
            }
        }
        Commands::Stat { path } => {
            let attr = pool.getattr(caller, &path)?;
            let out = serde_json::to_string_pretty(&attr).into_diagnostic()?;
            println!("{}", out);
        }
    }

    Ok(())
}
