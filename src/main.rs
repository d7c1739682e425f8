/*!
 * safefs - Main Entry Point
 *
 * Runs one guarded filesystem operation from the shell:
 * - size: file size in bytes
 * - exists: true or false
 * - copy: file or directory tree
 *
 * The hidden `worker` subcommand is the child side of the process guard and
 * must keep stdout free for the protocol.
 */

use clap::{Args, Parser, Subcommand, ValueEnum};
use safe_fs::process::worker::run_worker;
use safe_fs::{
    init_tracing, CopyOptions, ExistingPolicy, SafeFileSystem, SafeFsConfig, SymlinkPolicy,
    TimeoutSpec,
};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "safefs")]
#[command(about = "Bounded-time filesystem operations for mounts that may hang")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the size of a file in bytes
    Size {
        path: PathBuf,
        #[command(flatten)]
        guard: GuardArgs,
    },

    /// Print whether a path exists
    Exists {
        path: PathBuf,
        #[command(flatten)]
        guard: GuardArgs,
    },

    /// Copy a file or directory tree
    Copy {
        src: PathBuf,
        dst: PathBuf,

        /// Copy only the top level of a directory
        #[arg(long)]
        no_recursive: bool,

        /// What to do when a destination file already exists
        #[arg(long, value_enum, default_value_t = ExistingArg::Error)]
        existing: ExistingArg,

        /// How to treat symlinks in the source
        #[arg(long, value_enum, default_value_t = SymlinkArg::Follow)]
        symlinks: SymlinkArg,

        /// Recreate the directory structure without files
        #[arg(long)]
        directories_only: bool,

        #[command(flatten)]
        guard: GuardArgs,
    },

    /// Serve one request on stdin/stdout (used by the process guard)
    #[command(hide = true)]
    Worker,
}

#[derive(Args)]
struct GuardArgs {
    /// Guard strategy
    #[arg(long, value_enum, default_value_t = Isolation::Process)]
    isolation: Isolation,

    /// Timeout in whole seconds (default depends on the operation)
    #[arg(long, value_parser = parse_timeout)]
    timeout: Option<TimeoutSpec>,

    /// Correlation string attached to log records and errors
    #[arg(long, default_value = "")]
    reference: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Isolation {
    /// Soft timeout on a second thread
    Thread,
    /// Hard timeout in a killed-on-deadline child process
    Process,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExistingArg {
    Error,
    Skip,
    Overwrite,
    Update,
}

impl From<ExistingArg> for ExistingPolicy {
    fn from(arg: ExistingArg) -> Self {
        match arg {
            ExistingArg::Error => Self::Error,
            ExistingArg::Skip => Self::Skip,
            ExistingArg::Overwrite => Self::Overwrite,
            ExistingArg::Update => Self::Update,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SymlinkArg {
    Follow,
    Copy,
    Skip,
}

impl From<SymlinkArg> for SymlinkPolicy {
    fn from(arg: SymlinkArg) -> Self {
        match arg {
            SymlinkArg::Follow => Self::Follow,
            SymlinkArg::Copy => Self::Copy,
            SymlinkArg::Skip => Self::Skip,
        }
    }
}

fn parse_timeout(raw: &str) -> Result<TimeoutSpec, String> {
    let secs: i64 = raw
        .parse()
        .map_err(|_| format!("'{}' is not a whole number of seconds", raw))?;
    TimeoutSpec::from_secs(secs).map_err(|e| e.to_string())
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    if let Command::Worker = cli.command {
        std::process::exit(run_worker());
    }

    let config = SafeFsConfig::from_env()?;
    debug!(?config, "safefs starting");
    let safe = SafeFileSystem::with_config(config);

    match cli.command {
        Command::Size { path, guard } => {
            let size = match guard.isolation {
                Isolation::Thread => safe.file_size_thread(&path, guard.timeout, &guard.reference)?,
                Isolation::Process => safe.file_size_process(&path, guard.timeout, &guard.reference)?,
            };
            println!("{}", size);
        }
        Command::Exists { path, guard } => {
            let exists = match guard.isolation {
                Isolation::Thread => safe.exists_thread(&path, guard.timeout, &guard.reference)?,
                Isolation::Process => safe.exists_process(&path, guard.timeout, &guard.reference)?,
            };
            println!("{}", exists);
        }
        Command::Copy {
            src,
            dst,
            no_recursive,
            existing,
            symlinks,
            directories_only,
            guard,
        } => {
            let mut options = if no_recursive {
                CopyOptions::shallow()
            } else {
                CopyOptions::recursive()
            }
            .with_existing(existing.into())
            .with_symlinks(symlinks.into());
            if directories_only {
                options = options.directories_only();
            }

            match guard.isolation {
                Isolation::Thread => {
                    safe.copy_thread(&src, &dst, options, guard.timeout, &guard.reference)?
                }
                Isolation::Process => {
                    safe.copy_process(&src, &dst, options, guard.timeout, &guard.reference)?
                }
            }
            info!(src = %src.display(), dst = %dst.display(), "copy finished");
        }
        Command::Worker => unreachable!("worker mode exits above"),
    }

    debug!(stats = ?safe.stats(), "guard counters");
    Ok(())
}
