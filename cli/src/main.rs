use std::time::Instant;
use std::{fs, process};

use anyhow::{Context, Result, bail};
use picobuild::{Session, manifest};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod output;
mod runtime;

use cli::{Args, Command};
use runtime::Host;

fn main() {
    let args = cli::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(code) => process::exit(code),
        Err(err) => {
            output::print_error(&err);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let path = args.directory.join(&args.file);
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut session = Session::new(Host::new(&args.directory, args.quiet));
    manifest::load(&mut session, &content)
        .with_context(|| format!("Invalid build description {}", path.display()))?;

    if let Some(cc) = args.cc {
        session.toolchain_mut().compiler = cc;
    }
    if let Some(ar) = args.ar {
        session.toolchain_mut().archiver = ar;
    }

    match args.command {
        Command::Build { target, force } => {
            let target = pick_target(&session, target)?;
            let compiler = &session.toolchain().compiler;
            which::which(compiler).with_context(|| format!("Compiler '{compiler}' not found"))?;
            create_output_dirs(&session, &args.directory)?;

            let start = Instant::now();
            let outcome = session.build(&target, force)?;
            debug!(commands = outcome.commands.len(), "build finished");
            println!("Elapsed time: {}", output::format_elapsed(start.elapsed()));
            Ok(0)
        }
        Command::Clean { target } => {
            let target = pick_target(&session, target)?;
            session.clean(&target)?;
            Ok(0)
        }
        Command::Run { target, args } => {
            let output = session.run(&target, args)?;
            Ok(output.returncode as i32)
        }
    }
}

/// The named target, or the only declared one when no name is given.
fn pick_target(session: &Session, target: Option<String>) -> Result<String> {
    if let Some(target) = target {
        return Ok(target);
    }
    let mut names = session
        .registry()
        .targets()
        .map(|t| t.name())
        .collect::<Vec<_>>();
    names.sort_unstable();
    match names.as_slice() {
        [] => bail!("No targets declared"),
        [name] => Ok((*name).to_string()),
        _ => bail!("Several targets declared, pick one of: {}", names.join(", ")),
    }
}

fn create_output_dirs(session: &Session, root: &std::path::Path) -> Result<()> {
    for target in session.registry().targets() {
        let dir = target.output_dir();
        if !dir.is_empty() {
            let dir = root.join(dir.as_str());
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }
    Ok(())
}
