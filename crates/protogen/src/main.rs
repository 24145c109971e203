use clap::Parser;
use protogen::cli::Cli;
use protogen::{CompileError, Compiler, ShutdownSignal};
use std::sync::OnceLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Raised from the SIGINT handler.
static SHUTDOWN: OnceLock<ShutdownSignal> = OnceLock::new();

/// Reset SIGPIPE to default behavior so piping to `head` etc. doesn't panic.
#[cfg(unix)]
fn reset_sigpipe() {
    // SAFETY: restores the default disposition of SIGPIPE; no Rust state is touched.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}

#[cfg(unix)]
extern "C" fn on_sigint(_: libc::c_int) {
    // Only an atomic load and store happen here, both async-signal-safe.
    if let Some(shutdown) = SHUTDOWN.get() {
        shutdown.raise();
    }
}

/// Stop the emission pool instead of dying mid-write on Ctrl-C.
#[cfg(unix)]
fn install_interrupt_handler(shutdown: ShutdownSignal) {
    if SHUTDOWN.set(shutdown).is_err() {
        return;
    }
    // SAFETY: `on_sigint` only touches the already-initialised `SHUTDOWN`.
    unsafe {
        libc::signal(
            libc::SIGINT,
            on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler(_: ShutdownSignal) {}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), CompileError> {
    let cwd = std::env::current_dir().map_err(|source| protogen::ConfigError::Io {
        path: ".".into(),
        source,
    })?;
    let config = cli.to_config(&cwd)?;
    let dry_run = config.dry_run;

    let compiler = Compiler::new(config);
    install_interrupt_handler(compiler.shutdown_signal());
    let report = compiler.compile()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if dry_run {
        for path in &report.files {
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn main() {
    reset_sigpipe();

    let cli = Cli::parse();
    init_tracing(cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("Fatal: {e}");
        std::process::exit(1);
    }
}
