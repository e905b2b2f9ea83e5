//! `relayctl`: command-line front end for the relay controller.
//!
//! One-shot mode executes a single protocol command and exits; `-i` starts
//! a REPL reading one command per line. Protocol responses go to stdout,
//! protocol errors and logs to stderr, matching the split the ASCII
//! protocol expects from its front ends.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use usbrelay_core::constants::{DEFAULT_DEVICE_NODE, MAX_DEVICES};
use usbrelay_device::{DeviceManager, DeviceSession};
use usbrelay_protocol::{Command, ProtocolEngine, ProtocolError, Response};
use usbrelay_transport::{AnyRelayPort, FtdiPort, MockPort};

/// Control a 4-channel USB relay board.
#[derive(Debug, Parser)]
#[command(name = "relayctl", version, about)]
struct Cli {
    /// Device node to address (usbrelay0..usbrelay3).
    #[arg(short = 'd', long = "device", default_value = DEFAULT_DEVICE_NODE)]
    device: String,

    /// Verbose output (debug logging to stderr).
    #[arg(short, long)]
    verbose: bool,

    /// Interactive mode: read commands from stdin repeatedly.
    #[arg(short, long)]
    interactive: bool,

    /// Use a mock board instead of real hardware.
    #[arg(long)]
    mock: bool,

    /// Protocol command, e.g. `set 1 on` or `write-mask 0x05`.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let line = cli.command.join(" ");

    // Commands that need no device are answered before anything is
    // attached, so `relayctl help` works with no board plugged in.
    if !cli.interactive {
        if line.trim().is_empty() {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            return Ok(ExitCode::FAILURE);
        }
        match Command::parse(&line) {
            Ok(Command::Version) => {
                println!("{}", Response::Version);
                return Ok(ExitCode::SUCCESS);
            }
            Ok(Command::Help) => {
                println!("{}", Response::Help);
                return Ok(ExitCode::SUCCESS);
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("{err}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let manager = DeviceManager::new();
    attach_boards(&manager, cli.mock).await?;

    let session = match manager.open_node(&cli.device).await {
        Ok(session) => session,
        Err(err) => {
            eprintln!("{}", ProtocolError::from(err));
            manager.detach_all().await;
            return Ok(ExitCode::from(2));
        }
    };

    let status = if cli.interactive {
        run_interactive(session, cli.verbose).await?
    } else {
        run_one_shot(session, &line).await
    };

    manager.detach_all().await;
    Ok(status)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Attach every discovered board (or one mock board).
async fn attach_boards(manager: &DeviceManager, mock: bool) -> anyhow::Result<()> {
    if mock {
        let (port, _handle) = MockPort::new();
        manager
            .attach(AnyRelayPort::Mock(port))
            .await
            .context("failed to attach mock board")?;
        return Ok(());
    }

    let ports = FtdiPort::discover().context("USB enumeration failed")?;
    for port in ports.into_iter().take(MAX_DEVICES) {
        if let Err(err) = manager.attach(AnyRelayPort::Ftdi(port)).await {
            warn!(error = %err, "board failed to attach, skipping");
        }
    }
    Ok(())
}

/// Execute a single already-validated command line.
async fn run_one_shot(mut session: DeviceSession, line: &str) -> ExitCode {
    // Parsing succeeded in main; re-parse to keep one code path.
    match dispatch(&mut session, line).await {
        Ok(response) => {
            println!("{response}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// REPL: one command per line, `quit`/`exit` to leave.
async fn run_interactive(mut session: DeviceSession, verbose: bool) -> anyhow::Result<ExitCode> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut status = ExitCode::SUCCESS;

    loop {
        if verbose {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
        }

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match dispatch(&mut session, line).await {
            Ok(response) => println!("{response}"),
            Err(err) => {
                eprintln!("{err}");
                status = ExitCode::FAILURE;
            }
        }
    }

    Ok(status)
}

async fn dispatch(session: &mut DeviceSession, line: &str) -> Result<Response, ProtocolError> {
    let command = Command::parse(line)?;
    ProtocolEngine::execute(session, &command).await
}
