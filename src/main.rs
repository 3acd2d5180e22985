//! serial-exec binary entry point.

use std::process::ExitCode;

use serial_exec::cli::{self, Args};
use serial_exec::config::Config;
use serial_exec::{logging, Command, Executor, SerialExecError};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'serial-exec --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(code) => code,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::from(2)
        }
    }
}

/// Resolve configuration, then run the command and report its outcome.
///
/// `Err` is reserved for usage problems detected before the console is touched.
async fn run(args: &Args) -> Result<ExitCode, String> {
    let config = Config::load(args).map_err(|e| e.to_string())?;
    let _ = logging::init_with_filter(config.log_filter());

    config.validate().map_err(|e| e.to_string())?;
    let command_line = args.require_command().map_err(|e| e.to_string())?;

    info!("serial-exec v{}", env!("CARGO_PKG_VERSION"));

    let command = Command::new(command_line);
    let executor = Executor::new(config.executor_options());
    let execution = executor.execute_serial(&config.serial.path, config.serial.baud_rate, &command);

    let result = tokio::select! {
        result = execution => result,
        _ = tokio::signal::ctrl_c() => {
            error!("interrupted");
            return Ok(ExitCode::from(130));
        }
    };

    Ok(report(result))
}

fn report(result: serial_exec::Result<String>) -> ExitCode {
    match result {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let SerialExecError::RemoteCommandFailed { output, .. } = &e {
                if !output.is_empty() {
                    println!("{}", output);
                }
            } else if let Some(partial) = e.output().filter(|p| !p.is_empty()) {
                eprintln!("{}", partial);
            }
            error!(error = %e, "command failed");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_status() as u8)
        }
    }
}
