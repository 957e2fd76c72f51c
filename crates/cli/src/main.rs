use chatpoll_cli::cli::Cli;
use chatpoll_cli::error::{CliError, EXIT_FAILURE, EXIT_INCOMPLETE};
use chatpoll_cli::output::{self, OutputFormat};
use chatpoll_cli::{logging, run};
use clap::Parser;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	let format = cli.format;

	let log_guard = match logging::init_logging(cli.verbose, cli.log_path().map(|p| p.as_path())) {
		Ok(guard) => guard,
		Err(err) => {
			handle_error(CliError::Io(err), format);
			std::process::exit(EXIT_FAILURE);
		}
	};

	let code = match run::execute(&cli).await {
		Ok(result) => {
			output::print_result(&result, format);
			if result.completed {
				0
			} else {
				output::print_incomplete_notice(&result);
				EXIT_INCOMPLETE
			}
		}
		Err(err) => {
			let code = err.exit_code();
			handle_error(err, format);
			code
		}
	};

	drop(log_guard);
	std::process::exit(code);
}

fn handle_error(err: CliError, format: OutputFormat) {
	let command_error = err.to_command_error();

	// Humans read stderr; scripts asking for JSON also get an envelope on stdout.
	output::print_error_stderr(&command_error);
	output::print_error(&command_error, format);
}
