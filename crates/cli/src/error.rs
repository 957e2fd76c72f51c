use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for a run whose poll budget ran out.
pub const EXIT_INCOMPLETE: i32 = 2;
/// Exit code for every failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Query(#[from] chatpoll::Error),

	#[error("invalid input: {0}")]
	Input(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	pub fn code(&self) -> ErrorCode {
		match self {
			CliError::Query(err) => match err {
				chatpoll::Error::Navigation { .. } => ErrorCode::NavigationFailed,
				chatpoll::Error::ControlNotFound { .. } => ErrorCode::ControlNotFound,
				chatpoll::Error::Interaction { .. } | chatpoll::Error::Evaluation(_) => ErrorCode::InteractionFailed,
				chatpoll::Error::BrowserLaunch(_) => ErrorCode::BrowserLaunchFailed,
				chatpoll::Error::Config(_) => ErrorCode::InvalidConfig,
				chatpoll::Error::Runtime(_) => ErrorCode::SessionError,
				chatpoll::Error::PollRead(_) | chatpoll::Error::Json(_) => ErrorCode::InternalError,
			},
			CliError::Input(_) => ErrorCode::InvalidInput,
			CliError::Io(_) => ErrorCode::IoError,
			CliError::Anyhow(_) => ErrorCode::InternalError,
		}
	}

	pub fn exit_code(&self) -> i32 {
		EXIT_FAILURE
	}

	pub fn to_command_error(&self) -> CommandError {
		CommandError {
			code: self.code(),
			message: format!("{self:#}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn core_errors_map_to_codes() {
		let err = CliError::from(chatpoll::Error::ControlNotFound {
			control: chatpoll::ControlKind::Submit,
			reason: "nothing strictly between".into(),
		});
		assert_eq!(err.code(), ErrorCode::ControlNotFound);
		assert_eq!(err.exit_code(), EXIT_FAILURE);
		let command = err.to_command_error();
		assert!(command.message.starts_with("submit control not found"));

		let err = CliError::from(chatpoll::Error::Config("poll.maxTicks must be at least 1".into()));
		assert_eq!(err.code(), ErrorCode::InvalidConfig);
	}

	#[test]
	fn anyhow_context_is_kept_in_message() {
		let source = anyhow::anyhow!("broken pipe").context("reading query from stdin");
		let command = CliError::from(source).to_command_error();
		assert_eq!(command.code, ErrorCode::InternalError);
		assert_eq!(command.message, "reading query from stdin: broken pipe");
	}
}
