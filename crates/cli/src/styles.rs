//! Help output colours.
//!
//! Help follows the same colour decision as the `colored` diagnostics on
//! stderr, so `NO_COLOR` and `CLICOLOR_FORCE` apply to both.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

/// Styles for `--help` and usage errors.
pub fn cli_styles() -> Styles {
	help_styles(colored::control::SHOULD_COLORIZE.should_colorize())
}

fn help_styles(color: bool) -> Styles {
	if !color {
		return Styles::plain();
	}
	let flag = AnsiColor::Cyan.on_default().bold();
	Styles::styled()
		.header(AnsiColor::Yellow.on_default().bold().underline())
		.usage(AnsiColor::Yellow.on_default().bold())
		.literal(flag)
		.placeholder(AnsiColor::Cyan.on_default().italic())
		.valid(flag)
		.invalid(AnsiColor::Red.on_default())
		.error(AnsiColor::Red.on_default().bold())
}
