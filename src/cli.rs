use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EchoMode {
	/// Echo input lines when standard input is not a terminal
	Auto,
	Always,
	Never,
}

#[derive(Debug, Parser)]
#[command(name = "sshell", version, about = "A small interactive command interpreter")]
pub struct Cli {
	/// Prompt printed before each line is read
	#[arg(long, default_value = "sshell$ ")]
	pub prompt: String,

	/// When to echo each input line back after the prompt
	#[arg(long, value_enum, default_value_t = EchoMode::Auto)]
	pub echo: EchoMode,
}
