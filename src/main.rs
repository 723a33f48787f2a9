mod builtin;
mod cli;
mod dirstack;
mod eval;
mod global;
mod job;
mod parser;
mod types;

use std::io;
use std::io::{BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use cli::{Cli, EchoMode};
use eval::EvalResult;

fn echo_enabled(mode: EchoMode) -> bool {
	match mode {
		EchoMode::Always => true,
		EchoMode::Never => false,
		EchoMode::Auto => !io::stdin().is_terminal(),
	}
}

fn complete(line: &[u8], code: i32) {
	let mut stderr = io::stderr();
	let _ = stderr.write_all(b"+ completed '");
	let _ = stderr.write_all(line);
	let _ = writeln!(stderr, "' [{}]", code);
}

fn main() -> Result<()> {
	env_logger::init();
	let cli = Cli::parse();
	let config = global::Config { prompt: cli.prompt, echo: echo_enabled(cli.echo) };
	let mut state = global::State::new(config).context("cannot read starting directory")?;

	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	loop {
		let _ = stdout.write_all(state.config.prompt.as_bytes());
		let _ = stdout.flush();

		let mut buf: Vec<u8> = vec![];
		if stdin_locked.read_until(b'\n', &mut buf).context("cannot read command line")? == 0 {
			debug!("end of input");
			break;
		}
		if state.config.echo {
			let _ = stdout.write_all(&buf);
			if !buf.ends_with(b"\n") {
				let _ = stdout.write_all(b"\n");
			}
			let _ = stdout.flush();
		}
		let line = buf.strip_suffix(b"\n").unwrap_or(&buf);

		match eval::eval(&mut state, line) {
			Ok(EvalResult::Done(code)) => complete(line, code),
			Ok(EvalResult::Exit) => {
				eprintln!("Bye...");
				break;
			},
			Ok(EvalResult::Empty) => {},
			Err(e) => eprintln!("Error: {}", e),
		}
	}
	Ok(())
}
