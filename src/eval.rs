use std::{fs, io};
use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;

use log::debug;
use nix::fcntl::OFlag;
use nix::unistd;
use thiserror::Error;

use crate::builtin::{self, BuiltinError, Flow};
use crate::global;
use crate::job;
use crate::parser::{self, ParseError};
use crate::types::*;

#[derive(Debug, Error)]
pub enum ExecError {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error("cannot open output file")]
	OpenOutput,
	#[error("cannot open input file")]
	OpenInput,
	#[error("cannot create process")]
	Fork(#[source] nix::Error),
	#[error("cannot create pipe")]
	Pipe(#[source] nix::Error),
	#[error("cannot wait for process")]
	Wait(#[source] nix::Error),
}

/// Owner read-only.
const OUTPUT_MODE: u32 = 0o400;

/// Files a line's redirection binds to the standard descriptors of its command.
#[derive(Debug, Default)]
pub struct Stdio {
	pub input: Option<File>,
	pub output: Option<File>,
}

impl Stdio {
	pub fn open(redirect: Option<&Redirect>) -> Result<Stdio, ExecError> {
		let mut stdio = Stdio::default();
		let redirect = match redirect {
			Some(r) => r,
			None => return Ok(stdio),
		};
		let target = OsStr::from_bytes(redirect.target);
		match redirect.typ {
			RedirectType::Output => {
				// Output files may only be created in the current directory.
				if redirect.target.contains(&b'/') {
					return Err(ExecError::OpenOutput);
				}
				let file = fs::OpenOptions::new()
					.write(true)
					.create(true)
					.truncate(true)
					.mode(OUTPUT_MODE)
					.open(target)
					.map_err(|e| {
						debug!("open {:?} for output: {}", target, e);
						ExecError::OpenOutput
					})?;
				stdio.output = Some(file);
			},
			RedirectType::Input => {
				let file = File::open(target).map_err(|e| {
					debug!("open {:?} for input: {}", target, e);
					ExecError::OpenInput
				})?;
				stdio.input = Some(file);
			},
		}
		debug!("redirect {:?} bound to {:?}", redirect.typ, target);
		Ok(stdio)
	}
}

#[derive(Debug, PartialEq, Eq)]
pub enum EvalResult {
	/// The line ran; report this exit code.
	Done(i32),
	/// `exit` was issued.
	Exit,
	/// Nothing to run.
	Empty,
}

fn run_builtin(state: &mut global::State, builtin: builtin::Builtin, command: &Command, out: &mut dyn Write) -> EvalResult {
	let r = builtin(state, &command.arguments, out)
		.and_then(|flow| out.flush().map(|_| flow).map_err(BuiltinError::Output));
	match r {
		Ok(Flow::Exit) => EvalResult::Exit,
		Ok(Flow::Continue) => EvalResult::Done(0),
		Err(e) => {
			eprintln!("Error: {}", e);
			EvalResult::Done(1)
		},
	}
}

fn bind(fd: Option<RawFd>, to: RawFd) -> nix::Result<()> {
	if let Some(fd) = fd {
		unistd::dup2(fd, to)?;
	}
	Ok(())
}

fn exec_command(state: &mut global::State, command: &Command) -> ! {
	let code = match builtin::match_builtin(command.name) {
		Some(builtin) => match run_builtin(state, builtin, command, &mut io::stdout()) {
			EvalResult::Done(code) => code,
			EvalResult::Exit | EvalResult::Empty => 0,
		},
		None => {
			let e = match command.argv() {
				Ok(argv) => match unistd::execvp(&argv[0], &argv) {
					Ok(never) => match never {},
					Err(e) => e,
				},
				Err(_) => nix::Error::EINVAL,
			};
			debug!("exec {:?}: {}", OsStr::from_bytes(command.name), e);
			eprintln!("Error: command not found");
			1
		},
	};
	let _ = io::stdout().flush();
	unsafe { libc::_exit(code as libc::c_int) }
}

fn spawn_commands(state: &mut global::State, pipeline: &Pipeline, stdio: &Stdio,
                  job: &mut job::Job) -> Result<(), ExecError> {
	let last = pipeline.commands.len() - 1;
	let mut pipe_stdin: Option<OwnedFd> = None;
	for (i, command) in pipeline.commands.iter().enumerate() {
		let (pipe_read, pipe_write) = if i == last {
			(None, None)
		} else {
			let (r, w) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(ExecError::Pipe)?;
			(Some(r), Some(w))
		};
		match job.push_fork().map_err(ExecError::Fork)? {
			unistd::ForkResult::Parent { .. } => {
				drop(pipe_write);
				pipe_stdin = pipe_read;
			},
			unistd::ForkResult::Child => {
				let input = match pipe_stdin {
					Some(ref fd) => Some(fd.as_raw_fd()),
					None => stdio.input.as_ref().map(|f| f.as_raw_fd()),
				};
				let output = match pipe_write {
					Some(ref fd) => Some(fd.as_raw_fd()),
					None => stdio.output.as_ref().map(|f| f.as_raw_fd()),
				};
				if let Err(e) = bind(input, libc::STDIN_FILENO).and_then(|_| bind(output, libc::STDOUT_FILENO)) {
					eprintln!("Error: {}", e);
					unsafe { libc::_exit(1) }
				}
				drop(pipe_stdin);
				drop(pipe_read);
				drop(pipe_write);
				exec_command(state, command);
			},
		}
	}
	Ok(())
}

/// Runs one input line (without its newline).
pub fn eval(state: &mut global::State, line: &[u8]) -> Result<EvalResult, ExecError> {
	let pipeline = match parser::parse(line)? {
		Some(p) => p,
		None => return Ok(EvalResult::Empty),
	};
	debug!("parsed {:?}", pipeline);
	let stdio = Stdio::open(pipeline.redirect.as_ref())?;

	if pipeline.commands.len() == 1 {
		let command = &pipeline.commands[0];
		if let Some(builtin) = builtin::match_builtin(command.name) {
			let mut out: Box<dyn Write + '_> = match stdio.output {
				Some(ref f) => Box::new(f),
				None => Box::new(io::stdout()),
			};
			return Ok(run_builtin(state, builtin, command, &mut *out));
		}
	}

	// Anything still buffered would be written twice once the children exit.
	let _ = io::stdout().flush();
	let mut job = job::Job::new(pipeline.commands.len());
	let spawned = spawn_commands(state, &pipeline, &stdio, &mut job);
	let waited = job.wait();
	spawned?;
	waited.map_err(ExecError::Wait)?;
	Ok(EvalResult::Done(job.code().unwrap_or(1)))
}
