use std::{env, io};
use std::ffi::OsStr;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::global;

#[derive(Debug, Error)]
pub enum BuiltinError {
	#[error("cannot cd into directory")]
	CannotCd,
	#[error("no such directory")]
	NoSuchDirectory,
	#[error("directory stack empty")]
	EmptyStack,
	#[error("cannot read current directory")]
	CurrentDir(#[source] io::Error),
	#[error("cannot write output")]
	Output(#[source] io::Error),
}

/// What the read loop does once a built-in returns.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Exit }

pub type BuiltinResult = Result<Flow, BuiltinError>;
pub type Builtin = fn(&mut global::State, &[&[u8]], &mut dyn Write) -> BuiltinResult;

fn current_dir() -> Result<PathBuf, BuiltinError> {
	env::current_dir().map_err(BuiltinError::CurrentDir)
}

fn print_dir(out: &mut dyn Write, dir: &Path) -> Result<(), BuiltinError> {
	out.write_all(dir.as_os_str().as_bytes())
		.and_then(|_| out.write_all(b"\n"))
		.map_err(BuiltinError::Output)
}

pub fn builtin_cd(_: &mut global::State, args: &[&[u8]], _: &mut dyn Write) -> BuiltinResult {
	let target = OsStr::from_bytes(args.get(1).ok_or(BuiltinError::CannotCd)?);
	env::set_current_dir(target).map_err(|e| {
		debug!("cd {:?}: {}", target, e);
		BuiltinError::CannotCd
	})?;
	Ok(Flow::Continue)
}

pub fn builtin_pwd(_: &mut global::State, _: &[&[u8]], out: &mut dyn Write) -> BuiltinResult {
	print_dir(out, &current_dir()?)?;
	Ok(Flow::Continue)
}

pub fn builtin_exit(_: &mut global::State, _: &[&[u8]], _: &mut dyn Write) -> BuiltinResult {
	Ok(Flow::Exit)
}

pub fn builtin_dirs(state: &mut global::State, _: &[&[u8]], out: &mut dyn Write) -> BuiltinResult {
	for dir in state.dir_stack.iter() {
		print_dir(out, dir)?;
	}
	Ok(Flow::Continue)
}

pub fn builtin_pushd(state: &mut global::State, args: &[&[u8]], _: &mut dyn Write) -> BuiltinResult {
	let target = OsStr::from_bytes(args.get(1).ok_or(BuiltinError::NoSuchDirectory)?);
	let previous = current_dir()?;
	env::set_current_dir(target).map_err(|e| {
		debug!("pushd {:?}: {}", target, e);
		BuiltinError::NoSuchDirectory
	})?;
	let current = current_dir()?;
	debug!("pushd {} -> {}", previous.display(), current.display());
	state.dir_stack.push(previous, current);
	Ok(Flow::Continue)
}

pub fn builtin_popd(state: &mut global::State, _: &[&[u8]], _: &mut dyn Write) -> BuiltinResult {
	// The slot goes even when its directory has vanished; nothing could return to it.
	let target = state.dir_stack.pop().ok_or(BuiltinError::EmptyStack)?;
	env::set_current_dir(&target).map_err(|e| {
		debug!("popd {}: {}", target.display(), e);
		BuiltinError::NoSuchDirectory
	})?;
	debug!("popd -> {}", target.display());
	Ok(Flow::Continue)
}

pub fn match_builtin(name: &[u8]) -> Option<Builtin> {
	match name {
		b"cd" => Some(builtin_cd),
		b"pwd" => Some(builtin_pwd),
		b"exit" => Some(builtin_exit),
		b"dirs" => Some(builtin_dirs),
		b"pushd" => Some(builtin_pushd),
		b"popd" => Some(builtin_popd),
		_ => None,
	}
}
