use std::ffi::{CString, NulError};

/// Most words a single command may carry, program name included.
pub const MAX_ARGS: usize = 16;
/// Most commands a pipeline may chain.
pub const MAX_STAGES: usize = 4;
/// Size of the line buffer, trailing newline included.
pub const CMDLINE_MAX: usize = 512;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output }

#[derive(Debug, PartialEq, Eq)]
pub struct Redirect<'a> {
	pub target: &'a [u8],
	pub typ: RedirectType,
}

/// One command of a line. `arguments[0]` is the program name.
#[derive(Debug, PartialEq, Eq)]
pub struct Command<'a> {
	pub name: &'a [u8],
	pub arguments: Vec<&'a [u8]>,
}

impl<'a> Command<'a> {
	pub fn argv(&self) -> Result<Vec<CString>, NulError> {
		self.arguments.iter().map(|&s| CString::new(s)).collect()
	}
}

#[derive(Debug)]
pub struct Pipeline<'a> {
	pub commands: Vec<Command<'a>>,
	pub redirect: Option<Redirect<'a>>,
}
