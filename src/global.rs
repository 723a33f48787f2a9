use std::{env, io};

use crate::dirstack::DirStack;

#[derive(Debug)]
pub struct Config {
	pub prompt: String,
	pub echo: bool,
}

/// Everything the read loop carries from one line to the next.
#[derive(Debug)]
pub struct State {
	pub config: Config,
	pub dir_stack: DirStack,
}

impl State {
	pub fn new(config: Config) -> io::Result<State> {
		let dir_stack = DirStack::new(env::current_dir()?);
		Ok(State { config: config, dir_stack: dir_stack })
	}
}
