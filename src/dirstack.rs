use std::path::{Path, PathBuf};

/// Working-directory snapshots kept for `pushd`, `popd` and `dirs`.
///
/// Slot 0 is the directory the interpreter started in and is never replaced.
/// Every pushed slot remembers the directory that was current when it was
/// pushed, which is where `popd` returns to.
#[derive(Debug)]
pub struct DirStack {
	entries: Vec<PathBuf>,
	// returns[i] belongs to entries[i + 1]
	returns: Vec<PathBuf>,
}

impl DirStack {
	pub fn new(start: PathBuf) -> DirStack {
		DirStack { entries: vec![start], returns: vec![] }
	}

	/// Index of the top slot; 0 when nothing has been pushed.
	pub fn position(&self) -> usize {
		self.entries.len() - 1
	}

	/// Records a successful directory change from `previous` into `current`.
	pub fn push(&mut self, previous: PathBuf, current: PathBuf) {
		self.entries.push(current);
		self.returns.push(previous);
	}

	/// Drops the top slot and hands back the directory to return to, or
	/// `None` when the stack is empty.
	pub fn pop(&mut self) -> Option<PathBuf> {
		let previous = self.returns.pop()?;
		self.entries.pop();
		Some(previous)
	}

	/// Entries from top to bottom.
	pub fn iter(&self) -> impl Iterator<Item = &Path> {
		self.entries.iter().rev().map(PathBuf::as_path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn p(s: &str) -> PathBuf {
		PathBuf::from(s)
	}

	#[test]
	fn starts_with_one_entry() {
		let stack = DirStack::new(p("/home"));
		assert_eq!(stack.position(), 0);
		assert_eq!(stack.iter().collect::<Vec<_>>(), vec![Path::new("/home")]);
	}

	#[test]
	fn push_lists_most_recent_first() {
		let mut stack = DirStack::new(p("/a"));
		stack.push(p("/a"), p("/a/b"));
		stack.push(p("/a/b"), p("/tmp"));
		assert_eq!(stack.position(), 2);
		let listed: Vec<&Path> = stack.iter().collect();
		assert_eq!(listed, vec![Path::new("/tmp"), Path::new("/a/b"), Path::new("/a")]);
	}

	#[test]
	fn push_keeps_the_start_directory() {
		let mut stack = DirStack::new(p("/start"));
		stack.push(p("/start/x"), p("/start/x/y"));
		let listed: Vec<&Path> = stack.iter().collect();
		assert_eq!(listed, vec![Path::new("/start/x/y"), Path::new("/start")]);
		assert_eq!(stack.pop(), Some(p("/start/x")));
		assert_eq!(stack.iter().collect::<Vec<_>>(), vec![Path::new("/start")]);
	}

	#[test]
	fn pop_returns_to_recorded_directory() {
		let mut stack = DirStack::new(p("/a"));
		stack.push(p("/a"), p("/a/b/c"));
		stack.push(p("/a/b/c"), p("/tmp"));
		assert_eq!(stack.pop(), Some(p("/a/b/c")));
		assert_eq!(stack.pop(), Some(p("/a")));
		assert_eq!(stack.position(), 0);
	}

	#[test]
	fn pop_never_removes_the_base() {
		let mut stack = DirStack::new(p("/a"));
		assert!(stack.pop().is_none());
		assert_eq!(stack.iter().count(), 1);
	}
}
