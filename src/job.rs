use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, Pid};

pub trait WaitStatusExt {
	/// Exit code to report, or `None` while the process has not terminated.
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: Option<WaitStatus>,
}

/// The children started for one input line, in chain order.
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	pub fn new(size_hint: usize) -> Job {
		Job { processes: Vec::with_capacity(size_hint) }
	}

	/// Forks and, in the parent, records the child.
	pub fn push_fork(&mut self) -> nix::Result<unistd::ForkResult> {
		// The interpreter is single-threaded, and the child only touches
		// descriptors before it execs or `_exit`s.
		let r = unsafe { unistd::fork() }?;
		if let unistd::ForkResult::Parent { child } = r {
			debug!("forked {}", child);
			self.processes.push(Process { pid: child, status: None });
		}
		Ok(r)
	}

	/// Blocks until every process has terminated, collecting them in chain order.
	pub fn wait(&mut self) -> nix::Result<()> {
		for pr in self.processes.iter_mut() {
			while pr.status.and_then(WaitStatusExt::code).is_none() {
				match wait::waitpid(pr.pid, None) {
					Ok(status) => {
						debug!("{} changed state: {:?}", pr.pid, status);
						pr.status = Some(status);
					},
					Err(Errno::EINTR) => continue,
					Err(e) => return Err(e),
				}
			}
		}
		Ok(())
	}

	/// Exit code of the last stage, which is what the whole job reports.
	pub fn code(&self) -> Option<i32> {
		self.processes.last().and_then(|pr| pr.status).and_then(WaitStatusExt::code)
	}
}
