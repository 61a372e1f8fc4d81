use std::io::Read;
use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use crate::MdceError;
use crate::MdceResult;

/// How often a running child is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A fully described program invocation. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
	pub program: PathBuf,
	pub args: Vec<String>,
	pub current_dir: Option<PathBuf>,
	pub timeout: Option<Duration>,
}

impl CommandSpec {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			current_dir: None,
			timeout: None,
		}
	}

	#[must_use]
	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	#[must_use]
	pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.current_dir = Some(dir.into());
		self
	}

	#[must_use]
	pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	fn display_name(&self) -> String {
		self.program.display().to_string()
	}
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
	/// Exit code, `None` when the process was terminated by a signal.
	pub code: Option<i32>,
	pub stdout: String,
	pub stderr: String,
}

impl CommandOutput {
	pub fn success(&self) -> bool {
		self.code == Some(0)
	}
}

/// Runs external programs. The rewrite engine and the git layer only ever go
/// through this trait so both can be driven by fakes in tests.
pub trait CommandRunner {
	/// Run the command to completion, or until its timeout elapses.
	///
	/// A non-zero exit is not an error at this level; callers inspect
	/// [`CommandOutput::code`]. Errors are reserved for spawn failures and
	/// timeouts.
	fn run(&self, spec: &CommandSpec) -> MdceResult<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
	fn run(&self, spec: &CommandSpec) -> MdceResult<CommandOutput> {
		let mut command = Command::new(&spec.program);
		command
			.args(&spec.args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());

		if let Some(dir) = &spec.current_dir {
			command.current_dir(dir);
		}

		tracing::debug!(program = %spec.display_name(), args = ?spec.args, "spawning process");

		let mut child = command.spawn().map_err(|e| {
			MdceError::ProcessExecution {
				path: spec.display_name(),
				code: None,
				stderr: e.to_string(),
			}
		})?;

		let stdout = drain(child.stdout.take());
		let stderr = drain(child.stderr.take());

		let code = match spec.timeout {
			Some(timeout) => wait_with_deadline(&mut child, timeout, spec)?,
			None => child.wait()?.code(),
		};

		Ok(CommandOutput {
			code,
			stdout: collect(stdout),
			stderr: collect(stderr),
		})
	}
}

fn wait_with_deadline(
	child: &mut Child,
	timeout: Duration,
	spec: &CommandSpec,
) -> MdceResult<Option<i32>> {
	let deadline = Instant::now() + timeout;

	loop {
		if let Some(status) = child.try_wait()? {
			return Ok(status.code());
		}

		if Instant::now() >= deadline {
			tracing::warn!(program = %spec.display_name(), "process timed out, killing it");
			let _ = child.kill();
			let _ = child.wait();

			return Err(MdceError::ProcessTimeout {
				path: spec.display_name(),
				seconds: timeout.as_secs_f64(),
			});
		}

		thread::sleep(POLL_INTERVAL);
	}
}

type PipeReader = Option<JoinHandle<Vec<u8>>>;

/// Read a pipe to completion on a helper thread so a chatty child never
/// blocks on a full pipe buffer.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> PipeReader {
	pipe.map(|mut pipe| {
		thread::spawn(move || {
			let mut buffer = Vec::new();
			let _ = pipe.read_to_end(&mut buffer);
			buffer
		})
	})
}

fn collect(reader: PipeReader) -> String {
	reader
		.and_then(|handle| handle.join().ok())
		.map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
		.unwrap_or_default()
}
