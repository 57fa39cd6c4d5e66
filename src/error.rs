use std::fmt;

/// Error type user functions, hooks and teardowns report failures with.
pub type BoxError = Box<dyn std::error::Error + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
	DidReceiveArguments,
	DidUpdateArguments,
	DidInstall,
	WillRemove,
	WillDestroy,
}

impl Hook {
	pub fn name(self) -> &'static str {
		match self {
			Hook::DidReceiveArguments => "did_receive_arguments",
			Hook::DidUpdateArguments => "did_update_arguments",
			Hook::DidInstall => "did_install",
			Hook::WillRemove => "will_remove",
			Hook::WillDestroy => "will_destroy",
		}
	}
}

impl fmt::Display for Hook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The hook object could not be constructed. Nothing was installed.
	#[error("modifier `{name}` failed to construct")]
	Construction {
		name: &'static str,
		#[source]
		source: BoxError,
	},

	/// A lifecycle hook of a hook-object modifier failed.
	#[error("modifier `{name}` failed in `{hook}`")]
	Hook {
		name: &'static str,
		hook: Hook,
		#[source]
		source: BoxError,
	},

	/// The function of a function-based modifier failed.
	#[error("modifier `{name}` failed to run")]
	Run {
		name: &'static str,
		#[source]
		source: BoxError,
	},

	/// A teardown returned by a previous run failed.
	#[error("teardown of modifier `{name}` failed")]
	Teardown {
		name: &'static str,
		#[source]
		source: BoxError,
	},

	#[error("modifier `{name}` is already installed")]
	AlreadyInstalled { name: &'static str },

	#[error("modifier `{name}` was updated before it was installed")]
	NotInstalled { name: &'static str },

	/// The first run failed. The instance is spent and can only be destroyed.
	#[error("modifier `{name}` failed to install and can only be destroyed")]
	Aborted { name: &'static str },

	#[error("modifier `{name}` is destroyed")]
	Destroyed { name: &'static str },

	/// A lifecycle call arrived while another one was still running.
	#[error("modifier `{name}` was re-entered during a lifecycle call")]
	Reentrant { name: &'static str },

	#[error("service `{0}` is not registered")]
	ServiceNotFound(String),

	#[error("service `{0}` has an unexpected type")]
	ServiceType(String),
}

impl Error {
	/// Lifecycle contract violations, as opposed to failures of user code.
	pub fn is_misuse(&self) -> bool {
		matches!(
			self,
			Error::AlreadyInstalled { .. }
				| Error::NotInstalled { .. }
				| Error::Aborted { .. }
				| Error::Destroyed { .. }
				| Error::Reentrant { .. }
		)
	}
}
