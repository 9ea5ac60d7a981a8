//! Error and unwind types.
//!
//! The runtime has two failure channels. [`RuntimeError`] describes misuse
//! of the object model. [`Unwind`] is the control-flow value that replaces
//! nonlocal jumps: hook aborts, hook continues and transaction rollbacks all
//! travel up the call stack as `Err(Unwind)` through `?` until the frame that
//! owns them catches it.

use soliloquy_primitives::TxId;

/// Misuse of the object model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
	/// A raw payload write did not match the symbol's width.
	#[error("payload size mismatch for symbol '{symbol}': expected {expected} bytes, got {got}")]
	PayloadSize {
		/// Name of the symbol being written.
		symbol: String,
		/// Width the symbol was defined with.
		expected: usize,
		/// Width of the rejected payload.
		got: usize,
	},

	/// `reembowel` was called with nothing on the context stack.
	#[error("invalid context pop: the context stack is empty")]
	EmptyContext,

	/// A transaction operation ran outside any transaction.
	#[error("no active transaction")]
	NoTransaction,

	/// Adding a member would make a domain contain itself.
	#[error("domain '{domain}' would contain itself through '{member}'")]
	DomainCycle {
		/// Domain being extended.
		domain: String,
		/// Domain that was being added as a member.
		member: String,
	},

	/// Hook constraints did not settle within the configured pass budget.
	#[error("constraint contradiction in hook '{hook}' ({band} band) after {passes} passes")]
	ConstraintContradiction {
		/// Hook point name.
		hook: String,
		/// Band being sorted.
		band: &'static str,
		/// Number of scans performed.
		passes: usize,
	},

	/// A name-based lookup found nothing.
	#[error("unknown {kind} '{name}'")]
	UnknownName {
		/// What kind of entity was looked up.
		kind: &'static str,
		/// The name that was not found.
		name: String,
	},

	/// A startup initializer failed.
	#[error("startup initializer '{name}' (priority {priority}) failed: {reason}")]
	Startup {
		/// Initializer name.
		name: &'static str,
		/// Initializer tier.
		priority: u16,
		/// What went wrong.
		reason: String,
	},
}

/// Non-local exit travelling through `Err`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unwind {
	/// Stop the innermost running hook invocation.
	#[error("hook invocation aborted")]
	Abort,

	/// Leave the current handler as if it had returned.
	#[error("hook handler continued")]
	Continue,

	/// The given transaction was rolled back; its scope catches this.
	#[error("transaction {0} rolled back")]
	Rollback(TxId),

	/// Misuse outside any transaction.
	#[error(transparent)]
	Fault(#[from] RuntimeError),
}

/// Result of an operation that may unwind.
pub type Flow<T = ()> = Result<T, Unwind>;

/// Returns the unwind value that aborts the innermost hook invocation.
///
/// ```ignore
/// return Err(hook_abort());
/// ```
pub fn hook_abort() -> Unwind {
	Unwind::Abort
}

/// Returns the unwind value that ends the current handler early.
///
/// The invoker restores the context stack to the depth it had before the
/// handler and moves on to the next one.
pub fn continue_hook_in_current_context() -> Unwind {
	Unwind::Continue
}
