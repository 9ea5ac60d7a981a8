//! Hook invocation.

use std::rc::Rc;

use soliloquy_primitives::{Band, HookPointId};
use tracing::{trace, trace_span};

use super::HookEntry;
use crate::error::{Flow, Unwind};
use crate::runtime::Runtime;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookOutcome {
	/// Every eligible handler ran.
	#[default]
	Completed,
	/// A handler unwound with [`Unwind::Abort`]; later handlers were skipped.
	Aborted,
}

impl Runtime {
	/// Runs every handler of `point`: before, then main, then after.
	///
	/// The bands are snapshotted first, so handlers added or removed while the
	/// invocation runs take effect from the next invocation. Handlers whose
	/// gate reads `false` are skipped. A bound handler runs with its object
	/// eviscerated. Whatever way a handler exits, the context stack is cut
	/// back to the depth it had before that handler, and once the invocation
	/// ends, to the depth at the call site.
	///
	/// [`Unwind::Continue`] ends only the current handler and [`Unwind::Abort`]
	/// ends the invocation, reported as [`HookOutcome::Aborted`]. Rollbacks
	/// and faults keep propagating to the caller.
	pub fn invoke_hook(&mut self, point: HookPointId) -> Flow<HookOutcome> {
		let depth = self.stack.len();
		let hook = &self.hooks[point.index()];
		let bands = hook.bands.clone();
		let span = trace_span!("hook.invoke", hook = %hook.name);
		let _entered = span.enter();

		let result = self.run_bands(&bands);
		self.restore_depth(depth);
		match result {
			Ok(()) => Ok(HookOutcome::Completed),
			Err(Unwind::Abort) => {
				trace!("hook.aborted");
				Ok(HookOutcome::Aborted)
			}
			Err(unwind) => Err(unwind),
		}
	}

	/// Invokes the hook point with this name.
	pub fn invoke_named(&mut self, name: &str) -> Flow<HookOutcome> {
		match self.lookup_hook(name) {
			Some(point) => self.invoke_hook(point),
			None => {
				let err = crate::error::RuntimeError::UnknownName {
					kind: "hook point",
					name: name.to_string(),
				};
				Err(self.fail(err))
			}
		}
	}

	fn run_bands(&mut self, bands: &[Vec<Rc<HookEntry>>; 3]) -> Flow {
		let trace_hooks = self.config.trace_hooks;
		for (band, entries) in Band::ALL.into_iter().zip(bands) {
			for entry in entries {
				if let Some(gate) = entry.condition
					&& !self.get(gate)
				{
					continue;
				}
				if trace_hooks {
					trace!(band = band.as_str(), id = %entry.tag.id, bound = ?entry.bound, "hook.handler");
				}

				let depth = self.stack.len();
				if let Some(object) = entry.bound {
					self.eviscerate(object);
				}
				let result = (entry.handler)(self);
				self.restore_depth(depth);

				match result {
					Ok(()) | Err(Unwind::Continue) => {}
					Err(unwind) => return Err(unwind),
				}
			}
		}
		Ok(())
	}
}
