//! Context stack (evisceration).
//!
//! Eviscerating an object pushes it on the context stack and makes it the
//! top owner of every symbol it implants, so unqualified reads and writes of
//! those symbols hit the object's slots. Reembowelment undoes the most recent
//! evisceration, including the ancestors it pulled in.

mod guard;

#[cfg(test)]
mod tests;

pub use guard::ContextGuard;
use soliloquy_primitives::ObjectId;
use tracing::trace;

use crate::error::{Flow, RuntimeError};
use crate::runtime::Runtime;
use crate::symbol::Owner;

impl Runtime {
	/// Enters `object`'s context, ancestors first.
	///
	/// Eviscerating an object that is already on the stack pushes another
	/// frame; the values it exposes do not change.
	pub fn eviscerate(&mut self, object: ObjectId) {
		if let Some(parent) = self.objects[object.index()].parent {
			self.eviscerate(parent);
		}
		self.push_frame(object);
	}

	/// Leaves the most recent evisceration.
	///
	/// Pops frames up to and including the first one whose object has no
	/// parent. An empty stack is an invalid context pop.
	pub fn reembowel(&mut self) -> Flow {
		if self.stack.is_empty() {
			return Err(self.fail(RuntimeError::EmptyContext));
		}
		while let Some(object) = self.pop_frame() {
			if self.objects[object.index()].parent.is_none() {
				break;
			}
		}
		Ok(())
	}

	/// The innermost context object.
	pub fn current(&self) -> Option<ObjectId> {
		self.stack.last().copied()
	}

	/// Number of frames on the context stack.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	/// The context stack, bottom first.
	pub fn context(&self) -> &[ObjectId] {
		&self.stack
	}

	/// Pops frames until the stack is no deeper than `depth`.
	pub fn restore_depth(&mut self, depth: usize) {
		while self.stack.len() > depth {
			self.pop_frame();
		}
	}

	/// Enters `object` for the lifetime of the returned guard.
	pub fn enter(&mut self, object: ObjectId) -> ContextGuard<'_> {
		ContextGuard::new(self, object)
	}

	/// Runs `f` inside `object`'s context and leaves it on every exit path.
	pub fn within<R>(&mut self, object: ObjectId, f: impl FnOnce(&mut Runtime) -> R) -> R {
		let mut guard = self.enter(object);
		f(&mut guard)
	}

	/// Pushes a single frame without pulling in ancestors.
	pub(crate) fn push_frame(&mut self, object: ObjectId) {
		let Self { objects, symbols, stack, .. } = self;
		let obj = &mut objects[object.index()];
		obj.eviscerations += 1;
		stack.push(object);
		for (&sym, &offset) in obj.state.implants.iter() {
			symbols[sym.index()].owners.push(Owner { object, offset });
		}
		trace!(object = ?object, depth = stack.len(), "context.push");
	}

	/// Pops a single frame, releasing its ownership frames.
	pub(crate) fn pop_frame(&mut self) -> Option<ObjectId> {
		let Self { objects, symbols, stack, .. } = self;
		let object = stack.pop()?;
		let obj = &mut objects[object.index()];
		for &sym in obj.state.implants.keys() {
			let popped = symbols[sym.index()].owners.pop();
			debug_assert_eq!(popped.map(|owner| owner.object), Some(object), "ownership stack out of sync");
		}
		obj.eviscerations -= 1;
		trace!(object = ?object, depth = stack.len(), "context.pop");
		Some(object)
	}
}
