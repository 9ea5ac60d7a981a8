use std::ops::{Deref, DerefMut};

use soliloquy_primitives::ObjectId;

use crate::runtime::Runtime;

/// Scoped evisceration.
///
/// Dereferences to the runtime. On drop the context stack is cut back to the
/// depth it had before the guard was created, whether the scope ended
/// normally, through `?`, or after a rollback already rebuilt the stack.
pub struct ContextGuard<'rt> {
	rt: &'rt mut Runtime,
	depth: usize,
}

impl<'rt> ContextGuard<'rt> {
	pub(crate) fn new(rt: &'rt mut Runtime, object: ObjectId) -> Self {
		let depth = rt.depth();
		rt.eviscerate(object);
		Self { rt, depth }
	}

	/// Depth the stack returns to when the guard drops.
	pub fn base_depth(&self) -> usize {
		self.depth
	}
}

impl Deref for ContextGuard<'_> {
	type Target = Runtime;

	fn deref(&self) -> &Runtime {
		self.rt
	}
}

impl DerefMut for ContextGuard<'_> {
	fn deref_mut(&mut self) -> &mut Runtime {
		self.rt
	}
}

impl Drop for ContextGuard<'_> {
	fn drop(&mut self) {
		self.rt.restore_depth(self.depth);
	}
}
