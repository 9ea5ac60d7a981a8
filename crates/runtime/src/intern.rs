//! String interning for [`Atom`] payloads.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use soliloquy_primitives::Atom;

/// Append-only string table. Atoms are never released.
#[derive(Debug)]
pub(crate) struct Interner {
	strings: Vec<Rc<str>>,
	lookup: FxHashMap<Rc<str>, Atom>,
}

impl Interner {
	pub(crate) fn new() -> Self {
		let mut interner = Self {
			strings: Vec::new(),
			lookup: FxHashMap::default(),
		};
		let empty = interner.intern("");
		debug_assert_eq!(empty, Some(Atom::EMPTY));
		interner
	}

	/// Returns `None` once the atom space is exhausted.
	pub(crate) fn intern(&mut self, text: &str) -> Option<Atom> {
		if let Some(&atom) = self.lookup.get(text) {
			return Some(atom);
		}
		let atom = Atom::try_from_index(self.strings.len())?;
		let text: Rc<str> = Rc::from(text);
		self.strings.push(Rc::clone(&text));
		self.lookup.insert(text, atom);
		Some(atom)
	}

	/// Returns the text of `atom`, or the empty string for a foreign atom.
	pub(crate) fn resolve(&self, atom: Atom) -> &str {
		self.strings.get(atom.index()).map_or("", |s| &**s)
	}

	pub(crate) fn len(&self) -> usize {
		self.strings.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn interning_is_idempotent() {
		let mut interner = Interner::new();
		let a = interner.intern("read-only");
		let b = interner.intern("read-only");
		assert_eq!(a, b);
		assert_eq!(interner.resolve(a.unwrap()), "read-only");
		assert_eq!(interner.len(), 2);
	}

	#[test]
	fn empty_string_is_the_empty_atom() {
		let mut interner = Interner::new();
		assert_eq!(interner.intern(""), Some(Atom::EMPTY));
		assert_eq!(interner.resolve(Atom::from_index(99)), "");
	}
}
