//! Object store.
//!
//! Objects live in an arena owned by the [`Runtime`] and are addressed by
//! [`ObjectId`]. Each object carries an implant map (symbol to byte offset)
//! and a zero-initialized data block holding its value for every implanted
//! symbol. Implants are append-only; only a transaction rollback shrinks the
//! map, by restoring an older snapshot.


use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use soliloquy_primitives::{DomainId, ObjectId, Payload, SymbolId, TxId};
use tracing::trace;

use crate::error::{Flow, RuntimeError};
use crate::runtime::Runtime;
use crate::symbol::{Owner, Sym};

/// Largest alignment any payload slot needs.
pub const MAX_ALIGN: usize = 8;

pub(crate) type ImplantMap = IndexMap<SymbolId, usize, FxBuildHasher>;

/// What to implant: one symbol, or every member of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Implant {
	Symbol(SymbolId),
	Domain(DomainId),
}

impl From<SymbolId> for Implant {
	fn from(id: SymbolId) -> Self {
		Self::Symbol(id)
	}
}

impl<T: Payload> From<Sym<T>> for Implant {
	fn from(sym: Sym<T>) -> Self {
		Self::Symbol(sym.id())
	}
}

impl From<DomainId> for Implant {
	fn from(id: DomainId) -> Self {
		Self::Domain(id)
	}
}

/// The part of an object a transaction backs up.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ObjectState {
	pub(crate) implants: ImplantMap,
	pub(crate) data: Vec<u8>,
}

/// Pre-transaction snapshot; `next` is the snapshot of the enclosing
/// transaction, so the chain mirrors transaction nesting.
#[derive(Debug)]
pub(crate) struct Backup {
	pub(crate) state: ObjectState,
	pub(crate) tx: TxId,
	pub(crate) next: Option<Box<Backup>>,
}

#[derive(Debug)]
pub(crate) struct Object {
	pub(crate) parent: Option<ObjectId>,
	pub(crate) state: ObjectState,
	pub(crate) eviscerations: u32,
	pub(crate) tx: TxId,
	pub(crate) backup: Option<Box<Backup>>,
}

/// Observable state of an object: its implants in order and its data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSnapshot {
	pub parent: Option<ObjectId>,
	pub implants: Vec<(SymbolId, usize)>,
	pub data: Vec<u8>,
}

fn slot_align(size: usize) -> usize {
	size.next_power_of_two().min(MAX_ALIGN)
}

fn align_up(offset: usize, align: usize) -> usize {
	offset.div_ceil(align) * align
}

impl Runtime {
	/// Creates an empty object.
	pub fn new_object(&mut self, parent: Option<ObjectId>) -> ObjectId {
		let id = self.allocate("object", self.objects.len(), ObjectId::try_from_index);
		self.objects.push(Object {
			parent,
			state: ObjectState::default(),
			eviscerations: 0,
			tx: TxId::NONE,
			backup: None,
		});
		trace!(object = ?id, ?parent, "object.new");
		id
	}

	/// Shallow copy of `source`: same parent, implants and values.
	///
	/// The clone is not on the context stack and has no transaction history.
	pub fn clone_object(&mut self, source: ObjectId) -> ObjectId {
		let original = &self.objects[source.index()];
		let clone = Object {
			parent: original.parent,
			state: original.state.clone(),
			eviscerations: 0,
			tx: TxId::NONE,
			backup: None,
		};
		let id = self.allocate("object", self.objects.len(), ObjectId::try_from_index);
		self.objects.push(clone);
		trace!(object = ?id, ?source, "object.clone");
		id
	}

	/// Implants a symbol, or every member of a domain, into `object`.
	///
	/// Re-implanting is a no-op. A new slot starts with the symbol's current
	/// live value. If `object` is eviscerated, every one of its context frames
	/// gains an ownership frame for the symbol.
	pub fn implant(&mut self, object: ObjectId, what: impl Into<Implant>) {
		match what.into() {
			Implant::Symbol(sym) => self.implant_symbol(object, sym),
			Implant::Domain(domain) => {
				let members = self.domains[domain.index()].members.clone();
				for member in members {
					self.implant(object, member);
				}
			}
		}
	}

	pub(crate) fn implant_symbol(&mut self, object: ObjectId, sym: SymbolId) {
		if self.objects[object.index()].state.implants.contains_key(&sym) {
			return;
		}
		self.tx_touch(object);

		let size = self.symbols[sym.index()].size;
		let live = self.read_payload(sym).to_vec();
		let obj = &mut self.objects[object.index()];
		let offset = align_up(obj.state.data.len(), slot_align(size));
		obj.state.data.resize(offset + size, 0);
		obj.state.data[offset..offset + size].copy_from_slice(&live);
		obj.state.implants.insert(sym, offset);
		trace!(object = ?object, symbol = ?sym, offset, "object.implant");

		if obj.eviscerations > 0 {
			self.rebuild_owners(sym);
		}
	}

	/// Recomputes a symbol's ownership stack from the context stack.
	///
	/// The ownership stack is the context stack restricted to objects that
	/// implant the symbol, so one bottom-to-top pass over the context stack
	/// places a frame for every appearance of every implanter.
	fn rebuild_owners(&mut self, sym: SymbolId) {
		let Self { stack, objects, symbols, .. } = self;
		let owners = &mut symbols[sym.index()].owners;
		owners.clear();
		for &frame in stack.iter() {
			if let Some(&offset) = objects[frame.index()].state.implants.get(&sym) {
				owners.push(Owner { object: frame, offset });
			}
		}
	}

	/// Returns `object`'s value for `sym`, falling back through parents and
	/// finally to the global default.
	pub fn get_implanted(&self, object: ObjectId, sym: SymbolId) -> &[u8] {
		let size = self.symbols[sym.index()].size;
		let mut cursor = Some(object);
		while let Some(id) = cursor {
			let obj = &self.objects[id.index()];
			if let Some(&offset) = obj.state.implants.get(&sym) {
				return &obj.state.data[offset..offset + size];
			}
			cursor = obj.parent;
		}
		&self.symbols[sym.index()].global
	}

	/// Context-qualified typed read.
	pub fn get_in<T: Payload>(&self, object: ObjectId, sym: Sym<T>) -> T {
		T::decode(self.get_implanted(object, sym.id()))
	}

	/// Writes `object`'s own slot for `sym`, implanting it first if needed.
	pub fn set_implanted(&mut self, object: ObjectId, sym: SymbolId, bytes: &[u8]) -> Flow {
		let expected = self.symbols[sym.index()].size;
		if bytes.len() != expected {
			let err = RuntimeError::PayloadSize {
				symbol: self.symbols[sym.index()].name.to_string(),
				expected,
				got: bytes.len(),
			};
			return Err(self.fail(err));
		}
		self.implant_symbol(object, sym);
		self.tx_touch(object);
		let obj = &mut self.objects[object.index()];
		let offset = obj.state.implants[&sym];
		obj.state.data[offset..offset + expected].copy_from_slice(bytes);
		Ok(())
	}

	/// Context-qualified typed write.
	pub fn set_in<T: Payload>(&mut self, object: ObjectId, sym: Sym<T>, value: T) {
		self.implant_symbol(object, sym.id());
		self.tx_touch(object);
		let obj = &mut self.objects[object.index()];
		let offset = obj.state.implants[&sym.id()];
		value.encode(&mut obj.state.data[offset..offset + T::SIZE]);
	}

	/// Whether `object` itself implants `sym` (parents are not consulted).
	pub fn is_implanted(&self, object: ObjectId, sym: impl Into<SymbolId>) -> bool {
		self.objects[object.index()].state.implants.contains_key(&sym.into())
	}

	/// Byte offset of `sym` in `object`'s data block.
	pub fn implant_offset(&self, object: ObjectId, sym: impl Into<SymbolId>) -> Option<usize> {
		self.objects[object.index()].state.implants.get(&sym.into()).copied()
	}

	/// `object`'s implants in implantation order.
	pub fn implants(&self, object: ObjectId) -> impl Iterator<Item = (SymbolId, usize)> + '_ {
		self.objects[object.index()].state.implants.iter().map(|(&sym, &offset)| (sym, offset))
	}

	pub fn parent(&self, object: ObjectId) -> Option<ObjectId> {
		self.objects[object.index()].parent
	}

	/// How many times `object` currently appears on the context stack.
	pub fn evisceration_count(&self, object: ObjectId) -> u32 {
		self.objects[object.index()].eviscerations
	}

	pub fn object_count(&self) -> usize {
		self.objects.len()
	}

	/// Captures the observable state of `object`.
	pub fn snapshot(&self, object: ObjectId) -> ObjectSnapshot {
		let obj = &self.objects[object.index()];
		ObjectSnapshot {
			parent: obj.parent,
			implants: obj.state.implants.iter().map(|(&sym, &offset)| (sym, offset)).collect(),
			data: obj.state.data.clone(),
		}
	}
}
