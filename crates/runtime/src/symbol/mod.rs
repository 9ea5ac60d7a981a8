//! Symbol table.
//!
//! A symbol is a named cell of fixed byte width. Its *live payload* is the
//! slot of the object on top of its ownership stack, or its global default
//! when no eviscerated object implants it. Reads and writes always resolve
//! through that top frame, so entering or leaving a context never copies
//! values around.

mod decl;


pub use decl::{DeclaredSymbol, ROLLBACK_REASON, ROLLBACK_TYPE, Sym, SymbolDecl, SymbolReg};
use smallvec::SmallVec;
use soliloquy_primitives::{ObjectId, Payload, SymbolId};
use tracing::trace;

use crate::error::{Flow, RuntimeError};
use crate::runtime::{Ident, Runtime};

/// Whether a symbol is implanted into the root object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
	/// Only objects that implant the symbol explicitly carry it.
	#[default]
	Private,
	/// The root object implants the symbol, so its value is transactional
	/// even outside any other object's context.
	Public,
}

/// One frame of a symbol's ownership stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
	/// Eviscerated object whose slot aliases the live payload.
	pub object: ObjectId,
	/// Byte offset of the slot in the object's data block.
	pub offset: usize,
}

#[derive(Debug)]
pub(crate) struct SymbolEntry {
	pub(crate) name: Ident,
	pub(crate) size: usize,
	pub(crate) global: Box<[u8]>,
	pub(crate) owners: SmallVec<[Owner; 4]>,
	pub(crate) visibility: Visibility,
}

impl Runtime {
	/// Registers a symbol whose width is the length of `default`.
	///
	/// Names label symbols for lookup and diagnostics; if the name is taken,
	/// [`Runtime::lookup_symbol`] keeps returning the first symbol.
	pub fn define_symbol(&mut self, name: impl Into<Ident>, default: &[u8], visibility: Visibility) -> SymbolId {
		let name = name.into();
		let id = self.allocate("symbol", self.symbols.len(), SymbolId::try_from_index);
		trace!(symbol = %name, size = default.len(), ?visibility, "symbol.define");
		self.symbols.push(SymbolEntry {
			name: name.clone(),
			size: default.len(),
			global: default.into(),
			owners: SmallVec::new(),
			visibility,
		});
		self.symbol_names.entry(name).or_insert(id);
		if visibility == Visibility::Public
			&& let Some(root) = self.root
		{
			self.implant_symbol(root, id);
		}
		id
	}

	/// Registers a private typed symbol.
	pub fn define<T: Payload>(&mut self, name: impl Into<Ident>, default: T) -> Sym<T> {
		Sym::new(self.define_symbol(name, &default.to_bytes(), Visibility::Private))
	}

	/// Registers a public typed symbol, implanted into the root object.
	pub fn define_public<T: Payload>(&mut self, name: impl Into<Ident>, default: T) -> Sym<T> {
		Sym::new(self.define_symbol(name, &default.to_bytes(), Visibility::Public))
	}

	/// Resolves a static declaration to its handle, defining it on first use.
	///
	/// Fails with [`RuntimeError::PayloadSize`] if another symbol with the
	/// declaration's name but a different width was defined first.
	pub fn symbol<T: Payload>(&mut self, decl: &SymbolDecl<T>) -> Flow<Sym<T>> {
		match self.try_symbol(decl) {
			Ok(Some(sym)) => Ok(sym),
			Ok(None) => Ok(self.declare(decl)),
			Err(err) => Err(self.fail(err)),
		}
	}

	/// Resolves a static declaration without defining it.
	pub fn try_symbol<T: Payload>(&self, decl: &SymbolDecl<T>) -> Result<Option<Sym<T>>, RuntimeError> {
		let Some(&id) = self.symbol_names.get(decl.name) else {
			return Ok(None);
		};
		let size = self.symbols[id.index()].size;
		if size != T::SIZE {
			return Err(RuntimeError::PayloadSize {
				symbol: decl.name.to_string(),
				expected: size,
				got: T::SIZE,
			});
		}
		Ok(Some(Sym::new(id)))
	}

	/// Defines a fresh symbol from a declaration.
	pub(crate) fn declare<T: Payload>(&mut self, decl: &SymbolDecl<T>) -> Sym<T> {
		Sym::new(self.define_symbol(decl.name, &decl.default.to_bytes(), decl.visibility))
	}

	/// Finds a symbol by name.
	pub fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
		self.symbol_names.get(name).copied()
	}

	/// Name the symbol was defined with.
	pub fn symbol_name(&self, id: SymbolId) -> &str {
		&self.symbols[id.index()].name
	}

	/// Width of the symbol's payload in bytes.
	pub fn symbol_size(&self, id: SymbolId) -> usize {
		self.symbols[id.index()].size
	}

	/// The symbol's ownership stack, bottom first.
	pub fn owners(&self, id: SymbolId) -> &[Owner] {
		&self.symbols[id.index()].owners
	}

	/// The symbol's global default payload.
	pub fn global_payload(&self, id: SymbolId) -> &[u8] {
		&self.symbols[id.index()].global
	}

	/// Number of defined symbols.
	pub fn symbol_count(&self) -> usize {
		self.symbols.len()
	}

	/// Returns the live payload: the top owner's slot or the global default.
	pub fn read_payload(&self, id: SymbolId) -> &[u8] {
		let entry = &self.symbols[id.index()];
		match entry.owners.last() {
			Some(owner) => &self.objects[owner.object.index()].state.data[owner.offset..owner.offset + entry.size],
			None => &entry.global,
		}
	}

	/// Writes the live payload.
	///
	/// Inside a transaction the owning object is forked first, so the write
	/// is undone by a rollback. Writes to a symbol nobody owns land in its
	/// global default and are not transactional.
	pub fn write_payload(&mut self, id: SymbolId, bytes: &[u8]) -> Flow {
		let expected = self.symbols[id.index()].size;
		if bytes.len() != expected {
			let err = RuntimeError::PayloadSize {
				symbol: self.symbols[id.index()].name.to_string(),
				expected,
				got: bytes.len(),
			};
			return Err(self.fail(err));
		}
		self.store(id, bytes);
		Ok(())
	}

	pub(crate) fn store(&mut self, id: SymbolId, bytes: &[u8]) {
		let entry = &self.symbols[id.index()];
		let size = entry.size;
		match entry.owners.last().copied() {
			Some(owner) => {
				self.tx_touch(owner.object);
				let data = &mut self.objects[owner.object.index()].state.data;
				data[owner.offset..owner.offset + size].copy_from_slice(bytes);
			}
			None => self.symbols[id.index()].global.copy_from_slice(bytes),
		}
	}

	/// Copies the live payload into every transaction backup of its owner.
	///
	/// Walks the owner's backup chain from the newest snapshot down and stops
	/// at the first snapshot that predates the symbol's implantation. Values
	/// written through survive a rollback of any of those transactions.
	pub fn write_through(&mut self, id: SymbolId) {
		let entry = &self.symbols[id.index()];
		let size = entry.size;
		let Some(owner) = entry.owners.last().copied() else {
			return;
		};
		let object = &mut self.objects[owner.object.index()];
		let value = object.state.data[owner.offset..owner.offset + size].to_vec();
		let mut backup = object.backup.as_deref_mut();
		while let Some(snapshot) = backup {
			if snapshot.state.implants.get(&id) != Some(&owner.offset)
				|| owner.offset + size > snapshot.state.data.len()
			{
				break;
			}
			snapshot.state.data[owner.offset..owner.offset + size].copy_from_slice(&value);
			backup = snapshot.next.as_deref_mut();
		}
	}

	/// Reads a typed symbol in the current context.
	pub fn get<T: Payload>(&self, sym: Sym<T>) -> T {
		T::decode(self.read_payload(sym.id()))
	}

	/// Writes a typed symbol in the current context.
	pub fn set<T: Payload>(&mut self, sym: Sym<T>, value: T) {
		let bytes: SmallVec<[u8; 16]> = {
			let mut buf = SmallVec::from_elem(0u8, T::SIZE);
			value.encode(&mut buf);
			buf
		};
		self.store(sym.id(), &bytes);
	}

	/// Applies `f` to a typed symbol's current value.
	pub fn update<T: Payload>(&mut self, sym: Sym<T>, f: impl FnOnce(T) -> T) {
		let value = f(self.get(sym));
		self.set(sym, value);
	}
}
