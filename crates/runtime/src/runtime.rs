use std::borrow::Cow;

use rustc_hash::FxHashMap;
use soliloquy_primitives::{Atom, ClassId, DomainId, HookPointId, ObjectId, SymbolId, TxId};
use tracing::{error, warn};

use crate::class::{Class, Domain};
use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, Unwind};
use crate::hooks::HookPoint;
use crate::intern::Interner;
use crate::object::Object;
use crate::symbol::{ROLLBACK_REASON, ROLLBACK_TYPE, Sym, SymbolEntry};
use crate::transaction::{RollbackInfo, TxFrame};

/// Owned or static name of a runtime entity.
pub type Ident = Cow<'static, str>;

/// Name of the hook point run by [`Runtime::fatal`] before aborting.
pub const SAVE_THE_WORLD: &str = "save-the-world";

/// Handles the runtime creates for itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CoreHandles {
	pub(crate) rollback_type: Sym<Atom>,
	pub(crate) rollback_reason: Sym<Atom>,
	pub(crate) save_the_world: HookPointId,
}

/// The object/symbol runtime.
///
/// One value owns the symbol table, the object arena, the context stack, the
/// hook registry, the domain and class tables and the transaction stack.
/// Every hook handler receives `&mut Runtime`, so state flows through the
/// runtime rather than through process globals. The runtime is
/// single-threaded: handlers are reference counted closures and the type is
/// neither `Send` nor `Sync`.
///
/// Handles ([`Sym`], [`ObjectId`], [`HookPointId`], ...) are only meaningful
/// for the runtime that issued them. Passing a foreign handle panics.
pub struct Runtime {
	pub(crate) config: RuntimeConfig,
	pub(crate) atoms: Interner,
	pub(crate) symbols: Vec<SymbolEntry>,
	pub(crate) symbol_names: FxHashMap<Ident, SymbolId>,
	pub(crate) objects: Vec<Object>,
	pub(crate) stack: Vec<ObjectId>,
	pub(crate) hooks: Vec<HookPoint>,
	pub(crate) hook_names: FxHashMap<Ident, HookPointId>,
	pub(crate) domains: Vec<Domain>,
	pub(crate) domain_names: FxHashMap<Ident, DomainId>,
	pub(crate) classes: Vec<Class>,
	pub(crate) class_names: FxHashMap<Ident, ClassId>,
	pub(crate) transactions: Vec<TxFrame>,
	pub(crate) last_tx: TxId,
	pub(crate) last_rollback: Option<RollbackInfo>,
	pub(crate) root: Option<ObjectId>,
	pub(crate) core: CoreHandles,
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

impl Runtime {
	/// Creates a runtime with default configuration and no startup pass.
	///
	/// Only the core symbols and the `save-the-world` hook point exist. Use
	/// [`Startup`](crate::init::Startup) to run the registered initializers.
	pub fn new() -> Self {
		Self::with_config(RuntimeConfig::default())
	}

	/// Creates a runtime with the given configuration and no startup pass.
	pub fn with_config(config: RuntimeConfig) -> Self {
		let mut rt = Self {
			config,
			atoms: Interner::new(),
			symbols: Vec::new(),
			symbol_names: FxHashMap::default(),
			objects: Vec::new(),
			stack: Vec::new(),
			hooks: Vec::new(),
			hook_names: FxHashMap::default(),
			domains: Vec::new(),
			domain_names: FxHashMap::default(),
			classes: Vec::new(),
			class_names: FxHashMap::default(),
			transactions: Vec::new(),
			last_tx: TxId::NONE,
			last_rollback: None,
			root: None,
			core: CoreHandles {
				rollback_type: Sym::dangling(),
				rollback_reason: Sym::dangling(),
				save_the_world: HookPointId::from_index(0),
			},
		};
		rt.core.save_the_world = rt.define_hook(SAVE_THE_WORLD);
		rt.core.rollback_type = rt.declare(&ROLLBACK_TYPE);
		rt.core.rollback_reason = rt.declare(&ROLLBACK_REASON);
		rt
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &RuntimeConfig {
		&self.config
	}

	/// Returns the root object, once the startup pass created it.
	pub fn root(&self) -> Option<ObjectId> {
		self.root
	}

	/// Symbol holding the subsystem tag of the last rollback.
	pub fn rollback_type(&self) -> Sym<Atom> {
		self.core.rollback_type
	}

	/// Symbol holding the human-readable reason of the last rollback.
	pub fn rollback_reason(&self) -> Sym<Atom> {
		self.core.rollback_reason
	}

	/// Hook point run by [`Runtime::fatal`].
	pub fn save_the_world(&self) -> HookPointId {
		self.core.save_the_world
	}

	/// Interns `text`, returning a fixed-size handle usable as a payload.
	pub fn intern(&mut self, text: &str) -> Atom {
		match self.atoms.intern(text) {
			Some(atom) => atom,
			None => self.fatal("atom table exhausted"),
		}
	}

	/// Returns the text behind an atom.
	pub fn resolve(&self, atom: Atom) -> &str {
		self.atoms.resolve(atom)
	}

	/// Reads a string-valued symbol in the current context.
	pub fn get_str(&self, sym: Sym<Atom>) -> &str {
		self.resolve(self.get(sym))
	}

	/// Interns `text` and stores it in a string-valued symbol.
	pub fn set_str(&mut self, sym: Sym<Atom>, text: &str) {
		let atom = self.intern(text);
		self.set(sym, atom);
	}

	/// Converts a runtime fault into the right unwind value.
	///
	/// Inside a transaction the fault rolls the transaction back with
	/// `rollback_type = "core"` and the fault's message as reason. Outside
	/// one it surfaces as [`Unwind::Fault`].
	pub fn fail(&mut self, err: RuntimeError) -> Unwind {
		if self.in_transaction() {
			let reason = err.to_string();
			self.tx_rollback("core", &reason)
		} else {
			warn!(error = %err, "runtime fault outside transaction");
			Unwind::Fault(err)
		}
	}

	/// Runs the `save-the-world` hook and aborts the process.
	pub fn fatal(&mut self, reason: &str) -> ! {
		error!(reason, "fatal runtime error");
		let save = self.core.save_the_world;
		if let Err(unwind) = self.invoke_hook(save) {
			error!(%unwind, "save-the-world hook unwound");
		}
		std::process::abort()
	}

	/// Handle for the next entry of a table holding `len` entries.
	///
	/// Running out of handle space is fatal.
	pub(crate) fn allocate<I>(&mut self, table: &str, len: usize, make: fn(usize) -> Option<I>) -> I {
		match make(len) {
			Some(id) => id,
			None => self.fatal(&format!("{table} table exhausted")),
		}
	}
}

impl std::fmt::Debug for Runtime {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Runtime")
			.field("symbols", &self.symbols.len())
			.field("objects", &self.objects.len())
			.field("context_depth", &self.stack.len())
			.field("hooks", &self.hooks.len())
			.field("classes", &self.classes.len())
			.field("transactions", &self.transactions.len())
			.field("atoms", &self.atoms.len())
			.finish()
	}
}
