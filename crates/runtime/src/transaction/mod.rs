//! Nested transactions.
//!
//! A transaction frame forks every object it is about to mutate: the first
//! mutation in a frame snapshots the object into its backup chain. Commit
//! collapses one level of that chain; rollback restores every touched object
//! from its snapshot and rebuilds the context stack as it stood at begin.
//!
//! Backups mirror frame nesting. An object touched by an inner frame but not
//! by the enclosing one hands its snapshot to the enclosing frame on commit,
//! so a later rollback of the enclosing frame still restores it.


use soliloquy_primitives::{ObjectId, SymbolId, TxId};
use tracing::{debug, trace, warn};

use crate::error::{Flow, RuntimeError, Unwind};
use crate::object::Backup;
use crate::runtime::Runtime;
use crate::symbol::Visibility;

/// Called once a rollback has restored the object model.
pub type ExitFn = Box<dyn FnOnce(&mut Runtime, &RollbackInfo)>;

/// Releases an external resource when the frame rolls back.
pub type RollbackHandler = Box<dyn FnOnce(&mut Runtime)>;

/// What the most recent rollback reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackInfo {
	pub tx: TxId,
	/// Subsystem tag, also stored in the `rollback-type` symbol.
	pub kind: String,
	/// Human-readable reason, also stored in the `rollback-reason` symbol.
	pub reason: String,
}

/// Result of a [`Runtime::transaction`] scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome<R> {
	Committed(R),
	RolledBack(RollbackInfo),
}

impl<R> TxOutcome<R> {
	pub fn is_committed(&self) -> bool {
		matches!(self, Self::Committed(_))
	}

	/// The committed value, if any.
	pub fn committed(self) -> Option<R> {
		match self {
			Self::Committed(value) => Some(value),
			Self::RolledBack(_) => None,
		}
	}

	/// The rollback report, if the scope rolled back.
	pub fn rollback(&self) -> Option<&RollbackInfo> {
		match self {
			Self::Committed(_) => None,
			Self::RolledBack(info) => Some(info),
		}
	}
}

pub(crate) struct TxFrame {
	pub(crate) id: TxId,
	/// Context stack at begin, bottom first.
	pub(crate) context: Vec<ObjectId>,
	pub(crate) touched: Vec<ObjectId>,
	pub(crate) handlers: Vec<RollbackHandler>,
	pub(crate) exit: Option<ExitFn>,
}

impl Runtime {
	/// Opens a transaction frame and forks every object on the context stack.
	///
	/// `exit` runs at the end of a rollback of this frame, after the object
	/// model has been restored.
	pub fn tx_begin(&mut self, exit: Option<ExitFn>) -> TxId {
		let id = self.last_tx.next();
		self.last_tx = id;
		let context = self.stack.clone();
		self.transactions.push(TxFrame {
			id,
			context: context.clone(),
			touched: Vec::new(),
			handlers: Vec::new(),
			exit,
		});
		for object in context {
			self.tx_touch(object);
		}
		debug!(tx = %id, depth = self.stack.len(), nesting = self.transactions.len(), "tx.begin");
		id
	}

	/// Forks `object` into the current transaction unless it already was.
	///
	/// Outside a transaction this does nothing.
	pub fn tx_touch(&mut self, object: ObjectId) {
		let Some(frame) = self.transactions.last_mut() else {
			return;
		};
		let obj = &mut self.objects[object.index()];
		if obj.tx == frame.id {
			return;
		}
		let next = obj.backup.take();
		obj.backup = Some(Box::new(Backup {
			state: obj.state.clone(),
			tx: obj.tx,
			next,
		}));
		obj.tx = frame.id;
		frame.touched.push(object);
		trace!(tx = %frame.id, object = ?object, "tx.fork");
	}

	/// Commits the innermost transaction.
	///
	/// Rollback handlers and the exit function are dropped without running.
	pub fn tx_commit(&mut self) -> Flow {
		if self.commit_top().is_none() {
			return Err(self.fail(RuntimeError::NoTransaction));
		}
		Ok(())
	}

	fn commit_top(&mut self) -> Option<TxId> {
		let frame = self.transactions.pop()?;
		let Self { objects, transactions, .. } = self;
		for object in frame.touched {
			let obj = &mut objects[object.index()];
			let Some(backup) = obj.backup.take() else {
				continue;
			};
			match transactions.last_mut() {
				Some(outer) if backup.tx != outer.id => {
					obj.tx = outer.id;
					obj.backup = Some(backup);
					outer.touched.push(object);
				}
				_ => {
					let Backup { tx, next, .. } = *backup;
					obj.tx = tx;
					obj.backup = next;
				}
			}
		}
		debug!(tx = %frame.id, nesting = self.transactions.len(), "tx.commit");
		Some(frame.id)
	}

	/// Rolls back the innermost transaction.
	///
	/// Stores `kind` and `reason` in the rollback symbols and writes them
	/// through every backup of their owner, so they survive this and any
	/// enclosing rollback. Then runs the rollback handlers newest first,
	/// restores every touched object, rebuilds the context stack recorded at
	/// begin and calls the exit function.
	///
	/// Returns the unwind value the caller propagates to the scope that owns
	/// the frame. Outside a transaction the result is a
	/// [`RuntimeError::NoTransaction`] fault.
	pub fn tx_rollback(&mut self, kind: &str, reason: &str) -> Unwind {
		if self.transactions.is_empty() {
			warn!(kind, reason, "rollback outside transaction");
			return Unwind::Fault(RuntimeError::NoTransaction);
		}
		let (type_sym, reason_sym) = (self.core.rollback_type, self.core.rollback_reason);
		self.set_str(type_sym, kind);
		self.write_through(type_sym.id());
		self.set_str(reason_sym, reason);
		self.write_through(reason_sym.id());

		// Handlers run with the frame still open, so anything they touch is
		// already forked here and restored below.
		while let Some(handler) = self.transactions.last_mut().and_then(|frame| frame.handlers.pop()) {
			handler(self);
		}

		let Some(mut frame) = self.transactions.pop() else {
			return Unwind::Fault(RuntimeError::NoTransaction);
		};
		debug!(tx = %frame.id, kind, reason, touched = frame.touched.len(), "tx.rollback");

		self.restore_depth(0);
		for &object in &frame.touched {
			let obj = &mut self.objects[object.index()];
			if let Some(backup) = obj.backup.take() {
				let Backup { state, tx, next } = *backup;
				obj.state = state;
				obj.tx = tx;
				obj.backup = next;
			}
		}
		for &object in &frame.context {
			self.push_frame(object);
		}
		if let Some(root) = self.root
			&& frame.touched.contains(&root)
		{
			self.reimplant_public(root);
		}

		let info = RollbackInfo {
			tx: frame.id,
			kind: kind.to_string(),
			reason: reason.to_string(),
		};
		if let Some(exit) = frame.exit.take() {
			exit(self, &info);
		}
		self.last_rollback = Some(info);
		Unwind::Rollback(frame.id)
	}

	/// Public symbols defined inside a rolled-back frame stay public, so the
	/// root object implants them again.
	fn reimplant_public(&mut self, root: ObjectId) {
		let public: Vec<SymbolId> = (0..self.symbols.len())
			.filter(|&index| self.symbols[index].visibility == Visibility::Public)
			.map(SymbolId::from_index)
			.filter(|&sym| !self.is_implanted(root, sym))
			.collect();
		for sym in public {
			trace!(symbol = ?sym, "tx.reimplant_public");
			self.implant_symbol(root, sym);
		}
	}

	/// Rolls back with the OS error text as reason when `result` is `-1`.
	pub fn tx_rollback_with_errno(&mut self, kind: &str, result: i64, fallback: &str) -> Unwind {
		if result == -1 {
			let reason = std::io::Error::last_os_error().to_string();
			self.tx_rollback(kind, &reason)
		} else {
			self.tx_rollback(kind, fallback)
		}
	}

	/// Registers a handler that runs if the innermost transaction rolls back.
	pub fn tx_push_handler(&mut self, handler: impl FnOnce(&mut Runtime) + 'static) -> Flow {
		match self.transactions.last_mut() {
			Some(frame) => {
				frame.handlers.push(Box::new(handler));
				Ok(())
			}
			None => Err(self.fail(RuntimeError::NoTransaction)),
		}
	}

	/// Removes the most recently pushed rollback handler without running it.
	pub fn tx_pop_handler(&mut self) -> Option<RollbackHandler> {
		self.transactions.last_mut()?.handlers.pop()
	}

	pub fn in_transaction(&self) -> bool {
		!self.transactions.is_empty()
	}

	/// Number of open transaction frames.
	pub fn tx_depth(&self) -> usize {
		self.transactions.len()
	}

	/// Id of the innermost open transaction.
	pub fn current_tx(&self) -> Option<TxId> {
		self.transactions.last().map(|frame| frame.id)
	}

	/// Report of the most recent rollback.
	pub fn rollback_info(&self) -> Option<&RollbackInfo> {
		self.last_rollback.as_ref()
	}

	/// Runs `f` inside a fresh transaction.
	///
	/// Commits when `f` returns `Ok` and reports a rollback of this frame as
	/// [`TxOutcome::RolledBack`]. Frames `f` left open above this one are
	/// committed along with it. A fault, or a rollback of an inner frame that
	/// nobody caught, rolls this frame back too. Hook aborts and continues
	/// commit and keep propagating.
	pub fn transaction<R>(&mut self, f: impl FnOnce(&mut Runtime) -> Flow<R>) -> Flow<TxOutcome<R>> {
		let id = self.tx_begin(None);
		let result = f(self);
		let open = self.transactions.iter().any(|frame| frame.id == id);

		if !open {
			let ours = self.last_rollback.as_ref().filter(|info| info.tx == id).cloned();
			return match (result, ours) {
				(Err(Unwind::Rollback(rolled)), Some(info)) if rolled == id => Ok(TxOutcome::RolledBack(info)),
				(Ok(_), Some(info)) => Ok(TxOutcome::RolledBack(info)),
				(Ok(value), None) => Ok(TxOutcome::Committed(value)),
				(Err(unwind), _) => Err(unwind),
			};
		}

		match result {
			Ok(value) => {
				self.commit_through(id);
				Ok(TxOutcome::Committed(value))
			}
			Err(unwind @ (Unwind::Abort | Unwind::Continue)) => {
				self.commit_through(id);
				Err(unwind)
			}
			Err(Unwind::Fault(err)) => Ok(TxOutcome::RolledBack(self.rollback_through(id, "core", &err.to_string()))),
			Err(Unwind::Rollback(_)) => {
				let (kind, reason) = match &self.last_rollback {
					Some(info) => (info.kind.clone(), info.reason.clone()),
					None => ("core".to_string(), "unhandled rollback".to_string()),
				};
				Ok(TxOutcome::RolledBack(self.rollback_through(id, &kind, &reason)))
			}
		}
	}

	fn commit_through(&mut self, id: TxId) {
		while let Some(committed) = self.commit_top() {
			if committed == id {
				break;
			}
		}
	}

	fn rollback_through(&mut self, id: TxId, kind: &str, reason: &str) -> RollbackInfo {
		while let Some(top) = self.current_tx() {
			self.tx_rollback(kind, reason);
			if top == id {
				break;
			}
		}
		self.last_rollback.clone().unwrap_or_else(|| RollbackInfo {
			tx: id,
			kind: kind.to_string(),
			reason: reason.to_string(),
		})
	}
}
