//! Hook points.
//!
//! A hook point is an extensible dispatch site with three priority bands.
//! Each band holds handlers kept in an order consistent with their pairwise
//! constraint verdicts. Handlers are identified by `(id, bound object)`;
//! adding a handler with an identity already present in the band replaces it.
//!
//! Handlers are closures over `&mut Runtime`. Their arguments and results
//! flow through symbols in the context they run in.

mod invoke;
mod sort;

#[cfg(test)]
mod tests;

use std::rc::Rc;

pub use invoke::HookOutcome;
use soliloquy_primitives::{Band, HookPointId, ObjectId, Order};
use tracing::{debug, warn};

use crate::error::{Flow, RuntimeError};
use crate::runtime::{Ident, Runtime};
use crate::symbol::Sym;

/// Class identity of handlers that run a parent class's constructor.
pub const SUPERCONSTRUCTOR: &str = "superconstructor";

/// Class identity of handlers registered without one.
pub const DEFAULT_CLASS: &str = "default";

/// A hook handler.
pub type HookFn = Rc<dyn Fn(&mut Runtime) -> Flow>;

/// Pairwise ordering constraint.
///
/// Called as `constraint(this, other)`; the verdict says whether the
/// handler owning the constraint runs before or after `other`.
pub type Constraint = fn(&HandlerTag, &HandlerTag) -> Order;

/// Identity and class identity of a handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerTag {
	pub id: Ident,
	pub class: Ident,
}

/// Runs after every superconstructor handler.
pub fn after_super(_this: &HandlerTag, other: &HandlerTag) -> Order {
	if other.class == SUPERCONSTRUCTOR {
		Order::After
	} else {
		Order::None
	}
}

/// Runs before every superconstructor handler.
pub fn before_super(_this: &HandlerTag, other: &HandlerTag) -> Order {
	if other.class == SUPERCONSTRUCTOR {
		Order::Before
	} else {
		Order::None
	}
}

/// A registered handler.
#[derive(Clone)]
pub struct HookEntry {
	pub tag: HandlerTag,
	pub handler: HookFn,
	/// Object eviscerated around the call.
	pub bound: Option<ObjectId>,
	/// Handler is skipped while this symbol reads `false`.
	pub condition: Option<Sym<bool>>,
	pub constraint: Option<Constraint>,
}

impl std::fmt::Debug for HookEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HookEntry")
			.field("id", &self.tag.id)
			.field("class", &self.tag.class)
			.field("bound", &self.bound)
			.field("condition", &self.condition)
			.field("constrained", &self.constraint.is_some())
			.finish()
	}
}

impl HookEntry {
	/// Creates an unbound, unconditional, unconstrained handler.
	pub fn new(id: impl Into<Ident>, handler: impl Fn(&mut Runtime) -> Flow + 'static) -> Self {
		Self {
			tag: HandlerTag {
				id: id.into(),
				class: Ident::Borrowed(DEFAULT_CLASS),
			},
			handler: Rc::new(handler),
			bound: None,
			condition: None,
			constraint: None,
		}
	}

	pub fn class(mut self, class: impl Into<Ident>) -> Self {
		self.tag.class = class.into();
		self
	}

	pub fn bound(mut self, object: ObjectId) -> Self {
		self.bound = Some(object);
		self
	}

	pub fn when(mut self, gate: Sym<bool>) -> Self {
		self.condition = Some(gate);
		self
	}

	pub fn constraint(mut self, constraint: Constraint) -> Self {
		self.constraint = Some(constraint);
		self
	}

	fn same_identity(&self, id: &str, bound: Option<ObjectId>) -> bool {
		self.tag.id == id && self.bound == bound
	}
}

#[derive(Debug)]
pub(crate) struct HookPoint {
	pub(crate) name: Ident,
	pub(crate) bands: [Vec<Rc<HookEntry>>; 3],
}

impl Runtime {
	/// Creates a hook point, or returns the existing one with this name.
	pub fn define_hook(&mut self, name: impl Into<Ident>) -> HookPointId {
		let name = name.into();
		if let Some(&id) = self.hook_names.get(&name) {
			return id;
		}
		let id = self.allocate("hook point", self.hooks.len(), HookPointId::try_from_index);
		self.hooks.push(HookPoint {
			name: name.clone(),
			bands: Default::default(),
		});
		self.hook_names.insert(name, id);
		id
	}

	/// Finds a hook point by name.
	pub fn lookup_hook(&self, name: &str) -> Option<HookPointId> {
		self.hook_names.get(name).copied()
	}

	pub fn hook_name(&self, point: HookPointId) -> &str {
		&self.hooks[point.index()].name
	}

	/// Number of defined hook points.
	pub fn hook_count(&self) -> usize {
		self.hooks.len()
	}

	/// Handlers of one band in invocation order.
	pub fn handlers(&self, point: HookPointId, band: Band) -> impl Iterator<Item = &HookEntry> + '_ {
		self.hooks[point.index()].bands[band.index()].iter().map(|entry| &**entry)
	}

	/// Adds a handler and re-sorts the band.
	///
	/// An existing handler with the same `(id, bound)` identity is removed
	/// first. If the band's constraints do not settle within
	/// [`max_sort_passes`](crate::RuntimeConfig::max_sort_passes) scans, the
	/// contradiction is logged and the band keeps its last order; with
	/// `strict_constraints` the band is left untouched and the call fails.
	pub fn add_hook(&mut self, point: HookPointId, band: Band, entry: HookEntry) -> Flow {
		let max_passes = self.config.max_sort_passes;
		let strict = self.config.strict_constraints;
		let hook = &mut self.hooks[point.index()];
		let list = &mut hook.bands[band.index()];
		let previous = strict.then(|| list.clone());

		list.retain(|existing| !existing.same_identity(&entry.tag.id, entry.bound));
		debug!(hook = %hook.name, band = band.as_str(), id = %entry.tag.id, class = %entry.tag.class, "hook.add");
		list.push(Rc::new(entry));

		if let Err(passes) = sort::sort_band(list, max_passes) {
			let err = RuntimeError::ConstraintContradiction {
				hook: hook.name.to_string(),
				band: band.as_str(),
				passes,
			};
			match previous {
				Some(previous) => {
					*list = previous;
					return Err(self.fail(err));
				}
				None => warn!(error = %err, "hook constraints did not settle; keeping last order"),
			}
		}
		Ok(())
	}

	/// Removes the handler with this `(id, bound)` identity.
	///
	/// The remaining handlers keep their order. Returns whether a handler was
	/// removed.
	pub fn delete_hook(&mut self, point: HookPointId, band: Band, id: &str, bound: Option<ObjectId>) -> bool {
		let list = &mut self.hooks[point.index()].bands[band.index()];
		let before = list.len();
		list.retain(|existing| !existing.same_identity(id, bound));
		before != list.len()
	}

	/// Removes every handler with this id, whatever object it is bound to.
	///
	/// Returns the number of handlers removed.
	pub fn delete_hooks_of(&mut self, point: HookPointId, band: Band, id: &str) -> usize {
		let list = &mut self.hooks[point.index()].bands[band.index()];
		let before = list.len();
		list.retain(|existing| existing.tag.id != id);
		before - list.len()
	}
}
