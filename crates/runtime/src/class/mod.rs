//! Domains and classes.
//!
//! A domain is a named, recursive group of symbols; implanting it implants
//! every member. A class pairs a domain with a constructor hook point. A
//! subclass's domain contains its parent's domain, and its constructor has a
//! superconstructor handler in the before band that runs the parent's
//! constructor against the same object.

mod decl;

#[cfg(test)]
mod tests;

pub use decl::{ClassDecl, ClassReg, DeclMember, DomainDecl, DomainReg};
use soliloquy_primitives::{Band, ClassId, DomainId, HookPointId, ObjectId};
use tracing::debug;

use crate::error::{Flow, RuntimeError};
use crate::hooks::{HookEntry, HookOutcome, SUPERCONSTRUCTOR};
use crate::object::Implant;
use crate::runtime::{Ident, Runtime};

#[derive(Debug)]
pub(crate) struct Domain {
	pub(crate) name: Ident,
	pub(crate) members: Vec<Implant>,
}

#[derive(Debug)]
pub(crate) struct Class {
	pub(crate) name: Ident,
	pub(crate) domain: DomainId,
	pub(crate) constructor: HookPointId,
	pub(crate) parent: Option<ClassId>,
}

impl Runtime {
	/// Creates an empty domain, or returns the existing one with this name.
	pub fn define_domain(&mut self, name: impl Into<Ident>) -> DomainId {
		let name = name.into();
		if let Some(&id) = self.domain_names.get(&name) {
			return id;
		}
		let id = self.allocate("domain", self.domains.len(), DomainId::try_from_index);
		self.domains.push(Domain {
			name: name.clone(),
			members: Vec::new(),
		});
		self.domain_names.insert(name, id);
		id
	}

	/// Adds a symbol or a nested domain to `domain`.
	///
	/// Adding a member twice is a no-op. A nested domain that already
	/// contains `domain`, directly or transitively, is rejected.
	pub fn domain_add(&mut self, domain: DomainId, member: impl Into<Implant>) -> Flow {
		let member = member.into();
		if self.domains[domain.index()].members.contains(&member) {
			return Ok(());
		}
		if let Implant::Domain(nested) = member
			&& self.domain_contains(nested, domain)
		{
			let err = RuntimeError::DomainCycle {
				domain: self.domains[domain.index()].name.to_string(),
				member: self.domains[nested.index()].name.to_string(),
			};
			return Err(self.fail(err));
		}
		self.domains[domain.index()].members.push(member);
		Ok(())
	}

	/// Whether `domain` is `target` or reaches it through nested members.
	pub fn domain_contains(&self, domain: DomainId, target: DomainId) -> bool {
		let mut pending = vec![domain];
		while let Some(current) = pending.pop() {
			if current == target {
				return true;
			}
			for member in &self.domains[current.index()].members {
				if let Implant::Domain(nested) = *member {
					pending.push(nested);
				}
			}
		}
		false
	}

	pub fn lookup_domain(&self, name: &str) -> Option<DomainId> {
		self.domain_names.get(name).copied()
	}

	pub fn domain_name(&self, domain: DomainId) -> &str {
		&self.domains[domain.index()].name
	}

	/// Direct members of `domain` in insertion order.
	pub fn domain_members(&self, domain: DomainId) -> &[Implant] {
		&self.domains[domain.index()].members
	}

	pub fn domain_count(&self) -> usize {
		self.domains.len()
	}

	/// Defines a class and wires its superconstructor.
	///
	/// Creates the class domain (holding the parent's domain) and the
	/// constructor hook point `"<name>:construct"`. Defining a name twice
	/// returns the first class.
	pub fn define_class(&mut self, name: impl Into<Ident>, parent: Option<ClassId>) -> Flow<ClassId> {
		let name = name.into();
		if let Some(&id) = self.class_names.get(&name) {
			return Ok(id);
		}
		let class = self.create_class(name, parent)?;
		self.wire_superconstructor(class)?;
		Ok(class)
	}

	/// Creates the class domain and constructor hook without wiring the
	/// superconstructor.
	pub(crate) fn create_class(&mut self, name: Ident, parent: Option<ClassId>) -> Flow<ClassId> {
		let domain = self.define_domain(name.clone());
		if let Some(parent) = parent {
			let parent_domain = self.classes[parent.index()].domain;
			self.domain_add(domain, parent_domain)?;
		}
		let constructor = self.define_hook(format!("{name}:construct"));
		let id = self.allocate("class", self.classes.len(), ClassId::try_from_index);
		debug!(class = %name, parent = ?parent.map(|p| &self.classes[p.index()].name), "class.define");
		self.classes.push(Class {
			name: name.clone(),
			domain,
			constructor,
			parent,
		});
		self.class_names.insert(name, id);
		Ok(id)
	}

	/// Adds the before-band handler that runs the parent's constructor.
	///
	/// The handler's id is the parent's name and its class identity is
	/// [`SUPERCONSTRUCTOR`]; rewiring replaces it. Classes without a parent
	/// are left alone.
	pub(crate) fn wire_superconstructor(&mut self, class: ClassId) -> Flow {
		let Some(parent) = self.classes[class.index()].parent else {
			return Ok(());
		};
		let parent_ctor = self.classes[parent.index()].constructor;
		let parent_name = self.classes[parent.index()].name.clone();
		let ctor = self.classes[class.index()].constructor;
		let entry = HookEntry::new(parent_name, move |rt: &mut Runtime| rt.invoke_hook(parent_ctor).map(drop))
			.class(SUPERCONSTRUCTOR);
		self.add_hook(ctor, Band::Before, entry)
	}

	/// Runs `class`'s constructor on `this`.
	///
	/// `this` receives the class domain and is eviscerated; `init` then runs
	/// in its context to pass arguments through symbols, and the constructor
	/// hook is invoked. The context stack returns to its previous depth.
	pub fn class_construct(
		&mut self,
		class: ClassId,
		this: ObjectId,
		init: impl FnOnce(&mut Runtime) -> Flow,
	) -> Flow<HookOutcome> {
		let (domain, constructor) = {
			let class = &self.classes[class.index()];
			(class.domain, class.constructor)
		};
		self.implant(this, domain);

		let depth = self.depth();
		self.eviscerate(this);
		let result = match init(self) {
			Ok(()) => self.invoke_hook(constructor),
			Err(unwind) => Err(unwind),
		};
		self.restore_depth(depth);
		result
	}

	/// Creates an object, implants the class domain and constructs it.
	pub fn new_instance(
		&mut self,
		class: ClassId,
		parent: Option<ObjectId>,
		init: impl FnOnce(&mut Runtime) -> Flow,
	) -> Flow<ObjectId> {
		let object = self.new_object(parent);
		self.class_construct(class, object, init)?;
		Ok(object)
	}

	pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
		self.class_names.get(name).copied()
	}

	/// Looks up a class, failing with an unknown-name error.
	pub fn class_of_name(&mut self, name: &str) -> Flow<ClassId> {
		match self.lookup_class(name) {
			Some(class) => Ok(class),
			None => {
				let err = RuntimeError::UnknownName {
					kind: "class",
					name: name.to_string(),
				};
				Err(self.fail(err))
			}
		}
	}

	pub fn class_name(&self, class: ClassId) -> &str {
		&self.classes[class.index()].name
	}

	pub fn class_domain(&self, class: ClassId) -> DomainId {
		self.classes[class.index()].domain
	}

	pub fn class_constructor(&self, class: ClassId) -> HookPointId {
		self.classes[class.index()].constructor
	}

	pub fn class_parent(&self, class: ClassId) -> Option<ClassId> {
		self.classes[class.index()].parent
	}

	pub fn class_count(&self) -> usize {
		self.classes.len()
	}

	/// Whether `class` is `ancestor` or derives from it.
	pub fn is_subclass(&self, class: ClassId, ancestor: ClassId) -> bool {
		let mut cursor = Some(class);
		while let Some(current) = cursor {
			if current == ancestor {
				return true;
			}
			cursor = self.classes[current.index()].parent;
		}
		false
	}
}
