//! Initializers the runtime contributes to its own startup.

use soliloquy_primitives::{ClassId, SymbolId};
use tracing::debug;

use super::{Initializer, tier};
use crate::class::{ClassDecl, ClassReg, DeclMember, DomainReg};
use crate::error::{Flow, RuntimeError};
use crate::object::Implant;
use crate::runtime::Runtime;
use crate::symbol::{SymbolReg, Visibility};

inventory::submit! { Initializer::new(tier::SYMBOLS, "declared-symbols", define_declared_symbols) }
inventory::submit! { Initializer::new(tier::DOMAINS, "declared-domains", compose_declared_domains) }
inventory::submit! { Initializer::new(tier::ROOT, "root-object", create_root) }
inventory::submit! { Initializer::new(tier::PUBLIC, "public-symbols", implant_public_symbols) }
inventory::submit! { Initializer::new(tier::ADVICE, "superconstructors", wire_declared_classes) }

fn define_declared_symbols(rt: &mut Runtime) -> Flow {
	let mut defined = 0usize;
	for reg in inventory::iter::<SymbolReg> {
		let decl = reg.0;
		if rt.lookup_symbol(decl.name()).is_none() {
			rt.define_symbol(decl.name(), &decl.default_bytes(), decl.visibility());
			defined += 1;
		}
	}
	debug!(defined, "startup.symbols");
	Ok(())
}

/// Creates every declared domain and class domain first, then fills them, so
/// members may name declarations in any order.
fn compose_declared_domains(rt: &mut Runtime) -> Flow {
	for reg in inventory::iter::<DomainReg> {
		rt.define_domain(reg.0.name);
	}
	for reg in inventory::iter::<ClassReg> {
		declare_class(rt, reg.0)?;
	}

	for reg in inventory::iter::<DomainReg> {
		let domain = rt.define_domain(reg.0.name);
		for member in reg.0.members {
			let member = resolve_member(rt, member)?;
			rt.domain_add(domain, member)?;
		}
	}
	for reg in inventory::iter::<ClassReg> {
		let domain = rt.define_domain(reg.0.name);
		for member in reg.0.members {
			let member = resolve_member(rt, member)?;
			rt.domain_add(domain, member)?;
		}
	}
	Ok(())
}

/// Creates a declared class after its parent chain.
fn declare_class(rt: &mut Runtime, decl: &'static ClassDecl) -> Flow<ClassId> {
	if let Some(class) = rt.lookup_class(decl.name) {
		return Ok(class);
	}
	let parent = match decl.parent {
		Some(name) => {
			let Some(reg) = inventory::iter::<ClassReg>.into_iter().find(|reg| reg.0.name == name) else {
				let err = RuntimeError::UnknownName {
					kind: "class",
					name: name.to_string(),
				};
				return Err(rt.fail(err));
			};
			Some(declare_class(rt, reg.0)?)
		}
		None => None,
	};
	rt.create_class(decl.name.into(), parent)
}

fn resolve_member(rt: &mut Runtime, member: &DeclMember) -> Flow<Implant> {
	let found = match *member {
		DeclMember::Symbol(name) => rt.lookup_symbol(name).map(Implant::Symbol),
		DeclMember::Domain(name) => rt.lookup_domain(name).map(Implant::Domain),
	};
	match found {
		Some(implant) => Ok(implant),
		None => {
			let (kind, name) = match *member {
				DeclMember::Symbol(name) => ("symbol", name),
				DeclMember::Domain(name) => ("domain", name),
			};
			Err(rt.fail(RuntimeError::UnknownName {
				kind,
				name: name.to_string(),
			}))
		}
	}
}

fn create_root(rt: &mut Runtime) -> Flow {
	if rt.root.is_some() {
		return Ok(());
	}
	let root = rt.new_object(None);
	rt.root = Some(root);
	rt.eviscerate(root);
	debug!(?root, "startup.root");
	Ok(())
}

fn implant_public_symbols(rt: &mut Runtime) -> Flow {
	let Some(root) = rt.root else {
		return Ok(());
	};
	let public: Vec<_> = rt
		.symbols
		.iter()
		.enumerate()
		.filter(|(_, entry)| entry.visibility == Visibility::Public)
		.map(|(index, _)| SymbolId::from_index(index))
		.collect();
	for sym in &public {
		rt.implant_symbol(root, *sym);
	}
	debug!(implanted = public.len(), "startup.public");
	Ok(())
}

fn wire_declared_classes(rt: &mut Runtime) -> Flow {
	for reg in inventory::iter::<ClassReg> {
		if let Some(class) = rt.lookup_class(reg.0.name) {
			rt.wire_superconstructor(class)?;
		}
	}
	Ok(())
}
