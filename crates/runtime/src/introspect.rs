//! Read-only views of the runtime tables for diagnostics.

use soliloquy_primitives::{Band, ClassId, DomainId, HookPointId, SymbolId};

use crate::runtime::Runtime;
use crate::symbol::Visibility;

/// One row of the symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo<'a> {
	pub id: SymbolId,
	pub name: &'a str,
	pub size: usize,
	pub visibility: Visibility,
	/// Depth of the ownership stack.
	pub owners: usize,
}

/// One hook point with its handler ids per band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInfo<'a> {
	pub id: HookPointId,
	pub name: &'a str,
	pub bands: [Vec<&'a str>; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo<'a> {
	pub id: ClassId,
	pub name: &'a str,
	pub parent: Option<&'a str>,
	pub domain: DomainId,
	pub constructor: HookPointId,
}

impl Runtime {
	/// Iterates the symbol table in definition order.
	pub fn symbols(&self) -> impl Iterator<Item = SymbolInfo<'_>> + '_ {
		self.symbols.iter().enumerate().map(|(index, entry)| SymbolInfo {
			id: SymbolId::from_index(index),
			name: &entry.name,
			size: entry.size,
			visibility: entry.visibility,
			owners: entry.owners.len(),
		})
	}

	/// Iterates hook points in definition order.
	pub fn hook_points(&self) -> impl Iterator<Item = HookInfo<'_>> + '_ {
		self.hooks.iter().enumerate().map(|(index, hook)| {
			let id = HookPointId::from_index(index);
			HookInfo {
				id,
				name: &hook.name,
				bands: Band::ALL.map(|band| {
					hook.bands[band.index()]
						.iter()
						.map(|entry| &*entry.tag.id)
						.collect()
				}),
			}
		})
	}

	/// Iterates classes in definition order.
	pub fn classes(&self) -> impl Iterator<Item = ClassInfo<'_>> + '_ {
		self.classes.iter().enumerate().map(|(index, class)| ClassInfo {
			id: ClassId::from_index(index),
			name: &class.name,
			parent: class.parent.map(|parent| &*self.classes[parent.index()].name),
			domain: class.domain,
			constructor: class.constructor,
		})
	}

	/// Iterates domains in definition order.
	pub fn domains(&self) -> impl Iterator<Item = DomainId> + '_ {
		(0..self.domains.len()).map(DomainId::from_index)
	}
}
