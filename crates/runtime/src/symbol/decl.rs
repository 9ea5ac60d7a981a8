//! Typed symbol handles and static declarations.

use std::marker::PhantomData;

use soliloquy_primitives::{Atom, Payload, SymbolId};

use super::Visibility;

/// Typed handle to a symbol.
pub struct Sym<T: Payload> {
	id: SymbolId,
	_marker: PhantomData<fn() -> T>,
}

impl<T: Payload> Clone for Sym<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T: Payload> Copy for Sym<T> {}

impl<T: Payload> PartialEq for Sym<T> {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl<T: Payload> Eq for Sym<T> {}

impl<T: Payload> std::fmt::Debug for Sym<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Sym<{}>({:?})", std::any::type_name::<T>(), self.id)
	}
}

impl<T: Payload> Sym<T> {
	pub(crate) const fn new(id: SymbolId) -> Self {
		Self {
			id,
			_marker: PhantomData,
		}
	}

	pub(crate) const fn dangling() -> Self {
		Self::new(SymbolId::from_u32(u32::MAX))
	}

	/// Returns the untyped handle.
	pub const fn id(self) -> SymbolId {
		self.id
	}
}

impl<T: Payload> From<Sym<T>> for SymbolId {
	fn from(sym: Sym<T>) -> Self {
		sym.id
	}
}

/// Compile-time declaration of a symbol, constructed at startup tier 108.
///
/// Declarations are usually created with [`symbol!`](crate::symbol!) and
/// resolved with [`Runtime::symbol`](crate::Runtime::symbol).
#[derive(Debug)]
pub struct SymbolDecl<T: Payload> {
	pub name: &'static str,
	pub default: T,
	pub visibility: Visibility,
}

impl<T: Payload> SymbolDecl<T> {
	pub const fn new(name: &'static str, default: T, visibility: Visibility) -> Self {
		Self {
			name,
			default,
			visibility,
		}
	}
}

/// Type-erased view of a [`SymbolDecl`] for startup registration.
pub trait DeclaredSymbol: Sync {
	fn name(&self) -> &'static str;
	fn default_bytes(&self) -> Vec<u8>;
	fn visibility(&self) -> Visibility;
}

impl<T: Payload> DeclaredSymbol for SymbolDecl<T> {
	fn name(&self) -> &'static str {
		self.name
	}

	fn default_bytes(&self) -> Vec<u8> {
		self.default.to_bytes()
	}

	fn visibility(&self) -> Visibility {
		self.visibility
	}
}

/// Registry wrapper for symbol declarations.
pub struct SymbolReg(pub &'static dyn DeclaredSymbol);
inventory::collect!(SymbolReg);

/// Declares a symbol and registers it for construction at startup.
///
/// ```ignore
/// symbol!(
/// 	/// Column of the cursor.
/// 	pub CURSOR_COLUMN: u32 = 0, "cursor-column"
/// );
/// symbol!(pub MODE_LINE: Atom = Atom::EMPTY, "mode-line", Public);
/// ```
#[macro_export]
macro_rules! symbol {
	($(#[$meta:meta])* $vis:vis $decl:ident : $ty:ty = $default:expr, $name:literal) => {
		$crate::symbol!($(#[$meta])* $vis $decl: $ty = $default, $name, Private);
	};
	($(#[$meta:meta])* $vis:vis $decl:ident : $ty:ty = $default:expr, $name:literal, $visibility:ident) => {
		$(#[$meta])*
		$vis static $decl: $crate::symbol::SymbolDecl<$ty> =
			$crate::symbol::SymbolDecl::new($name, $default, $crate::symbol::Visibility::$visibility);

		$crate::inventory::submit! {
			$crate::symbol::SymbolReg(&$decl)
		}
	};
}

crate::symbol!(
	/// Subsystem tag of the most recent rollback.
	pub ROLLBACK_TYPE: Atom = Atom::EMPTY, "rollback-type", Public
);

crate::symbol!(
	/// Human-readable reason of the most recent rollback.
	pub ROLLBACK_REASON: Atom = Atom::EMPTY, "rollback-reason", Public
);
