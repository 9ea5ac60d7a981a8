use core::fmt;

macro_rules! dense_id {
	($(#[$meta:meta])* $name:ident, $prefix:literal) => {
		$(#[$meta])*
		#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(u32);

		impl $name {
			/// Wraps an index into an existing table.
			#[inline]
			pub const fn from_index(index: usize) -> Self {
				debug_assert!(index <= u32::MAX as usize);
				Self(index as u32)
			}

			/// Wraps the index of a new table entry, or `None` once the
			/// handle space is exhausted.
			#[inline]
			pub fn try_from_index(index: usize) -> Option<Self> {
				u32::try_from(index).ok().map(Self)
			}

			/// Returns the dense table index.
			#[inline]
			pub const fn index(self) -> usize {
				self.0 as usize
			}

			/// Returns the raw integer value.
			#[inline]
			pub const fn as_u32(self) -> u32 {
				self.0
			}

			/// Rebuilds a handle from its raw integer value.
			#[inline]
			pub const fn from_u32(raw: u32) -> Self {
				Self(raw)
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!($prefix, "#{}"), self.0)
			}
		}
	};
}

dense_id!(
	/// Identity of a symbol. Equality is identity.
	SymbolId,
	"sym"
);
dense_id!(
	/// Identity of an object in the runtime arena.
	ObjectId,
	"obj"
);
dense_id!(
	/// Identity of a hook point.
	HookPointId,
	"hook"
);
dense_id!(
	/// Identity of a symbol domain.
	DomainId,
	"domain"
);
dense_id!(
	/// Identity of a class.
	ClassId,
	"class"
);
dense_id!(
	/// Interned string handle.
	///
	/// Atoms let string-valued symbols keep a fixed-size payload; the text
	/// lives in the runtime's interner for the life of the runtime.
	Atom,
	"atom"
);

impl Atom {
	/// The atom of the empty string, interned first in every runtime.
	pub const EMPTY: Atom = Atom(0);
}

/// Monotonic transaction identifier.
///
/// [`TxId::NONE`] marks objects that have not been touched by any live
/// transaction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TxId(u64);

impl TxId {
	/// No transaction.
	pub const NONE: TxId = TxId(0);

	/// Wraps a raw transaction counter value.
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	/// Returns the raw counter value.
	pub const fn as_u64(self) -> u64 {
		self.0
	}

	/// Returns the identifier following this one.
	pub const fn next(self) -> Self {
		Self(self.0 + 1)
	}

	/// Returns true for [`TxId::NONE`].
	pub const fn is_none(self) -> bool {
		self.0 == 0
	}
}

impl fmt::Debug for TxId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_none() {
			f.write_str("tx#none")
		} else {
			write!(f, "tx#{}", self.0)
		}
	}
}

impl fmt::Display for TxId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}
