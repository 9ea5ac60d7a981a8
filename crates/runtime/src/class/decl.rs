//! Static domain and class declarations.
//!
//! Declared domains and class domains are composed at startup tier 116;
//! superconstructors of declared subclasses are wired at tier 164.

/// Member of a declared domain, referenced by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclMember {
	/// A symbol defined by then, usually through [`symbol!`](crate::symbol!).
	Symbol(&'static str),
	/// Another declared domain or class.
	Domain(&'static str),
}

/// Compile-time declaration of a domain.
#[derive(Debug)]
pub struct DomainDecl {
	pub name: &'static str,
	pub members: &'static [DeclMember],
}

/// Compile-time declaration of a class.
#[derive(Debug)]
pub struct ClassDecl {
	pub name: &'static str,
	/// Name of the parent class.
	pub parent: Option<&'static str>,
	/// Members of the class domain besides the parent's domain.
	pub members: &'static [DeclMember],
}

/// Registry wrapper for domain declarations.
pub struct DomainReg(pub &'static DomainDecl);
inventory::collect!(DomainReg);

/// Registry wrapper for class declarations.
pub struct ClassReg(pub &'static ClassDecl);
inventory::collect!(ClassReg);

/// Declares a domain and registers it for composition at startup.
///
/// ```ignore
/// domain!(pub CURSOR = "cursor" [
/// 	DeclMember::Symbol("cursor-line"),
/// 	DeclMember::Symbol("cursor-column"),
/// ]);
/// ```
#[macro_export]
macro_rules! domain {
	($(#[$meta:meta])* $vis:vis $decl:ident = $name:literal [$($member:expr),* $(,)?]) => {
		$(#[$meta])*
		$vis static $decl: $crate::class::DomainDecl = $crate::class::DomainDecl {
			name: $name,
			members: &[$($member),*],
		};

		$crate::inventory::submit! {
			$crate::class::DomainReg(&$decl)
		}
	};
}

/// Declares a class and registers it for composition at startup.
///
/// ```ignore
/// class!(pub BUFFER = "buffer" [DeclMember::Domain("cursor")]);
/// class!(pub FILE_BUFFER = "file-buffer" : "buffer" [DeclMember::Symbol("file-name")]);
/// ```
#[macro_export]
macro_rules! class {
	($(#[$meta:meta])* $vis:vis $decl:ident = $name:literal $(: $parent:literal)? [$($member:expr),* $(,)?]) => {
		$(#[$meta])*
		$vis static $decl: $crate::class::ClassDecl = $crate::class::ClassDecl {
			name: $name,
			parent: $crate::__class_parent!($({$parent})?),
			members: &[$($member),*],
		};

		$crate::inventory::submit! {
			$crate::class::ClassReg(&$decl)
		}
	};
}

#[macro_export]
#[doc(hidden)]
macro_rules! __class_parent {
	() => {
		None
	};
	({$parent:literal}) => {
		Some($parent)
	};
}
