/// Priority band of a hook handler.
///
/// Bands run strictly in declaration order: every [`Band::Before`] handler
/// finishes before the first [`Band::Main`] handler starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
	/// Runs first. Superconstructor handlers live here.
	Before,
	/// The primary implementation.
	Main,
	/// Runs last, typically observers.
	After,
}

impl Band {
	/// All bands in invocation order.
	pub const ALL: [Band; 3] = [Band::Before, Band::Main, Band::After];

	/// Position of the band in [`Band::ALL`].
	pub const fn index(self) -> usize {
		match self {
			Self::Before => 0,
			Self::Main => 1,
			Self::After => 2,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Before => "before",
			Self::Main => "main",
			Self::After => "after",
		}
	}
}

/// Verdict of a constraint function about the handler it belongs to
/// relative to another handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
	/// The handler must run before the other one.
	Before,
	/// The handler must run after the other one.
	After,
	/// No preference.
	#[default]
	None,
}

impl Order {
	/// Verdict seen from the other handler's side.
	pub const fn inverse(self) -> Self {
		match self {
			Self::Before => Self::After,
			Self::After => Self::Before,
			Self::None => Self::None,
		}
	}

	pub const fn is_none(self) -> bool {
		matches!(self, Self::None)
	}
}
