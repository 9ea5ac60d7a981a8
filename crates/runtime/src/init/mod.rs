//! Static initializer ordering.
//!
//! Startup runs in fixed priority tiers. Initializers registered with
//! `inventory` and extras passed to [`Startup::with`] are merged, sorted by
//! tier and each run exactly once. Order within a tier is unspecified.

mod builtins;


use tracing::{debug, info_span};

use crate::config::RuntimeConfig;
use crate::error::{Flow, RuntimeError};
use crate::runtime::Runtime;

/// Startup tiers.
pub mod tier {
	/// Declared symbols are defined.
	pub const SYMBOLS: u16 = 108;
	/// Declared domains and class domains are composed.
	pub const DOMAINS: u16 = 116;
	/// The root object is created and eviscerated.
	pub const ROOT: u16 = 132;
	/// Public symbols are implanted into the root object.
	pub const PUBLIC: u16 = 133;
	/// Hook advice: superconstructors and default handlers.
	pub const ADVICE: u16 = 164;
	/// User-level initializers.
	pub const USER: u16 = 228;
}

/// A startup procedure registered with `inventory`.
///
/// ```ignore
/// inventory::submit! {
/// 	Initializer::new(tier::USER, "mode-line", install_mode_line)
/// }
/// ```
pub struct Initializer {
	pub priority: u16,
	pub name: &'static str,
	pub run: fn(&mut Runtime) -> Flow,
}

inventory::collect!(Initializer);

impl Initializer {
	pub const fn new(priority: u16, name: &'static str, run: fn(&mut Runtime) -> Flow) -> Self {
		Self { priority, name, run }
	}
}

type ExtraFn = Box<dyn FnOnce(&mut Runtime) -> Flow>;

enum Step {
	Registered(fn(&mut Runtime) -> Flow),
	Extra(ExtraFn),
}

/// Builds a [`Runtime`] and drains the initializer list once.
#[derive(Default)]
pub struct Startup {
	config: RuntimeConfig,
	extras: Vec<(u16, &'static str, ExtraFn)>,
}

impl Startup {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn config(mut self, config: RuntimeConfig) -> Self {
		self.config = config;
		self
	}

	/// Adds an initializer for this boot only.
	pub fn with(mut self, priority: u16, name: &'static str, run: impl FnOnce(&mut Runtime) -> Flow + 'static) -> Self {
		self.extras.push((priority, name, Box::new(run)));
		self
	}

	/// Creates the runtime and runs every initializer in tier order.
	///
	/// The first initializer that unwinds stops the boot.
	pub fn boot(self) -> Result<Runtime, RuntimeError> {
		let mut steps: Vec<(u16, &'static str, Step)> = inventory::iter::<Initializer>
			.into_iter()
			.map(|init| (init.priority, init.name, Step::Registered(init.run)))
			.collect();
		steps.extend(
			self.extras
				.into_iter()
				.map(|(priority, name, run)| (priority, name, Step::Extra(run))),
		);
		steps.sort_by_key(|(priority, ..)| *priority);

		let mut rt = Runtime::with_config(self.config);
		let span = info_span!("startup", initializers = steps.len());
		let _entered = span.enter();
		for (priority, name, step) in steps {
			debug!(priority, name, "startup.run");
			let result = match step {
				Step::Registered(run) => run(&mut rt),
				Step::Extra(run) => run(&mut rt),
			};
			if let Err(unwind) = result {
				return Err(RuntimeError::Startup {
					name,
					priority,
					reason: unwind.to_string(),
				});
			}
		}
		Ok(rt)
	}
}
