//! Soliloquy object runtime.
//!
//! A reflective object model built from four pieces:
//!
//! * **Symbols**: named cells of fixed width. Unqualified reads and writes
//!   resolve through the symbol's ownership stack to the slot of the
//!   innermost eviscerated object that implants it.
//! * **Objects**: implant maps plus data blocks, with optional parents.
//!   Eviscerating an object enters its context; reembowelment leaves it.
//! * **Hook points**: three-band dispatch sites whose handlers are ordered by
//!   pairwise constraints. Classes are domains of symbols plus a constructor
//!   hook point.
//! * **Transactions**: nested frames that snapshot objects on first mutation
//!   and restore them on rollback.
//!
//! ```ignore
//! let mut rt = Startup::new().boot()?;
//! let counter = rt.define("counter", 0u32);
//! let obj = rt.new_object(None);
//! rt.implant(obj, counter);
//! rt.within(obj, |rt| rt.set(counter, 3));
//! assert_eq!(rt.get_in(obj, counter), 3);
//! ```

pub mod class;
pub mod config;
mod context;
pub mod error;
pub mod hooks;
pub mod init;
mod intern;
pub mod introspect;
pub mod object;
mod runtime;
pub mod symbol;
pub mod transaction;

pub use class::{ClassDecl, DeclMember, DomainDecl};
pub use config::{ConfigError, RuntimeConfig};
pub use context::ContextGuard;
pub use error::{Flow, RuntimeError, Unwind, continue_hook_in_current_context, hook_abort};
pub use hooks::{Constraint, HandlerTag, HookEntry, HookFn, HookOutcome, after_super, before_super};
pub use init::{Initializer, Startup, tier};
#[doc(hidden)]
pub use inventory;
pub use object::{Implant, ObjectSnapshot};
pub use runtime::{Ident, Runtime, SAVE_THE_WORLD};
pub use soliloquy_primitives::{Atom, Band, ClassId, DomainId, HookPointId, ObjectId, Order, Payload, SymbolId, TxId};
pub use symbol::{Owner, Sym, SymbolDecl, Visibility};
pub use transaction::{ExitFn, RollbackHandler, RollbackInfo, TxOutcome};
