//! # kfleet-menu
//!
//! Menu projection and mutation engine for Kconfig-style firmware
//! configuration trees.
//!
//! A [`Session`] loads the definitions of one firmware source tree, then:
//!
//! - **projects** them into a tree of [`ConfigNode`]s holding only what a
//!   user should see ([`Session::get_menu_tree`]),
//! - **routes** `(name, value)` edits through a gatekeeper that ignores
//!   anything currently invisible ([`Session::set_value`]),
//! - **saves** the result as a conventional profile ([`Session::save`]).
//!
//! Parsing touches process-wide state (working directory, `srctree`), so
//! every load runs inside a [`ParseScope`] that serializes parses across
//! sessions and restores that state afterwards.

#![deny(unsafe_code)]

pub mod choice;
pub mod errors;
pub mod gatekeeper;
pub mod hook;
pub mod keys;
pub mod node;
pub mod parse_scope;
pub mod policy;
pub mod projector;
pub mod session;

pub use errors::{MenuError, Result};
pub use gatekeeper::{IgnoreReason, MutationOutcome};
pub use hook::{CompatHook, HookOutcome};
pub use node::{ChoiceMember, ConfigNode, NodeKind};
pub use parse_scope::ParseScope;
pub use policy::{Inclusion, OverridePolicy};
pub use projector::Projector;
pub use session::{Session, SharedSession};
