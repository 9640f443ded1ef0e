//! # kfleet-kconfig
//!
//! Symbol graph for Kconfig-style firmware configuration trees.
//!
//! - [`Kconfig::parse`] reads a root definition file (plus everything it
//!   `source`s) into a menu tree of symbols, choices, menus and comments.
//! - Values are evaluated lazily with tri-state logic: visibility from
//!   prompt conditions, defaults, `select` / `imply` reverse dependencies,
//!   choice groups and ranges.
//! - [`Kconfig::load_profile`] and [`Kconfig::write_profile`] read and write
//!   the conventional `CONFIG_NAME=value` profile format.
//!
//! ```no_run
//! use kfleet_kconfig::Kconfig;
//!
//! let mut kconfig = Kconfig::parse("src/Kconfig")?;
//! let _ = kconfig.load_profile(".config")?;
//! kconfig.write_profile(".config")?;
//! # Ok::<(), kfleet_kconfig::KconfigError>(())
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod expr;
pub mod graph;
pub mod tristate;

mod eval;
mod grammar;
mod lexer;
mod parser;
mod profile;

pub use error::{KconfigError, Result};
pub use expr::{CmpOp, Expr};
pub use graph::{
    Children, Choice, ChoiceId, Kconfig, MenuItem, MenuNode, NodeId, Prompt, Symbol, SymbolId,
    SymbolType, DEFAULT_PREFIX,
};
pub use profile::ProfileStats;
pub use tristate::Tristate;
