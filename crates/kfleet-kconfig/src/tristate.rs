//! Three-valued logic used for dependencies and bool/tristate symbols.

use std::fmt;
use std::str::FromStr;

/// Tri-state value. Ordered `No < Module < Yes`, so `min` is logical AND and
/// `max` is logical OR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tristate {
    /// `n`
    #[default]
    No,
    /// `m`
    Module,
    /// `y`
    Yes,
}

impl Tristate {
    /// Ordinal value: 0, 1 or 2.
    pub fn ordinal(self) -> u8 {
        match self {
            Self::No => 0,
            Self::Module => 1,
            Self::Yes => 2,
        }
    }

    /// Whether the value is `m` or `y`.
    pub fn is_enabled(self) -> bool {
        self != Self::No
    }

    /// Logical negation (`!m` is `m`).
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::No => Self::Yes,
            Self::Module => Self::Module,
            Self::Yes => Self::No,
        }
    }

    /// Single-letter form used in profiles and expressions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::No => "n",
            Self::Module => "m",
            Self::Yes => "y",
        }
    }

    pub(crate) fn from_bool(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tristate {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Self::No),
            "m" => Ok(Self::Module),
            "y" => Ok(Self::Yes),
            _ => Err(()),
        }
    }
}
