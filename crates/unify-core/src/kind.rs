//! `Kind`: the bitmask over concrete scalar/composite shapes.
//!
//! Modeled the way the bytecode layer's `TypeKind` enumerates type shapes,
//! but as a bitmask rather than a single discriminant, since a
//! `BasicType` conjunct (e.g. the predeclared `number`) denotes a *set* of
//! kinds rather than one.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Kind(u16);

impl Kind {
    pub const NULL: Kind = Kind(1 << 0);
    pub const BOOL: Kind = Kind(1 << 1);
    pub const INT: Kind = Kind(1 << 2);
    pub const FLOAT: Kind = Kind(1 << 3);
    pub const STRING: Kind = Kind(1 << 4);
    pub const BYTES: Kind = Kind(1 << 5);
    pub const LIST: Kind = Kind(1 << 6);
    pub const STRUCT: Kind = Kind(1 << 7);

    pub const NONE: Kind = Kind(0);
    pub const NUMBER: Kind = Kind(Self::INT.0 | Self::FLOAT.0);
    pub const SCALAR: Kind =
        Kind(Self::NULL.0 | Self::BOOL.0 | Self::NUMBER.0 | Self::STRING.0 | Self::BYTES.0);
    pub const ANY: Kind = Kind(
        Self::NULL.0
            | Self::BOOL.0
            | Self::NUMBER.0
            | Self::STRING.0
            | Self::BYTES.0
            | Self::LIST.0
            | Self::STRUCT.0,
    );

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Kind) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Kind) -> bool {
        self.0 & other.0 != 0
    }

    /// A single bit set: the kind is fully determined.
    pub fn is_concrete_kind(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    pub fn intersection(self, other: Kind) -> Kind {
        Kind(self.0 & other.0)
    }

    pub fn union(self, other: Kind) -> Kind {
        Kind(self.0 | other.0)
    }
}

impl BitOr for Kind {
    type Output = Kind;
    fn bitor(self, rhs: Kind) -> Kind {
        self.union(rhs)
    }
}

impl BitOrAssign for Kind {
    fn bitor_assign(&mut self, rhs: Kind) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Kind {
    type Output = Kind;
    fn bitand(self, rhs: Kind) -> Kind {
        self.intersection(rhs)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "_|_");
        }
        if *self == Self::ANY {
            return write!(f, "_");
        }
        let names: &[(Kind, &str)] = &[
            (Self::NULL, "null"),
            (Self::BOOL, "bool"),
            (Self::INT, "int"),
            (Self::FLOAT, "float"),
            (Self::STRING, "string"),
            (Self::BYTES, "bytes"),
            (Self::LIST, "list"),
            (Self::STRUCT, "struct"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(k, _)| self.contains(*k))
            .map(|(_, n)| *n)
            .collect();
        write!(f, "{}", parts.join("|"))
    }
}

/// Concreteness level: `Bottom < Concrete < Constraint < Type < Any`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Concreteness {
    Bottom,
    Concrete,
    Constraint,
    Type,
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_is_int_or_float() {
        assert!(Kind::NUMBER.contains(Kind::INT));
        assert!(Kind::NUMBER.contains(Kind::FLOAT));
        assert!(!Kind::NUMBER.contains(Kind::STRING));
    }

    #[test]
    fn single_bit_is_concrete_kind() {
        assert!(Kind::INT.is_concrete_kind());
        assert!(!Kind::NUMBER.is_concrete_kind());
        assert!(!Kind::NONE.is_concrete_kind());
    }

    #[test]
    fn intersection_narrows() {
        let k = Kind::NUMBER.intersection(Kind::INT);
        assert_eq!(k, Kind::INT);
    }

    #[test]
    fn concreteness_orders_bottom_below_everything() {
        assert!(Concreteness::Bottom < Concreteness::Concrete);
        assert!(Concreteness::Concrete < Concreteness::Any);
    }
}
