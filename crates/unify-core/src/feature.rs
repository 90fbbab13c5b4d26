//! Packed field labels.
//!
//! A `Feature` is a 32-bit value: the low 3 bits carry a `FeatureType`, the
//! remaining 28 bits carry either an interner `Symbol` index (string labels)
//! or a non-negative integer (list indices). Packing them together keeps an
//! `Arc` lookup and a `Feature` equality check to a single integer compare,
//! the same trade the bytecode layer's `NodeTypeIR` makes for node-kind
//! constraints.

use crate::interner::Symbol;

/// Low 3 bits of a `Feature`. `0x7` is overloaded: it means
/// `HiddenDefinitionLabel` in general, but the specific value produced by
/// `Feature::INVALID` (index 0, type 0x7) is reserved to mean "no label" —
/// no compiler-issued hidden-definition label ever has index 0, since index
/// 0 is the first interned string and the root scope never interns one
/// before compiling its first real label.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum FeatureType {
    StringLabel = 0,
    IntLabel = 1,
    DefinitionLabel = 3,
    HiddenLabel = 6,
    HiddenDefinitionLabel = 7,
}

impl FeatureType {
    fn from_bits(bits: u32) -> Self {
        match bits {
            0 => Self::StringLabel,
            1 => Self::IntLabel,
            3 => Self::DefinitionLabel,
            6 => Self::HiddenLabel,
            _ => Self::HiddenDefinitionLabel,
        }
    }
}

const TYPE_BITS: u32 = 3;
const TYPE_MASK: u32 = (1 << TYPE_BITS) - 1;
const INDEX_SHIFT: u32 = TYPE_BITS;
pub const MAX_INDEX: u32 = (1 << (32 - TYPE_BITS)) - 1;

/// A packed field label: `Feature`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Feature(u32);

impl Feature {
    /// Sentinel for "no label" (`0x7` with index 0), used for the
    /// root vertex and detached conjuncts that have not yet been inserted
    /// as an arc.
    pub const INVALID: Feature = Feature(FeatureType::HiddenDefinitionLabel as u32);

    fn pack(ty: FeatureType, index: u32) -> Self {
        assert!(index <= MAX_INDEX, "feature index overflow");
        Feature((index << INDEX_SHIFT) | (ty as u32 & TYPE_MASK))
    }

    pub fn string_label(sym: Symbol) -> Self {
        Self::pack(FeatureType::StringLabel, sym.as_u32())
    }

    pub fn definition_label(sym: Symbol) -> Self {
        Self::pack(FeatureType::DefinitionLabel, sym.as_u32())
    }

    pub fn hidden_label(sym: Symbol) -> Self {
        Self::pack(FeatureType::HiddenLabel, sym.as_u32())
    }

    pub fn hidden_definition_label(sym: Symbol) -> Self {
        Self::pack(FeatureType::HiddenDefinitionLabel, sym.as_u32())
    }

    pub fn int_label(index: u32) -> Self {
        Self::pack(FeatureType::IntLabel, index)
    }

    pub fn feature_type(self) -> FeatureType {
        FeatureType::from_bits(self.0 & TYPE_MASK)
    }

    /// Interner index or integer value, depending on `feature_type`.
    pub fn index(self) -> u32 {
        self.0 >> INDEX_SHIFT
    }

    pub fn as_symbol(self) -> Option<Symbol> {
        if !self.is_valid() {
            return None;
        }
        match self.feature_type() {
            FeatureType::StringLabel
            | FeatureType::DefinitionLabel
            | FeatureType::HiddenLabel
            | FeatureType::HiddenDefinitionLabel => Some(Symbol::from_raw(self.index())),
            FeatureType::IntLabel => None,
        }
    }

    pub fn as_int_index(self) -> Option<u32> {
        (self.is_valid() && matches!(self.feature_type(), FeatureType::IntLabel))
            .then(|| self.index())
    }

    /// `IsDef`: true for `#Name`-style definitions (bit 1 set).
    pub fn is_def(self) -> bool {
        self.0 & 0b010 != 0
    }

    /// `IsHidden`: true for `_name`-style hidden fields (bit 2 set).
    pub fn is_hidden(self) -> bool {
        self.0 & 0b100 != 0
    }

    /// `IsRegular`: ordinary string/int labels, i.e. not a definition and
    /// not hidden.
    pub fn is_regular(self) -> bool {
        matches!(
            self.feature_type(),
            FeatureType::StringLabel | FeatureType::IntLabel
        )
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn is_string(self) -> bool {
        matches!(self.feature_type(), FeatureType::StringLabel)
    }

    pub fn is_int(self) -> bool {
        matches!(self.feature_type(), FeatureType::IntLabel)
    }

    /// Raw bits, for use as a map key without re-deriving the type tag.
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(i: u32) -> Symbol {
        Symbol::from_raw(i)
    }

    #[test]
    fn round_trips_string_label() {
        let f = Feature::string_label(sym(42));
        assert_eq!(f.feature_type(), FeatureType::StringLabel);
        assert_eq!(f.as_symbol(), Some(sym(42)));
        assert!(f.is_regular());
        assert!(!f.is_def());
        assert!(!f.is_hidden());
    }

    #[test]
    fn definition_label_sets_is_def() {
        let f = Feature::definition_label(sym(7));
        assert!(f.is_def());
        assert!(!f.is_hidden());
        assert!(!f.is_regular());
    }

    #[test]
    fn hidden_definition_sets_both_bits() {
        let f = Feature::hidden_definition_label(sym(1));
        assert!(f.is_def());
        assert!(f.is_hidden());
    }

    #[test]
    fn int_label_round_trips_index() {
        let f = Feature::int_label(9);
        assert_eq!(f.as_int_index(), Some(9));
        assert!(f.is_regular());
    }

    #[test]
    fn equality_is_raw_bit_equality() {
        let a = Feature::string_label(sym(1));
        let b = Feature::string_label(sym(1));
        assert_eq!(a, b);
        assert_eq!(a.raw(), b.raw());
    }

    #[test]
    fn invalid_feature_is_not_valid() {
        assert!(!Feature::INVALID.is_valid());
    }
}
