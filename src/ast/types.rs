//! Type annotations (spec §3, §9).
//!
//! The many parallel Objective-C spelling flags (`id`, `Class`, `SEL`,
//! `instancetype`, object-pointer names, nullability, generics, pointer
//! depth) collapse into one `TypeAnnotation` record per spec §9's
//! redesign guidance, instead of a family of boolean fields.

/// The value-level scalar a `TypeAnnotation` lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    I32,
    Bool,
    Void,
    Unknown,
    Function,
}

/// Spelling family, kept for the manifest; IR emission only ever consumes
/// the base `Scalar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Family {
    Plain,
    Id,
    Class,
    Sel,
    Instancetype,
    ObjectPointer(String),
    Vector(Box<Scalar>, u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nullability {
    None,
    Nullable,
    Nonnull,
}

#[derive(Debug, Clone)]
pub struct TypeAnnotation {
    pub scalar: Scalar,
    pub family: Family,
    pub generic_suffix: Option<String>,
    pub pointer_depth: u8,
    pub nullability: Nullability,
}

impl TypeAnnotation {
    pub fn plain(scalar: Scalar) -> Self {
        Self {
            scalar,
            family: Family::Plain,
            generic_suffix: None,
            pointer_depth: 0,
            nullability: Nullability::None,
        }
    }

    pub fn i32_() -> Self {
        Self::plain(Scalar::I32)
    }

    pub fn bool_() -> Self {
        Self::plain(Scalar::Bool)
    }

    pub fn void() -> Self {
        Self::plain(Scalar::Void)
    }

    pub fn object_pointer(name: impl Into<String>) -> Self {
        Self {
            scalar: Scalar::I32,
            family: Family::ObjectPointer(name.into()),
            generic_suffix: None,
            pointer_depth: 0,
            nullability: Nullability::None,
        }
    }
}

impl PartialEq for TypeAnnotation {
    /// Signature-compatibility uses only the scalar, matching spec §4.3's
    /// "arity, param types, return type" comparison — family/nullability are
    /// manifest metadata, not part of a function's compiled signature.
    fn eq(&self, other: &Self) -> bool {
        self.scalar == other.scalar
    }
}
