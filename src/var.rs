//! Variable model
//!
//! Tagged representation of a referenceable quantity: a plain variable (a
//! resolved local, parameter or field) or a composite variable (a plain
//! variable plus the field-access path reached through it, e.g. `a.b.c`).

use std::fmt;
use std::hash::{Hash, Hasher};

/// A resolved variable with a stable qualified name.
///
/// Identity and equality are by qualified name only; the declared type and
/// flags are carried along for queries but do not participate in equality.
#[derive(Debug, Clone)]
pub struct PlainVariable {
    /// Stable key assigned by the front-end resolver
    pub name: String,
    /// Declared type, fully qualified
    pub declared_type: String,
    pub is_field: bool,
    pub is_parameter: bool,
    pub is_static: bool,
}

impl PlainVariable {
    /// Create a local variable
    pub fn local(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        PlainVariable {
            name: name.into(),
            declared_type: declared_type.into(),
            is_field: false,
            is_parameter: false,
            is_static: false,
        }
    }

    /// Create a formal parameter
    pub fn parameter(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        PlainVariable {
            is_parameter: true,
            ..PlainVariable::local(name, declared_type)
        }
    }

    /// Create a field, optionally static
    pub fn field(
        name: impl Into<String>,
        declared_type: impl Into<String>,
        is_static: bool,
    ) -> Self {
        PlainVariable {
            is_field: true,
            is_static,
            ..PlainVariable::local(name, declared_type)
        }
    }
}

impl PartialEq for PlainVariable {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for PlainVariable {}

impl Hash for PlainVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for PlainVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A field access reached through another variable: an origin plain variable
/// plus a non-empty access path (the "right part", e.g. `.b.c`).
#[derive(Debug, Clone)]
pub struct CompositeVariable {
    pub origin: PlainVariable,
    /// Field names along the access path, in order; never empty
    pub path: Vec<String>,
}

impl CompositeVariable {
    pub fn new(origin: PlainVariable, path: Vec<String>) -> Self {
        debug_assert!(!path.is_empty(), "composite access path must be non-empty");
        CompositeVariable { origin, path }
    }
}

impl PartialEq for CompositeVariable {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.path == other.path
    }
}

impl Eq for CompositeVariable {}

impl Hash for CompositeVariable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Display for CompositeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin.name)?;
        for field in &self.path {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}

/// Either a plain variable or a composite field access
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbstractVariable {
    Plain(PlainVariable),
    Composite(CompositeVariable),
}

impl AbstractVariable {
    /// The origin variable: the plain variable itself, or the composite's root
    pub fn initial_variable(&self) -> &PlainVariable {
        match self {
            AbstractVariable::Plain(v) => v,
            AbstractVariable::Composite(c) => &c.origin,
        }
    }

    /// Whether this variable is rooted at `plain` (name equality only)
    pub fn contains_plain(&self, plain: &PlainVariable) -> bool {
        self.initial_variable() == plain
    }

    pub fn as_composite(&self) -> Option<&CompositeVariable> {
        match self {
            AbstractVariable::Composite(c) => Some(c),
            AbstractVariable::Plain(_) => None,
        }
    }
}

impl From<PlainVariable> for AbstractVariable {
    fn from(v: PlainVariable) -> Self {
        AbstractVariable::Plain(v)
    }
}

impl From<CompositeVariable> for AbstractVariable {
    fn from(v: CompositeVariable) -> Self {
        AbstractVariable::Composite(v)
    }
}

impl fmt::Display for AbstractVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractVariable::Plain(v) => v.fmt(f),
            AbstractVariable::Composite(c) => c.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identity_is_name_only() {
        let a = PlainVariable::local("x", "int");
        let b = PlainVariable::parameter("x", "long");
        assert_eq!(a, b);
        assert_ne!(a, PlainVariable::local("y", "int"));
    }

    #[test]
    fn composite_identity_compares_origin_and_path() {
        let a = PlainVariable::local("a", "Point");
        let b = PlainVariable::local("b", "Point");
        let ax = CompositeVariable::new(a.clone(), vec!["x".into()]);
        let ax2 = CompositeVariable::new(a.clone(), vec!["x".into()]);
        let ay = CompositeVariable::new(a.clone(), vec!["y".into()]);
        let bx = CompositeVariable::new(b, vec!["x".into()]);
        assert_eq!(ax, ax2);
        assert_ne!(ax, ay);
        assert_ne!(ax, bx);
        assert_eq!(AbstractVariable::from(ax).initial_variable(), &a);
    }

    #[test]
    fn contains_plain_checks_origin() {
        let a = PlainVariable::local("a", "Point");
        let v: AbstractVariable = CompositeVariable::new(a.clone(), vec!["x".into()]).into();
        assert!(v.contains_plain(&a));
        assert!(!v.contains_plain(&PlainVariable::local("b", "Point")));
    }
}
