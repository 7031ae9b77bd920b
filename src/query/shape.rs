//! Source record shapes: which field names a table's records declare.

/// Declares the fields of a source record type.
///
/// Field references in predicates and projections are resolved against this
/// list when the query is rendered.
///
/// ```
/// use querywire::query::RecordShape;
///
/// struct OreOre;
///
/// impl RecordShape for OreOre {
///     const NAME: &'static str = "OreOre";
///     const FIELDS: &'static [&'static str] = &["ID", "Name"];
/// }
///
/// assert!(OreOre::declares("ID"));
/// assert!(!OreOre::declares("Age"));
/// ```
pub trait RecordShape {
    /// Human-readable name of the shape, used in error messages.
    const NAME: &'static str;
    /// Declared field names.
    const FIELDS: &'static [&'static str];

    /// Returns `true` when `field` resolves to a declared field.
    fn declares(field: &str) -> bool {
        Self::FIELDS.contains(&field)
    }
}

/// Shape for tables whose record layout is only known at runtime.
///
/// Any identifier-shaped field name resolves, except the literal keywords
/// `true`, `false` and `null`; anything else does not.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dynamic;

impl RecordShape for Dynamic {
    const NAME: &'static str = "dynamic";
    const FIELDS: &'static [&'static str] = &[];

    fn declares(field: &str) -> bool {
        is_identifier(field)
    }
}

/// Words that render as literals and so can never name a field.
pub const RESERVED_WORDS: &[&str] = &["true", "false", "null"];

/// Returns `true` for [`RESERVED_WORDS`].
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// `[A-Za-z_][A-Za-z0-9_]*`, excluding reserved words.
pub(crate) fn is_identifier(name: &str) -> bool {
    if is_reserved_word(name) {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
