//! Static description of which columns can be sorted and how.
//!
//! The registry is built once at startup. Validation happens in
//! [`FieldRegistry::new`] so that every later stage (field order, drafts,
//! comparator) can rely on unique keys and a well-formed direction list.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::error::SortError;
use super::field_order::FieldOrder;

/// Stable identifier of a sortable field. Keys come from static
/// configuration, so they borrow for the whole program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(key: &'static str) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Internal sort direction. Display labels such as "Newest to Oldest" always
/// map onto one of these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Wire token understood by [`FromStr`].
    pub fn token(&self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

impl FromStr for Direction {
    type Err = SortError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            _ => Err(SortError::UnrecognizedDirection(raw.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// How values of a field are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Raw lexicographic order of the natural text representation.
    Text,
    /// Parsed instants; the text form is never compared directly.
    Temporal,
    Numeric,
}

/// One selectable direction together with the label shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionOption {
    pub label: &'static str,
    pub direction: Direction,
}

impl DirectionOption {
    pub const fn new(label: &'static str, direction: Direction) -> Self {
        Self { label, direction }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortFieldDescriptor {
    pub key: FieldKey,
    pub label: &'static str,
    /// Short glyph drawn before the label.
    pub icon: &'static str,
    pub kind: ValueKind,
    /// Options in display order.
    pub directions: Vec<DirectionOption>,
}

impl SortFieldDescriptor {
    pub fn new(
        key: &'static str,
        label: &'static str,
        icon: &'static str,
        kind: ValueKind,
        directions: Vec<DirectionOption>,
    ) -> Self {
        Self {
            key: FieldKey::new(key),
            label,
            icon,
            kind,
            directions,
        }
    }

    pub fn allows(&self, direction: Direction) -> bool {
        self.directions.iter().any(|opt| opt.direction == direction)
    }

    /// Label shown for `direction`, if this field offers it.
    pub fn label_for(&self, direction: Direction) -> Option<&'static str> {
        self.directions
            .iter()
            .find(|opt| opt.direction == direction)
            .map(|opt| opt.label)
    }
}

/// Validated, ordered collection of sortable fields.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<SortFieldDescriptor>,
}

impl FieldRegistry {
    /// Validate the descriptors. Any violation is a configuration bug, so
    /// callers are expected to abort startup on error.
    pub fn new(fields: Vec<SortFieldDescriptor>) -> Result<Self, SortError> {
        if fields.is_empty() {
            return Err(SortError::EmptyRegistry);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.key) {
                return Err(SortError::DuplicateField(field.key));
            }
            if field.directions.len() < 2 {
                return Err(SortError::TooFewDirections {
                    field: field.key,
                    count: field.directions.len(),
                });
            }
            let distinct: HashSet<Direction> =
                field.directions.iter().map(|opt| opt.direction).collect();
            if distinct.len() != field.directions.len() {
                return Err(SortError::DuplicateDirection(field.key));
            }
        }

        Ok(Self { fields })
    }

    pub fn get(&self, key: FieldKey) -> Option<&SortFieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn require(&self, key: FieldKey) -> Result<&SortFieldDescriptor, SortError> {
        self.get(key).ok_or(SortError::UnknownField(key))
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortFieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field order in registration sequence.
    pub fn default_order(&self) -> FieldOrder {
        FieldOrder::from_registry(self)
    }

    /// Resolve a caller-supplied direction for `key`. Accepts the `asc`/`desc`
    /// tokens as well as the field's own display labels; anything else, or a
    /// direction the field does not offer, is rejected.
    pub fn resolve_direction(&self, key: FieldKey, token: &str) -> Result<Direction, SortError> {
        let field = self.require(key)?;
        let direction = match field
            .directions
            .iter()
            .find(|opt| opt.label.eq_ignore_ascii_case(token.trim()))
        {
            Some(opt) => opt.direction,
            None => token.parse::<Direction>()?,
        };
        if field.allows(direction) {
            Ok(direction)
        } else {
            Err(SortError::UnrecognizedDirection(token.to_string()))
        }
    }
}

/// Field keys of the client table.
pub const NAME: FieldKey = FieldKey::new("name");
pub const CREATED_AT: FieldKey = FieldKey::new("createdAt");
pub const UPDATED_AT: FieldKey = FieldKey::new("updatedAt");
pub const ID: FieldKey = FieldKey::new("id");

/// Registry used by the client table.
pub fn client_fields() -> Result<FieldRegistry, SortError> {
    let alphabetical = || {
        vec![
            DirectionOption::new("A-Z", Direction::Ascending),
            DirectionOption::new("Z-A", Direction::Descending),
        ]
    };
    let chronological = || {
        vec![
            DirectionOption::new("Newest to Oldest", Direction::Descending),
            DirectionOption::new("Oldest to Newest", Direction::Ascending),
        ]
    };

    FieldRegistry::new(vec![
        SortFieldDescriptor::new(NAME.as_str(), "Client Name", "Aa", ValueKind::Text, alphabetical()),
        SortFieldDescriptor::new(
            CREATED_AT.as_str(),
            "Created At",
            "[]",
            ValueKind::Temporal,
            chronological(),
        ),
        SortFieldDescriptor::new(
            UPDATED_AT.as_str(),
            "Updated At",
            "()",
            ValueKind::Temporal,
            chronological(),
        ),
        SortFieldDescriptor::new(ID.as_str(), "Client ID", "#", ValueKind::Numeric, alphabetical()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_way(key: &'static str) -> SortFieldDescriptor {
        SortFieldDescriptor::new(
            key,
            "Field",
            "",
            ValueKind::Text,
            vec![
                DirectionOption::new("Up", Direction::Ascending),
                DirectionOption::new("Down", Direction::Descending),
            ],
        )
    }

    #[test]
    fn duplicate_keys_fail_fast() {
        let err = FieldRegistry::new(vec![two_way("a"), two_way("b"), two_way("a")]).unwrap_err();
        assert_eq!(err, SortError::DuplicateField(FieldKey::new("a")));
    }

    #[test]
    fn single_direction_fields_are_rejected() {
        let mut field = two_way("a");
        field.directions.truncate(1);
        let err = FieldRegistry::new(vec![field]).unwrap_err();
        assert!(matches!(err, SortError::TooFewDirections { count: 1, .. }));
    }

    #[test]
    fn repeated_direction_is_rejected() {
        let mut field = two_way("a");
        field.directions[1].direction = Direction::Ascending;
        let err = FieldRegistry::new(vec![field]).unwrap_err();
        assert_eq!(err, SortError::DuplicateDirection(FieldKey::new("a")));
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert_eq!(FieldRegistry::new(Vec::new()).unwrap_err(), SortError::EmptyRegistry);
    }

    #[test]
    fn direction_tokens_parse_strictly() {
        assert_eq!("asc".parse::<Direction>().unwrap(), Direction::Ascending);
        assert_eq!("DESC".parse::<Direction>().unwrap(), Direction::Descending);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(SortError::UnrecognizedDirection(_))
        ));
    }

    #[test]
    fn resolve_direction_accepts_display_labels() {
        let registry = client_fields().unwrap();
        assert_eq!(
            registry.resolve_direction(CREATED_AT, "Newest to Oldest").unwrap(),
            Direction::Descending
        );
        assert_eq!(registry.resolve_direction(NAME, "Z-A").unwrap(), Direction::Descending);
        assert_eq!(registry.resolve_direction(ID, "asc").unwrap(), Direction::Ascending);
        assert!(registry.resolve_direction(NAME, "newest").is_err());
        assert_eq!(
            registry.resolve_direction(FieldKey::new("email"), "asc").unwrap_err(),
            SortError::UnknownField(FieldKey::new("email"))
        );
    }

    #[test]
    fn client_registry_order_is_stable() {
        let registry = client_fields().unwrap();
        let keys: Vec<_> = registry.iter().map(|f| f.key).collect();
        assert_eq!(keys, vec![NAME, CREATED_AT, UPDATED_AT, ID]);
        assert_eq!(registry.get(UPDATED_AT).unwrap().kind, ValueKind::Temporal);
    }
}
