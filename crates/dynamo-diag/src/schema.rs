//! Fixed slot layout shared by every rank's diagnostic record.

use std::ops::Range;

use indexmap::IndexMap;

use crate::error::SchemaError;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A named slot and its number of components.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SlotDef {
    /// Column name in the diagnostic log.
    pub name: String,
    /// Number of `f64` components.
    pub arity: usize,
}

impl SlotDef {
    /// A slot with `arity` components.
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }

    /// A single-component slot.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }
}

/// The ordered slot layout of a diagnostic record.
///
/// Built once before the first cycle and shared (through `Arc`) by the
/// record, the pipeline and the log writer. Every rank must build the
/// identical schema: same names, same order, same arities. The
/// [`fingerprint`](Self::fingerprint) lets ranks confirm that cheaply.
///
/// # Examples
///
/// ```
/// use dynamo_diag::DiagnosticSchema;
///
/// let schema = DiagnosticSchema::builder()
///     .scalar("count")
///     .slot("ke_split", 2)
///     .build()
///     .unwrap();
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.range_of("ke_split"), Some(1..3));
/// assert_eq!(schema.column_names(), ["count", "ke_split[0]", "ke_split[1]"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticSchema {
    slots: Vec<SlotDef>,
    offsets: IndexMap<String, Range<usize>>,
    len: usize,
    fingerprint: u64,
}

impl DiagnosticSchema {
    /// Start an empty builder.
    pub fn builder() -> DiagnosticSchemaBuilder {
        DiagnosticSchemaBuilder::default()
    }

    /// Total number of components across all slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the schema has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[SlotDef] {
        &self.slots
    }

    /// Component range of a slot within the flat record.
    pub fn range_of(&self, name: &str) -> Option<Range<usize>> {
        self.offsets.get(name).cloned()
    }

    /// Whether a slot with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.offsets.contains_key(name)
    }

    /// 64-bit FNV-1a hash over slot names and arities, in order.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// One column name per component. Arity-1 slots keep their name;
    /// arity-k slots expand to `name[0]` .. `name[k-1]`.
    pub fn column_names(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len);
        for slot in &self.slots {
            if slot.arity == 1 {
                out.push(slot.name.clone());
            } else {
                out.extend((0..slot.arity).map(|i| format!("{}[{i}]", slot.name)));
            }
        }
        out
    }
}

/// Builder for [`DiagnosticSchema`].
#[derive(Clone, Debug, Default)]
pub struct DiagnosticSchemaBuilder {
    slots: Vec<SlotDef>,
}

impl DiagnosticSchemaBuilder {
    /// Append a slot with `arity` components.
    pub fn slot(mut self, name: impl Into<String>, arity: usize) -> Self {
        self.slots.push(SlotDef::new(name, arity));
        self
    }

    /// Append a single-component slot.
    pub fn scalar(self, name: impl Into<String>) -> Self {
        self.slot(name, 1)
    }

    /// Append several slots in order.
    pub fn extend(mut self, slots: impl IntoIterator<Item = SlotDef>) -> Self {
        self.slots.extend(slots);
        self
    }

    /// Validate and freeze the layout.
    pub fn build(self) -> Result<DiagnosticSchema, SchemaError> {
        let mut offsets = IndexMap::with_capacity(self.slots.len());
        let mut len = 0;
        let mut fingerprint = FNV_OFFSET;
        for slot in &self.slots {
            if slot.name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if slot.name.chars().any(char::is_whitespace) {
                return Err(SchemaError::InvalidName {
                    name: slot.name.clone(),
                });
            }
            if slot.arity == 0 {
                return Err(SchemaError::ZeroArity {
                    name: slot.name.clone(),
                });
            }
            if offsets
                .insert(slot.name.clone(), len..len + slot.arity)
                .is_some()
            {
                return Err(SchemaError::DuplicateSlot {
                    name: slot.name.clone(),
                });
            }
            len += slot.arity;
            // Length-prefix the name so ("ab", "c") and ("a", "bc") differ.
            fingerprint = fnv1a_bytes(fingerprint, &(slot.name.len() as u64).to_le_bytes());
            fingerprint = fnv1a_bytes(fingerprint, slot.name.as_bytes());
            fingerprint = fnv1a_bytes(fingerprint, &(slot.arity as u64).to_le_bytes());
        }
        Ok(DiagnosticSchema {
            slots: self.slots,
            offsets,
            len,
            fingerprint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_declaration_order() {
        let s = DiagnosticSchema::builder()
            .slot("a", 3)
            .scalar("b")
            .slot("c", 2)
            .build()
            .unwrap();
        assert_eq!(s.len(), 6);
        assert_eq!(s.slot_count(), 3);
        assert_eq!(s.range_of("a"), Some(0..3));
        assert_eq!(s.range_of("b"), Some(3..4));
        assert_eq!(s.range_of("c"), Some(4..6));
        assert_eq!(s.range_of("d"), None);
    }

    #[test]
    fn empty_schema_is_valid() {
        let s = DiagnosticSchema::builder().build().unwrap();
        assert!(s.is_empty());
        assert_eq!(s.len(), 0);
        assert_eq!(s.fingerprint(), FNV_OFFSET);
    }

    #[test]
    fn rejects_bad_slots() {
        assert_eq!(
            DiagnosticSchema::builder().scalar("").build(),
            Err(SchemaError::EmptyName)
        );
        assert_eq!(
            DiagnosticSchema::builder().slot("x", 0).build(),
            Err(SchemaError::ZeroArity { name: "x".into() })
        );
        assert_eq!(
            DiagnosticSchema::builder().scalar("x").scalar("x").build(),
            Err(SchemaError::DuplicateSlot { name: "x".into() })
        );
        assert_eq!(
            DiagnosticSchema::builder().scalar("k e").build(),
            Err(SchemaError::InvalidName { name: "k e".into() })
        );
    }

    #[test]
    fn fingerprint_sensitive_to_name_order_and_arity() {
        let base = DiagnosticSchema::builder()
            .scalar("a")
            .scalar("b")
            .build()
            .unwrap();
        let same = DiagnosticSchema::builder()
            .scalar("a")
            .scalar("b")
            .build()
            .unwrap();
        let swapped = DiagnosticSchema::builder()
            .scalar("b")
            .scalar("a")
            .build()
            .unwrap();
        let wider = DiagnosticSchema::builder()
            .scalar("a")
            .slot("b", 2)
            .build()
            .unwrap();
        let split = DiagnosticSchema::builder()
            .scalar("ab")
            .scalar("c")
            .build()
            .unwrap();
        let resplit = DiagnosticSchema::builder()
            .scalar("a")
            .scalar("bc")
            .build()
            .unwrap();
        assert_eq!(base.fingerprint(), same.fingerprint());
        assert_ne!(base.fingerprint(), swapped.fingerprint());
        assert_ne!(base.fingerprint(), wider.fingerprint());
        assert_ne!(split.fingerprint(), resplit.fingerprint());
    }

    #[test]
    fn column_names_expand_arrays() {
        let s = DiagnosticSchema::builder()
            .scalar("count")
            .slot("v", 3)
            .build()
            .unwrap();
        assert_eq!(s.column_names(), ["count", "v[0]", "v[1]", "v[2]"]);
    }
}
