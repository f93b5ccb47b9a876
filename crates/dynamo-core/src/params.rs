//! The read-only run parameter map.

use indexmap::IndexMap;

use crate::error::ParameterError;

/// Immutable mapping from parameter names to numeric values.
///
/// Loaded once at startup and read-only afterwards. [`get`](Self::get)
/// returns `0.0` for absent keys instead of failing, matching the
/// solver's parameter-file convention. That fallback can silently turn
/// a variable profile into a degenerate one; callers that must tell
/// absence apart from an explicit zero use [`try_get`](Self::try_get).
///
/// # Examples
///
/// ```
/// use dynamo_core::ParameterSet;
///
/// let params: ParameterSet = [("etam", 0.01)].into_iter().collect();
/// assert_eq!(params.get("etam"), 0.01);
/// assert_eq!(params.get("missing"), 0.0);
/// assert_eq!(params.try_get("missing"), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    values: IndexMap<String, f64>,
}

impl ParameterSet {
    /// Value returned by [`get`](Self::get) for absent keys.
    pub const DEFAULT_VALUE: f64 = 0.0;

    /// An empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `name`, falling back to [`DEFAULT_VALUE`](Self::DEFAULT_VALUE).
    pub fn get(&self, name: &str) -> f64 {
        self.try_get(name).unwrap_or(Self::DEFAULT_VALUE)
    }

    /// Look up `name`, returning `None` if it was never set.
    pub fn try_get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Whether `name` was explicitly set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Parse the `name = value` parameter-file format.
    ///
    /// Blank lines and everything after a `#` are ignored. Later
    /// assignments to the same name replace earlier ones. Only numeric
    /// values are accepted; the solver's string-valued settings belong
    /// to the external configuration loader.
    pub fn parse_str(text: &str) -> Result<Self, ParameterError> {
        let mut values = IndexMap::new();
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ParameterError::Malformed {
                line: line_no,
                content: line.to_string(),
            })?;
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                return Err(ParameterError::Malformed {
                    line: line_no,
                    content: line.to_string(),
                });
            }
            let parsed: f64 = value.parse().map_err(|_| ParameterError::InvalidValue {
                line: line_no,
                key: key.to_string(),
                value: value.to_string(),
            })?;
            values.insert(key.to_string(), parsed);
        }
        Ok(Self { values })
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_defaults_to_zero() {
        let p = ParameterSet::new();
        assert_eq!(p.get("etam"), 0.0);
        assert!(!p.contains("etam"));
    }

    #[test]
    fn explicit_zero_is_distinguishable() {
        let p: ParameterSet = [("etam", 0.0)].into_iter().collect();
        assert_eq!(p.try_get("etam"), Some(0.0));
        assert!(p.contains("etam"));
    }

    #[test]
    fn parse_skips_comments_and_blanks() {
        let text = "\
# mantle conductivity ratio
etam = 0.01   # almost insulating

Ra = 1e5
";
        let p = ParameterSet::parse_str(text).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("etam"), 0.01);
        assert_eq!(p.get("Ra"), 1e5);
        let names: Vec<&str> = p.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["etam", "Ra"]);
    }

    #[test]
    fn parse_later_assignment_wins() {
        let p = ParameterSet::parse_str("a = 1\na = 2\n").unwrap();
        assert_eq!(p.get("a"), 2.0);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn parse_rejects_missing_equals() {
        match ParameterSet::parse_str("etam 0.01") {
            Err(ParameterError::Malformed { line: 1, .. }) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_empty_key() {
        match ParameterSet::parse_str("x = 1\n = 3") {
            Err(ParameterError::Malformed { line: 2, .. }) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_non_numeric() {
        match ParameterSet::parse_str("job = run1") {
            Err(ParameterError::InvalidValue { key, value, .. }) => {
                assert_eq!(key, "job");
                assert_eq!(value, "run1");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }
}
