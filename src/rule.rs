use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Field allow-list attached to a grant.
///
/// Declared in the grant table either as a wildcard with optional
/// exclusions (`["*", "!roles"]`) or as an explicit enumeration
/// (`["id", "name"]`). The same rule governs visibility on reads and
/// settability on creates/updates.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldRule {
    /// All fields except the excluded ones.
    All {
        /// Field names removed from the wildcard.
        excluding: BTreeSet<String>,
    },
    /// Only the listed fields.
    Only(BTreeSet<String>),
}

impl FieldRule {
    /// All fields, no exclusions.
    pub fn all() -> Self {
        FieldRule::All {
            excluding: BTreeSet::new(),
        }
    }

    /// All fields except the given ones.
    pub fn all_excluding<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldRule::All {
            excluding: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Only the given fields.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldRule::Only(fields.into_iter().map(Into::into).collect())
    }

    /// No fields at all. This is the rule a denied permission carries.
    pub fn none() -> Self {
        FieldRule::Only(BTreeSet::new())
    }

    /// Parses the declaration marker grammar.
    ///
    /// `"*"` selects all fields and may be combined with `"!name"`
    /// exclusions; without the wildcard only plain field names are legal.
    pub fn parse<S: AsRef<str>>(markers: &[S]) -> Result<Self> {
        let has_wildcard = markers.iter().any(|m| m.as_ref() == "*");
        if has_wildcard {
            let mut excluding = BTreeSet::new();
            for marker in markers {
                let marker = marker.as_ref();
                if marker == "*" {
                    continue;
                }
                let Some(field) = marker.strip_prefix('!') else {
                    return Err(Error::InvalidFieldRule(format!(
                        "plain field {marker} mixed into a wildcard rule"
                    )));
                };
                if field.is_empty() {
                    return Err(Error::InvalidFieldRule(
                        "exclusion marker without a field name".to_string(),
                    ));
                }
                excluding.insert(field.to_string());
            }
            return Ok(FieldRule::All { excluding });
        }

        let mut fields = BTreeSet::new();
        for marker in markers {
            let marker = marker.as_ref();
            if marker.is_empty() {
                return Err(Error::InvalidFieldRule("empty field name".to_string()));
            }
            if marker.starts_with('!') {
                // exclusions only have meaning alongside the wildcard
                return Err(Error::InvalidFieldRule(format!(
                    "exclusion {marker} without a wildcard"
                )));
            }
            fields.insert(marker.to_string());
        }
        Ok(FieldRule::Only(fields))
    }

    /// Returns whether the rule admits the given field.
    pub fn allows(&self, field: &str) -> bool {
        match self {
            FieldRule::All { excluding } => !excluding.contains(field),
            FieldRule::Only(fields) => fields.contains(field),
        }
    }

    /// Returns whether the rule admits no field at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldRule::Only(fields) if fields.is_empty())
    }

    /// Unions two rules into the most permissive combination.
    ///
    /// An exclusion survives only while every contributing rule excludes
    /// the field; a rule that grants the field positively cancels it.
    pub fn union(self, other: &FieldRule) -> FieldRule {
        match (self, other) {
            (FieldRule::All { excluding: a }, FieldRule::All { excluding: b }) => FieldRule::All {
                excluding: a.intersection(b).cloned().collect(),
            },
            (FieldRule::All { excluding }, FieldRule::Only(fields)) => FieldRule::All {
                excluding: excluding
                    .into_iter()
                    .filter(|field| !fields.contains(field))
                    .collect(),
            },
            (FieldRule::Only(fields), FieldRule::All { excluding }) => FieldRule::All {
                excluding: excluding.difference(&fields).cloned().collect(),
            },
            (FieldRule::Only(mut a), FieldRule::Only(b)) => {
                a.extend(b.iter().cloned());
                FieldRule::Only(a)
            }
        }
    }
}
