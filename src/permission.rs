use crate::filter;
use crate::rule::FieldRule;
use bson::Bson;

/// Result of resolving a role set against the grant table.
///
/// A transient value object created per query and discarded with it; it
/// holds no reference back to the table.
#[derive(Clone, Debug, PartialEq)]
pub struct Permission {
    granted: bool,
    attributes: FieldRule,
}

impl Permission {
    pub(crate) fn granted_with(attributes: FieldRule) -> Self {
        Self {
            granted: true,
            attributes,
        }
    }

    pub(crate) fn denied() -> Self {
        Self {
            granted: false,
            attributes: FieldRule::none(),
        }
    }

    /// Returns whether at least one held role carried a matching grant.
    ///
    /// A granted permission may still resolve to an empty field list; that
    /// is a valid outcome distinct from denial.
    pub fn granted(&self) -> bool {
        self.granted
    }

    /// Returns the resolved field allow-list.
    pub fn attributes(&self) -> &FieldRule {
        &self.attributes
    }

    /// Normalizes object ids and projects `data` down to the allowed fields.
    ///
    /// Handles a single document, an array of documents (element-wise,
    /// preserving order and length) and anything else unchanged, which
    /// covers null. Callers are expected to have checked
    /// [`Permission::granted`] first; filtering through a denied permission
    /// is safe and simply yields an empty projection.
    pub fn filter(&self, data: Bson) -> Bson {
        filter::apply(&self.attributes, data)
    }
}
