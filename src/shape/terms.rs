//! Term list conversion

use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use crate::model::Term;

/// Key decoded terms by identifier, sharing each through an `Arc`
///
/// A repeated identifier keeps the first term.
pub fn terms_from_wire(terms: Vec<Term>) -> HashMap<String, Arc<Term>> {
    let mut map = HashMap::with_capacity(terms.len());
    for term in terms {
        if map.contains_key(&term.id) {
            warn!("Duplicate term '{}' ignored", term.id);
            continue;
        }
        map.insert(term.id.clone(), Arc::new(term));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_keyed_by_id() {
        let map = terms_from_wire(vec![
            Term::new("cv_0", "A", "u", None),
            Term::new("cv_1", "B", "u", None),
            Term::new("cv_0", "C", "u", None),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["cv_0"].name, "A");
    }
}
