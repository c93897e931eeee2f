use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::graph::{Graph, NodeKind};

use super::AttrValue;

pub const CODE_FIELD: &str = "code";
pub const NAME_FIELD: &str = "name";

/// Category code → display name. A null name is a known code with no name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryNames {
    names: BTreeMap<String, Option<String>>,
}

impl CategoryNames {
    pub fn new() -> Self { Self::default() }

    #[inline] pub fn len(&self) -> usize { self.names.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// `None` if the code is unknown, `Some(None)` if it is known but unnamed.
    #[inline] pub fn get(&self, code: &str) -> Option<Option<&str>> {
        self.names.get(code).map(Option::as_deref)
    }

    pub fn insert(&mut self, code: impl Into<String>, name: Option<String>) {
        self.names.insert(code.into(), name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.names.iter().map(|(code, name)| (code.as_str(), name.as_deref()))
    }
}

/// Attach `code` and `name` to every category node. Unknown and unnamed
/// codes get a null name; unknown codes are returned.
pub fn annotate_categories<V>(graph: &mut Graph<V>, names: &CategoryNames) -> BTreeSet<String> {
    let mut missing = BTreeSet::new();

    for (node, attrs) in graph.nodes_mut().filter(|(node, _)| node.kind() == NodeKind::Category) {
        let name = match names.get(node.id()) {
            Some(name) => name.map(|n| AttrValue::Text(n.to_string())),
            None => {
                missing.insert(node.id().to_string());
                None
            }
        };
        attrs.insert(CODE_FIELD.to_string(), Some(AttrValue::Text(node.id().to_string())));
        attrs.insert(NAME_FIELD.to_string(), name);
    }

    if !missing.is_empty() {
        warn!("[attributes] {} category codes have no name entry", missing.len());
    }
    missing
}

/// Build a calling code → country name table for `codes`.
///
/// `phones` maps an ISO abbreviation to a free-form phone code string such as
/// `"+1-684"` or `"39 379"`; everything but digits and spaces is stripped and
/// each space-separated code maps back to the abbreviation (a later entry wins
/// when two countries share a code). The name is the country name from
/// `countries` when known, else the abbreviation, else null.
pub fn calling_code_names<'a>(
    codes: impl IntoIterator<Item = &'a str>,
    countries: &IndexMap<String, String>,
    phones: &IndexMap<String, String>,
) -> CategoryNames {
    let mut code_to_abbr: IndexMap<String, &str> = IndexMap::new();
    for (abbr, raw) in phones {
        let digits = raw.chars().filter(|c| c.is_ascii_digit() || *c == ' ').collect::<String>();
        for code in digits.split(' ').filter(|code| !code.is_empty()) {
            code_to_abbr.insert(code.to_string(), abbr.as_str());
        }
    }

    let mut names = CategoryNames::new();
    for code in codes {
        let name = code_to_abbr.get(code).map(|abbr| {
            countries.get(*abbr).cloned().unwrap_or_else(|| abbr.to_string())
        });
        names.insert(code, name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::{NodeId, WeightedGraph}, region::RegionId};

    fn table(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn codes_resolve_through_abbreviations() {
        let countries = table(&[("IT", "Italy"), ("US", "United States")]);
        let phones = table(&[("IT", "39"), ("US", "1"), ("AS", "+1-684"), ("VA", "379 39")]);

        let names = calling_code_names(["39", "1684", "379", "1", "999"], &countries, &phones);

        // VA is listed after IT, so it claims 39.
        assert_eq!(names.get("39"), Some(Some("VA")));
        assert_eq!(names.get("1684"), Some(Some("AS")));
        assert_eq!(names.get("1"), Some(Some("United States")));
        assert_eq!(names.get("999"), Some(None));
        assert_eq!(names.get("44"), None);
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn category_nodes_get_code_and_name() {
        let mut graph = WeightedGraph::new();
        let block = NodeId::block(&RegionId::from("100"));
        graph.add_weight(block.clone(), NodeId::category("39"), 1.0);
        graph.add_weight(block.clone(), NodeId::category("7"), 1.0);
        graph.add_weight(block.clone(), NodeId::category("0"), 1.0);

        let mut names = CategoryNames::new();
        names.insert("39", Some("Italy".into()));
        names.insert("7", None);

        let missing = annotate_categories(&mut graph, &names);
        assert_eq!(missing, BTreeSet::from(["0".to_string()]));

        let italy = graph.attributes(&NodeId::category("39")).unwrap();
        assert_eq!(italy[CODE_FIELD], Some(AttrValue::Text("39".into())));
        assert_eq!(italy[NAME_FIELD], Some(AttrValue::Text("Italy".into())));
        assert_eq!(graph.attributes(&NodeId::category("7")).unwrap()[NAME_FIELD], None);
        assert!(graph.attributes(&block).unwrap().is_empty());
    }
}
