use std::fmt;

use linear_map::LinearMap;
use serde::{Deserialize, Serialize};

/// A `[lon, lat]` pair as it appears in the output records
pub type LonLat = [f64; 2];

/// Tags of a single element, in document order
pub type TagMap = LinearMap<String, String>;

/// The three element kinds of an osm document
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Map an xml tag name to its kind
    pub fn from_tag_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(ElementKind::Node),
            b"way" => Some(ElementKind::Way),
            b"relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The element currently being read
///
/// Created from its opening tag's attributes, filled while its children are
/// streamed in and consumed when it closes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub id: String,
    pub timestamp: String,

    /// Position, nodes only
    pub coordinate: Option<LonLat>,

    /// Resolved `nd` references in reference order, ways only
    pub geometry: Vec<LonLat>,
}

impl Element {
    pub fn new(kind: ElementKind, id: String, timestamp: String) -> Self {
        Element {
            kind,
            id,
            timestamp,
            coordinate: None,
            geometry: Vec::new(),
        }
    }

    pub fn node(id: String, timestamp: String, lon: f64, lat: f64) -> Self {
        Element {
            kind: ElementKind::Node,
            id,
            timestamp,
            coordinate: Some([lon, lat]),
            geometry: Vec::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::element::ElementKind;

    #[test]
    fn tag_names() {
        assert_eq!(
            ElementKind::from_tag_name(b"node"),
            Some(ElementKind::Node)
        );
        assert_eq!(ElementKind::from_tag_name(b"way"), Some(ElementKind::Way));
        assert_eq!(
            ElementKind::from_tag_name(b"relation"),
            Some(ElementKind::Relation)
        );
        assert_eq!(ElementKind::from_tag_name(b"bounds"), None);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ElementKind::Relation).unwrap(),
            "\"relation\""
        );
    }
}
