//! The analyzer's state machine
//!
//! [CompletenessParser] consumes the events of one osm document in input
//! order. Way geometry is joined against nodes seen earlier in the same pass,
//! so a document must list a node before any way referencing it; a reference
//! which can't be resolved when it is read is dropped from the way's ring.

use std::collections::HashMap;

use serde::Serialize;

use crate::completeness::RequiredTags;
use crate::element::{Element, ElementKind, LonLat, TagMap};
use crate::emit;
use crate::emit::{Finding, Severity};
use crate::output::{Sink, SinkError, SinkSet};
use crate::xml::Handler;

/// Counters reported after a run
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Tagged elements seen
    pub features_collected: u64,
    /// Tagged elements without any error or warning
    pub features_completed: u64,
    /// Records written to the errors sink
    pub errors_warnings: u64,
}

/// State machine turning a stream of osm events into completeness records
pub struct CompletenessParser<S: Sink> {
    rules: RequiredTags,
    sinks: SinkSet<S>,

    /// Positions of untagged nodes, kept for the whole document
    node_cache: HashMap<String, LonLat>,

    working: Working,

    pub stats: Stats,
    finalized: bool,
}

/// State scoped to the element currently open, reset between elements
#[derive(Default)]
struct Working {
    element: Option<Element>,
    tags: TagMap,
    has_tags: bool,
}

impl Working {
    fn reset(&mut self) {
        self.element = None;
        self.tags.clear();
        self.has_tags = false;
    }
}

impl<S: Sink> CompletenessParser<S> {
    pub fn new(rules: RequiredTags, sinks: SinkSet<S>) -> Self {
        CompletenessParser {
            rules,
            sinks,
            node_cache: HashMap::new(),
            working: Working::default(),
            stats: Stats::default(),
            finalized: false,
        }
    }

    /// Recover the sinks, e.g. to read back in-memory records
    pub fn into_sinks(self) -> SinkSet<S> {
        self.sinks
    }

    fn score_and_emit(&mut self, element: Element) -> Result<(), SinkError> {
        self.stats.features_collected += 1;
        let completeness = self.rules.evaluate(&self.working.tags);

        // Findings go out before the element's feature and point records
        if !completeness.errors.is_empty() {
            self.sinks
                .errors
                .append_record(&Finding::new(&element, Severity::Error, &completeness.errors))?;
            self.stats.errors_warnings += 1;
        }
        if !completeness.warnings.is_empty() {
            self.sinks.errors.append_record(&Finding::new(
                &element,
                Severity::Warning,
                &completeness.warnings,
            ))?;
            self.stats.errors_warnings += 1;
        }

        if completeness.is_complete() {
            self.stats.features_completed += 1;
        }

        if let Some(feature) = emit::feature(&element, &self.working.tags, &completeness) {
            self.sinks.features.append_record(&feature)?;
        }
        if let Some(point) = emit::point(&element, &self.working.tags, &completeness) {
            self.sinks.points.append_record(&point)?;
        }
        Ok(())
    }
}

impl<S: Sink> Handler for CompletenessParser<S> {
    fn element_start(&mut self, element: Element) {
        self.working.reset();
        self.working.element = Some(element);
    }

    fn child_tag(&mut self, key: String, value: String) {
        if self.working.element.is_none() {
            return;
        }
        self.working.tags.insert(key, value);
        self.working.has_tags = true;
    }

    fn child_node_ref(&mut self, node_ref: &str) {
        let Some(way) = self
            .working
            .element
            .as_mut()
            .filter(|element| element.kind == ElementKind::Way)
        else {
            return;
        };
        if let Some(&coordinate) = self.node_cache.get(node_ref) {
            way.geometry.push(coordinate);
        } else {
            log::debug!("Dropping unresolved node ref {node_ref} in way {}", way.id);
        }
    }

    fn element_end(&mut self, kind: ElementKind) -> Result<(), SinkError> {
        let Some(element) = self.working.element.take() else {
            return Ok(());
        };
        if element.kind != kind {
            self.working.element = Some(element);
            return Ok(());
        }

        if self.working.has_tags {
            self.score_and_emit(element)?;
        } else if element.kind == ElementKind::Node {
            // The cache only ever holds untagged nodes
            if let Some(coordinate) = element.coordinate {
                self.node_cache.insert(element.id, coordinate);
            }
        }

        self.working.reset();
        Ok(())
    }

    fn document_end(&mut self) -> Result<(), SinkError> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        self.sinks.finish()?;
        log::info!(
            "Collected {} features, {} complete, {} errors/warnings",
            self.stats.features_collected,
            self.stats.features_completed,
            self.stats.errors_warnings
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::completeness::RequiredTags;
    use crate::element::{Element, ElementKind};
    use crate::output::{MemorySink, SinkSet};
    use crate::parser::CompletenessParser;
    use crate::xml::Handler;

    fn rules<const N: usize>(entries: [(&str, &[&str]); N]) -> RequiredTags {
        RequiredTags {
            rules: entries
                .into_iter()
                .map(|(key, values)| {
                    (
                        key.to_string(),
                        values.iter().map(ToString::to_string).collect(),
                    )
                })
                .collect(),
        }
    }

    fn parser(rules: RequiredTags) -> CompletenessParser<MemorySink> {
        CompletenessParser::new(rules, SinkSet::buffered())
    }

    fn node(parser: &mut CompletenessParser<MemorySink>, id: &str, tags: &[(&str, &str)]) {
        parser.element_start(Element::node(
            id.to_string(),
            "2020-05-01T12:00:00Z".to_string(),
            8.55,
            47.36,
        ));
        for (key, value) in tags {
            parser.child_tag(key.to_string(), value.to_string());
        }
        parser.element_end(ElementKind::Node).unwrap();
    }

    #[test]
    fn untagged_node_is_cached_only() {
        let mut parser = parser(rules([("amenity", &[])]));
        node(&mut parser, "1", &[]);

        assert_eq!(parser.node_cache.get("1"), Some(&[8.55, 47.36]));
        assert_eq!(parser.stats.features_collected, 0);

        let sinks = parser.into_sinks();
        assert_eq!(sinks.features.records, Vec::<String>::new());
        assert_eq!(sinks.points.records, Vec::<String>::new());
        assert_eq!(sinks.errors.records, Vec::<String>::new());
    }

    #[test]
    fn tagged_node_is_not_cached() {
        let mut parser = parser(rules([]));
        node(&mut parser, "1", &[("amenity", "cafe")]);
        assert!(parser.node_cache.is_empty());

        // a way referencing it resolves nothing
        parser.element_start(Element::new(
            ElementKind::Way,
            "10".to_string(),
            "2020-05-01T12:00:00Z".to_string(),
        ));
        parser.child_node_ref("1");
        parser.child_tag("building".to_string(), "yes".to_string());
        parser.element_end(ElementKind::Way).unwrap();

        let features = parser.into_sinks().features;
        let way: serde_json::Value = serde_json::from_str(&features.records[1]).unwrap();
        assert_eq!(way["geometry"]["coordinates"], json!([[]]));
    }

    #[test]
    fn complete_node_emits_feature_and_point() {
        let mut parser = parser(rules([("amenity", &[]), ("name", &[])]));
        node(&mut parser, "429972898", &[("amenity", "cafe"), ("name", "Joe")]);

        assert_eq!(parser.stats.features_collected, 1);
        assert_eq!(parser.stats.features_completed, 1);
        assert_eq!(parser.stats.errors_warnings, 0);

        let sinks = parser.into_sinks();
        assert_eq!(sinks.errors.records, Vec::<String>::new());
        assert_eq!(sinks.points.records.len(), 1);

        let feature: serde_json::Value = serde_json::from_str(&sinks.features.records[0]).unwrap();
        assert_eq!(feature["type"], json!("Feature"));
        assert_eq!(feature["id"], json!("429972898"));
        assert_eq!(feature["geometry"], json!({"type": "Point", "coordinates": [8.55, 47.36]}));
        assert_eq!(feature["properties"]["completeness_color"], json!("#00840d"));

        let point: serde_json::Value = serde_json::from_str(&sinks.points.records[0]).unwrap();
        assert_eq!(point[0], json!(47.36));
        assert_eq!(point[1], json!(8.55));
        assert_eq!(point[2], json!("#00840d"));
    }

    #[test]
    fn missing_tag_is_recorded_and_scored() {
        let mut parser = parser(rules([("amenity", &[]), ("name", &[])]));
        node(&mut parser, "7", &[("amenity", "cafe")]);

        assert_eq!(parser.stats.features_collected, 1);
        assert_eq!(parser.stats.features_completed, 0);
        assert_eq!(parser.stats.errors_warnings, 1);

        let sinks = parser.into_sinks();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&sinks.errors.records[0]).unwrap(),
            json!({
                "status": "error",
                "type": "node",
                "id": "7",
                "date": "2020-05-01T12:00:00Z",
                "comment": "name not found",
            })
        );

        // the feature is still written, in the 50% tier
        let feature: serde_json::Value = serde_json::from_str(&sinks.features.records[0]).unwrap();
        assert_eq!(feature["properties"]["completeness_color"], json!("#ffe500"));
    }

    #[test]
    fn shouted_name_is_a_warning_record() {
        let mut parser = parser(rules([("amenity", &[]), ("name", &[])]));
        node(&mut parser, "7", &[("amenity", "cafe"), ("name", "JOE")]);

        assert_eq!(parser.stats.features_completed, 0);
        assert_eq!(parser.stats.errors_warnings, 1);

        let sinks = parser.into_sinks();
        let warning: serde_json::Value = serde_json::from_str(&sinks.errors.records[0]).unwrap();
        assert_eq!(warning["status"], json!("warning"));
        assert_eq!(warning["comment"], json!("JOE is all uppercase"));

        // warnings don't touch the percentage
        let feature: serde_json::Value = serde_json::from_str(&sinks.features.records[0]).unwrap();
        assert_eq!(feature["properties"]["completeness_color"], json!("#00840d"));
    }

    #[test]
    fn way_ring_keeps_resolvable_refs_in_order() {
        let mut parser = parser(rules([("building", &[])]));
        parser.element_start(Element::node(
            "1".to_string(),
            "T".to_string(),
            8.50,
            47.30,
        ));
        parser.element_end(ElementKind::Node).unwrap();
        parser.element_start(Element::node(
            "2".to_string(),
            "T".to_string(),
            8.60,
            47.40,
        ));
        parser.element_end(ElementKind::Node).unwrap();

        parser.element_start(Element::new(
            ElementKind::Way,
            "10".to_string(),
            "T".to_string(),
        ));
        parser.child_node_ref("1");
        parser.child_node_ref("404");
        parser.child_node_ref("2");
        parser.child_tag("building".to_string(), "yes".to_string());
        parser.element_end(ElementKind::Way).unwrap();

        let sinks = parser.into_sinks();
        let feature: serde_json::Value = serde_json::from_str(&sinks.features.records[0]).unwrap();
        assert_eq!(
            feature["geometry"],
            json!({
                "type": "Polygon",
                "coordinates": [[[8.50, 47.30], [8.60, 47.40]]],
            })
        );
        // ways never produce points
        assert_eq!(sinks.points.records, Vec::<String>::new());
    }

    #[test]
    fn relation_is_scored_but_not_emitted() {
        let mut parser = parser(rules([("name", &[])]));
        parser.element_start(Element::new(
            ElementKind::Relation,
            "20".to_string(),
            "T".to_string(),
        ));
        parser.child_tag("type".to_string(), "multipolygon".to_string());
        parser.element_end(ElementKind::Relation).unwrap();

        assert_eq!(parser.stats.features_collected, 1);
        assert_eq!(parser.stats.errors_warnings, 1);

        let sinks = parser.into_sinks();
        assert_eq!(sinks.features.records, Vec::<String>::new());
        assert_eq!(sinks.points.records, Vec::<String>::new());
        assert_eq!(sinks.errors.records.len(), 1);
    }

    #[test]
    fn children_outside_an_element_are_ignored() {
        let mut parser = parser(rules([]));
        parser.child_tag("amenity".to_string(), "cafe".to_string());
        parser.child_node_ref("1");
        parser.element_end(ElementKind::Node).unwrap();

        // the stray tag didn't stick to the next element
        node(&mut parser, "1", &[]);
        assert_eq!(parser.stats.features_collected, 0);
        assert_eq!(parser.node_cache.len(), 1);
    }

    #[test]
    fn state_resets_between_elements() {
        let mut parser = parser(rules([("amenity", &[])]));
        node(&mut parser, "1", &[("amenity", "cafe")]);
        node(&mut parser, "2", &[]);

        // the second node is untagged again and lands in the cache
        assert_eq!(parser.stats.features_collected, 1);
        assert_eq!(parser.node_cache.get("2"), Some(&[8.55, 47.36]));

        node(&mut parser, "3", &[("amenity", "bar")]);
        let features = parser.into_sinks().features;
        let second: serde_json::Value = serde_json::from_str(&features.records[1]).unwrap();
        // no tag carried over from node 1
        assert!(!second["properties"]["popup"]
            .as_str()
            .unwrap()
            .contains("cafe"));
    }

    #[test]
    fn document_end_finalizes_sinks_once() {
        let mut parser = parser(rules([]));
        parser.document_end().unwrap();
        parser.document_end().unwrap();

        let sinks = parser.into_sinks();
        assert!(sinks.features.finished);
        assert!(sinks.points.finished);
        assert!(sinks.errors.finished);
    }
}
