use std::time::{Duration, Instant};

use crate::element::{Element, ElementKind};
use crate::output::SinkError;
use crate::xml::Handler;

/// Wraps a [Handler] and measures how long closing each element kind takes
///
/// Start, tag and ref events are forwarded unmeasured; all the real work
/// happens on element end.
pub struct Timer<H: Handler> {
    handler: H,
    nodes: (u32, Duration),
    ways: (u32, Duration),
    relations: (u32, Duration),
}

impl<H: Handler> Timer<H> {
    pub fn wrap(handler: H) -> Self {
        Timer {
            handler,
            nodes: (0, Duration::default()),
            ways: (0, Duration::default()),
            relations: (0, Duration::default()),
        }
    }

    pub fn print(&self) {
        for (name, (count, total)) in [
            ("nodes", self.nodes),
            ("ways", self.ways),
            ("relations", self.relations),
        ] {
            if count > 0 {
                eprintln!(
                    "{count} {name} took {total:?} to process at {:?} each",
                    total / count
                );
            } else {
                eprintln!("0 {name}");
            }
        }
    }

    pub fn unwrap(self) -> H {
        self.handler
    }

    fn slot(&mut self, kind: ElementKind) -> &mut (u32, Duration) {
        match kind {
            ElementKind::Node => &mut self.nodes,
            ElementKind::Way => &mut self.ways,
            ElementKind::Relation => &mut self.relations,
        }
    }
}

impl<H: Handler> Handler for Timer<H> {
    fn element_start(&mut self, element: Element) {
        self.handler.element_start(element);
    }

    fn child_tag(&mut self, key: String, value: String) {
        self.handler.child_tag(key, value);
    }

    fn child_node_ref(&mut self, node_ref: &str) {
        self.handler.child_node_ref(node_ref);
    }

    fn element_end(&mut self, kind: ElementKind) -> Result<(), SinkError> {
        let now = Instant::now();
        let result = self.handler.element_end(kind);
        let elapsed = now.elapsed();
        let slot = self.slot(kind);
        slot.0 += 1;
        slot.1 += elapsed;
        result
    }

    fn document_end(&mut self) -> Result<(), SinkError> {
        self.handler.document_end()
    }
}
