//! Construction of the records written for an evaluated element

use serde::Serialize;

use crate::completeness::Completeness;
use crate::element::{Element, ElementKind, LonLat, TagMap};

/// Site the popup links point at
pub const BROWSE_URL: &str = "https://www.openstreetmap.org";

/// Pick the tier color for a completeness percentage
pub fn completeness_color(percentage: u8) -> &'static str {
    if percentage == 100 {
        "#00840d"
    } else if percentage >= 75 {
        "#faff00"
    } else if percentage >= 50 {
        "#ffe500"
    } else if percentage >= 25 {
        "#FD9A08"
    } else {
        "#ff0000"
    }
}

/// Record written to the features sink
#[derive(Serialize, Debug, PartialEq)]
pub struct Feature {
    #[serde(rename = "type")]
    pub ty: &'static str,
    pub geometry: Geometry,
    pub properties: Properties,
    pub id: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(LonLat),
    Polygon(Vec<Vec<LonLat>>),
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Properties {
    pub completeness_color: &'static str,
    pub popup: String,
}

/// Record written to the points sink: `[lat, lon, color, popup]`
pub type PointRecord = (f64, f64, &'static str, String);

/// Record written to the errors sink for one element's errors or warnings
#[derive(Serialize, Debug, PartialEq)]
pub struct Finding {
    pub status: Severity,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub id: String,
    pub date: String,
    pub comment: String,
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Finding {
    pub fn new(element: &Element, status: Severity, messages: &[String]) -> Self {
        Finding {
            status,
            kind: element.kind,
            id: element.id.clone(),
            date: element.timestamp.clone(),
            comment: messages.join(", "),
        }
    }
}

/// Build the feature record for an element, if its kind produces one
///
/// Nodes become a `Point`, ways a `Polygon` with their resolved ring as the
/// single ring. Relations have no geometry and yield no record.
pub fn feature(element: &Element, tags: &TagMap, completeness: &Completeness) -> Option<Feature> {
    let geometry = match element.kind {
        ElementKind::Node => Geometry::Point(element.coordinate?),
        ElementKind::Way => Geometry::Polygon(vec![element.geometry.clone()]),
        ElementKind::Relation => return None,
    };
    Some(Feature {
        ty: "Feature",
        geometry,
        properties: Properties {
            completeness_color: completeness_color(completeness.percentage),
            popup: popup_html(element, tags, completeness),
        },
        id: element.id.clone(),
    })
}

/// Build the point record, which only exists for nodes
pub fn point(element: &Element, tags: &TagMap, completeness: &Completeness) -> Option<PointRecord> {
    let [lon, lat] = element.coordinate?;
    Some((
        lat,
        lon,
        completeness_color(completeness.percentage),
        popup_html(element, tags, completeness),
    ))
}

/// Render the popup body shown when a feature or point is clicked
///
/// Section order is fixed: browse link, kind, errors, warnings, one line per
/// tag, percentage.
pub fn popup_html(element: &Element, tags: &TagMap, completeness: &Completeness) -> String {
    let url = format!("{BROWSE_URL}/{}/{}", element.kind, element.id);

    let mut content = format!("<a href=\"{url}\" target=\"_blank\">{url}</a><br />");
    content.push_str(&format!("<b>type</b> : {}<br />", element.kind));

    if !completeness.errors.is_empty() {
        content.push_str(&format!(
            "<div style='color:red'><b>errors</b> : {}</div>",
            completeness.errors.join(", ")
        ));
    }
    if !completeness.warnings.is_empty() {
        content.push_str(&format!(
            "<div style='color:orange'><b>warnings</b> : {}</div>",
            completeness.warnings.join(", ")
        ));
    }

    let tags: Vec<String> = tags
        .iter()
        .map(|(key, value)| format!("<b>{key}</b> : {value}"))
        .collect();
    content.push_str(&format!("{}<br />", tags.join("<br />")));

    content.push_str(&format!(
        "<b>completeness</b> : {}%",
        completeness.percentage
    ));
    content
}
