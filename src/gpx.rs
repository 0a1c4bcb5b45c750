//! GeoJSON → GPX 1.1 waypoints with OsmAnd display extensions.
//!
//! Runs on an exported file rather than in the fetch pipeline, so it reads
//! features loosely: anything that is not a point is skipped.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};
use tracing::{info, warn};

pub const DEFAULT_TITLE: &str = "Livres";

const CREATOR: &str = "bookcase_scraper";
const ICON: &str = "public_bookcase";
const BACKGROUND: &str = "square";
const COLOR: &str = "#ff5020";

/// Convert `input` and write it to `output` (default: same stem, `.gpx`).
/// Returns the written path and the number of waypoints.
pub fn convert(input: &Path, output: Option<&Path>, title: &str) -> Result<(PathBuf, usize)> {
    info!("Converting {}...", input.display());
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let geo: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let (xml, count) = to_gpx(&geo, title)?;

    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("gpx"));
    std::fs::write(&out, xml).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok((out, count))
}

/// Render a FeatureCollection as a GPX document.
pub fn to_gpx(geo: &Value, title: &str) -> Result<(String, usize)> {
    let Some(features) = geo.get("features").and_then(Value::as_array) else {
        bail!("not a FeatureCollection: no \"features\" array");
    };

    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    w.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", CREATOR),
        ("xmlns", "http://www.topografix.com/GPX/1/1"),
        ("xmlns:osmand", "https://osmand.net"),
        ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        (
            "xsi:schemaLocation",
            "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd",
        ),
    ])))?;

    let mut count = 0;
    for (i, feature) in features.iter().enumerate() {
        let Some(wpt) = Waypoint::from_feature(feature) else {
            warn!("Skipping feature {}: no point geometry", i);
            continue;
        };
        wpt.write(&mut w, title)?;
        count += 1;
    }

    w.write_event(Event::Start(BytesStart::new("extensions")))?;
    w.write_event(Event::Start(BytesStart::new("osmand:points_groups")))?;
    w.write_event(Event::Empty(BytesStart::new("group").with_attributes([
        ("name", title),
        ("color", COLOR),
        ("icon", ICON),
        ("background", BACKGROUND),
    ])))?;
    w.write_event(Event::End(BytesEnd::new("osmand:points_groups")))?;
    w.write_event(Event::End(BytesEnd::new("extensions")))?;
    w.write_event(Event::End(BytesEnd::new("gpx")))?;

    let mut xml = String::from_utf8(w.into_inner())?;
    xml.push('\n');
    Ok((xml, count))
}

#[derive(Debug, PartialEq)]
struct Waypoint {
    lat: f64,
    lon: f64,
    time: Option<String>,
    name: String,
    desc: Option<String>,
    address: String,
}

impl Waypoint {
    fn from_feature(feature: &Value) -> Option<Self> {
        let geometry = feature.get("geometry")?;
        if geometry.get("type")?.as_str()? != "Point" {
            return None;
        }
        let coords = geometry.get("coordinates")?.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;

        let empty = Map::new();
        let p = feature
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let name = [
            prop(p, "id").map(|id| format!("b{id}")),
            prop(p, "note"),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

        Some(Self {
            lat,
            lon,
            time: prop(p, "updated").or_else(|| prop(p, "created")),
            name: clean(&name),
            desc: prop(p, "html"),
            address: address(p),
        })
    }

    fn write(&self, w: &mut Writer<Vec<u8>>, title: &str) -> Result<()> {
        let lat = self.lat.to_string();
        let lon = self.lon.to_string();
        w.write_event(Event::Start(
            BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
        ))?;
        if let Some(time) = &self.time {
            text_element(w, "time", time)?;
        }
        text_element(w, "name", &self.name)?;
        if let Some(desc) = &self.desc {
            text_element(w, "desc", desc)?;
        }
        text_element(w, "type", title)?;

        w.write_event(Event::Start(BytesStart::new("extensions")))?;
        if !self.address.is_empty() {
            text_element(w, "osmand:address", &self.address)?;
        }
        text_element(w, "osmand:icon", ICON)?;
        text_element(w, "osmand:background", BACKGROUND)?;
        text_element(w, "osmand:color", COLOR)?;
        w.write_event(Event::End(BytesEnd::new("extensions")))?;
        w.write_event(Event::End(BytesEnd::new("wpt")))?;
        Ok(())
    }
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// "street, zip city, country", skipping missing parts.
fn address(p: &Map<String, Value>) -> String {
    let locality = [prop(p, "addr:zipcode"), prop(p, "addr:city")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    [prop(p, "addr:street"), Some(locality), prop(p, "addr:country")]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// String or number property, whitespace collapsed; `None` when blank.
fn prop(p: &Map<String, Value>, key: &str) -> Option<String> {
    let raw = match p.get(key)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Some(clean(&raw)).filter(|s| !s.is_empty())
}

fn clean(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [2.35, 48.85] },
                    "properties": {
                        "id": 310,
                        "note": "  Boîte   près de\nla mairie ",
                        "created": "2021-06-01",
                        "updated": "2023-02-11",
                        "addr:street": "1 rue de Rivoli",
                        "addr:zipcode": "75001",
                        "addr:city": "Paris",
                        "addr:country": "France"
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
                    "properties": {}
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-0.58, 44.84] },
                    "properties": { "id": "7", "html": "<b>Quai & port</b>" }
                }
            ]
        })
    }

    #[test]
    fn waypoint_fields() {
        let geo = collection();
        let w = Waypoint::from_feature(&geo["features"][0]).unwrap();
        assert_eq!(w.lat, 48.85);
        assert_eq!(w.lon, 2.35);
        assert_eq!(w.time.as_deref(), Some("2023-02-11"));
        assert_eq!(w.name, "b310 Boîte près de la mairie");
        assert_eq!(w.address, "1 rue de Rivoli, 75001 Paris, France");
        assert_eq!(w.desc, None);
    }

    #[test]
    fn sparse_properties() {
        let geo = collection();
        let w = Waypoint::from_feature(&geo["features"][2]).unwrap();
        assert_eq!(w.name, "b7");
        assert_eq!(w.time, None);
        assert_eq!(w.address, "");
        assert_eq!(w.desc.as_deref(), Some("<b>Quai & port</b>"));
    }

    #[test]
    fn document() {
        let (xml, count) = to_gpx(&collection(), DEFAULT_TITLE).unwrap();
        assert_eq!(count, 2);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(xml.contains("<wpt lat=\"48.85\" lon=\"2.35\">"));
        assert!(xml.contains("<wpt lat=\"44.84\" lon=\"-0.58\">"));
        assert!(xml.contains("<osmand:address>1 rue de Rivoli, 75001 Paris, France</osmand:address>"));
        assert!(xml.contains("<desc>&lt;b&gt;Quai &amp; port&lt;/b&gt;</desc>"));
        assert!(xml.contains("<type>Livres</type>"));
        assert!(xml.contains(
            "<group name=\"Livres\" color=\"#ff5020\" icon=\"public_bookcase\" background=\"square\"/>"
        ));
        assert!(xml.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn rejects_non_collection() {
        assert!(to_gpx(&json!({ "type": "Feature" }), DEFAULT_TITLE).is_err());
    }

    #[test]
    fn convert_writes_next_to_input() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("bookcases.geojson");
        std::fs::write(&input, collection().to_string()).unwrap();

        let (out, count) = convert(&input, None, "Livres Bretagne").unwrap();
        assert_eq!(out, tmp.path().join("bookcases.gpx"));
        assert_eq!(count, 2);
        let xml = std::fs::read_to_string(out).unwrap();
        assert!(xml.contains("<type>Livres Bretagne</type>"));
    }
}
