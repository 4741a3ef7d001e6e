/// GPX 1.1 rendering.

use quick_xml::escape::escape;

use crate::analysis::{MaskFilter, Population, StationStore};
use crate::export::operator_summary_comment;
use crate::model::GeoPoint;

pub const GPX_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
    "<gpx xmlns=\"http://www.topografix.com/GPX/1/1\" ",
    "xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" ",
    "xsi:schemaLocation=\"http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd\" ",
    "version=\"1.1\" ",
    "creator=\"nobil_service - datagrunnlaget er hentet fra http://nobil.no\">"
);

pub const GPX_FOOTER: &str = "</gpx>";

/// One `<wpt>` element for a station.
pub fn render_waypoint(position: GeoPoint, title: &str) -> String {
    format!(
        "<wpt lat=\"{:.6}\" lon=\"{:.6}\"><name>{}</name></wpt>",
        position.lat,
        position.lon,
        escape(title)
    )
}

/// Complete GPX document with every record passing `filter`, followed by a
/// per-operator count of the exported records.
pub fn render_gpx(store: &StationStore, filter: MaskFilter) -> String {
    let mut out = String::from(GPX_HEADER);
    for record in store.filter(filter) {
        out.push_str(record.gpx_fragment());
    }
    out.push_str(GPX_FOOTER);
    out.push_str(&operator_summary_comment(&Population::count(store.filter(filter))));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_escapes_title() {
        let wpt = render_waypoint(GeoPoint { lat: 59.5, lon: 10.25 }, "Fish & Chips <24h>");
        assert_eq!(
            wpt,
            "<wpt lat=\"59.500000\" lon=\"10.250000\"><name>Fish &amp; Chips &lt;24h&gt;</name></wpt>"
        );
    }

    #[test]
    fn test_empty_store_renders_envelope_and_zero_counts() {
        let gpx = render_gpx(&StationStore::new(), MaskFilter::all());
        assert!(gpx.starts_with(GPX_HEADER));
        assert!(gpx.contains("</gpx><!-- "));
        assert!(!gpx.contains("<wpt"));
        assert!(gpx.contains("Clever:0"));
    }
}
