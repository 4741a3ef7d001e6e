/// KML 2.2 rendering.
///
/// Every placemark refers to the `#charger` style map, which pairs a normal
/// and a highlighted icon style. The icon image is chosen per document.

use quick_xml::escape::escape;

use crate::analysis::{MaskFilter, Population, StationStore};
use crate::export::operator_summary_comment;
use crate::model::GeoPoint;

/// Selectable placemark icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmlIcon {
    pub label: &'static str,
    pub href: &'static str,
}

/// Icons offered by the script export; the first is the default.
pub static KML_ICONS: &[KmlIcon] = &[
    KmlIcon {
        label: "Yellow pushpin",
        href: "https://maps.google.com/mapfiles/kml/pushpin/ylw-pushpin.png",
    },
    KmlIcon {
        label: "Green circle",
        href: "https://maps.google.com/mapfiles/kml/paddle/grn-circle.png",
    },
];

pub const KML_FOOTER: &str = "</Document></kml>";

/// Document header with the two icon styles and the style map.
pub fn kml_header(icon: &KmlIcon) -> String {
    let href = escape(icon.href);
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<kml xmlns=\"http://www.opengis.net/kml/2.2\"><Document>",
            "<name>EV charger stations</name>",
            "<description>Datagrunnlaget er hentet fra http://nobil.no</description>",
            "<Style id=\"charger_normal\"><IconStyle><scale>1.0</scale>",
            "<Icon><href>{href}</href></Icon></IconStyle>",
            "<LabelStyle><scale>0</scale></LabelStyle></Style>",
            "<Style id=\"charger_highlight\"><IconStyle><scale>1.3</scale>",
            "<Icon><href>{href}</href></Icon></IconStyle>",
            "<LabelStyle><scale>1</scale></LabelStyle></Style>",
            "<StyleMap id=\"charger\">",
            "<Pair><key>normal</key><styleUrl>#charger_normal</styleUrl></Pair>",
            "<Pair><key>highlight</key><styleUrl>#charger_highlight</styleUrl></Pair>",
            "</StyleMap>"
        ),
        href = href
    )
}

/// One `<Placemark>` element for a station. KML puts longitude first.
pub fn render_placemark(position: GeoPoint, title: &str) -> String {
    format!(
        "<Placemark><name>{}</name><styleUrl>#charger</styleUrl>\
         <Point><coordinates>{:.6},{:.6},0</coordinates></Point></Placemark>",
        escape(title),
        position.lon,
        position.lat
    )
}

/// Complete KML document with every record passing `filter`.
pub fn render_kml(store: &StationStore, filter: MaskFilter, icon: &KmlIcon) -> String {
    let mut out = kml_header(icon);
    for record in store.filter(filter) {
        out.push_str(record.kml_fragment());
    }
    out.push_str(KML_FOOTER);
    out.push_str(&operator_summary_comment(&Population::count(store.filter(filter))));
    out
}
