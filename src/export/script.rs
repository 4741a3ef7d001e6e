/// Self-filtering browser script export.
///
/// The script embeds every station once and lets the visitor narrow the
/// selection by operator, power tier and connector type, then download a
/// GPX or KML file assembled in the browser. Records are written in runs of
/// equal mask tuples, each run behind one guard such as
///
/// ```text
/// if ((nobil_owner_mask & 16) && (nobil_power_mask & 4) && (nobil_type_mask & 1)) {
/// ```
///
/// All markup (station fragments, document envelopes, the filter form) is
/// written as arrays of UTF-8 byte values rather than string literals, so no
/// title can break out of the script's quoting.

use crate::analysis::{Population, StationStore};
use crate::export::gpx::{GPX_FOOTER, GPX_HEADER};
use crate::export::kml::{kml_header, KML_FOOTER, KML_ICONS};
use crate::model::{all_power_mask, ConnectorType, Operator};
use crate::registry::POWER_TIERS;

/// `[60,119,112,116]`-style byte array literal.
pub fn byte_array(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 4 + 2);
    out.push('[');
    for (i, byte) in text.bytes().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&byte.to_string());
    }
    out.push(']');
    out
}

fn checkbox(toggle: &str, bit: u32, label: &str, count: usize) -> String {
    format!(
        "<input type=\"checkbox\" checked=\"checked\" onchange=\"{}({}, this.checked)\" /> {} ({})<br>",
        toggle, bit, label, count
    )
}

/// Filter form: one checkbox per classification value with its population,
/// the icon choice and the two download buttons.
fn form_markup(population: &Population) -> String {
    let mut html = String::from("<form id=\"nobil_form\"><table style=\"width:100%\"><tr>");

    html.push_str("<th><div align=\"left\">");
    for (i, tier) in POWER_TIERS.iter().enumerate() {
        html.push_str(&checkbox("nobil_toggle_power", 1 << i, tier.label, population.power_tiers[i]));
    }
    html.push_str("</div></th>");

    html.push_str("<th><div align=\"left\">");
    for op in Operator::ALL {
        html.push_str(&checkbox("nobil_toggle_owner", op.bit(), op.display_name(), population.operator(op)));
    }
    html.push_str("</div></th>");

    html.push_str("<th><div align=\"left\">");
    for ty in ConnectorType::ALL {
        html.push_str(&checkbox("nobil_toggle_type", ty.bit(), ty.label(), population.connector(ty)));
    }
    html.push_str("</div></th>");

    html.push_str("<th><div align=\"left\">");
    for (i, icon) in KML_ICONS.iter().enumerate() {
        let checked = if i == 0 { " checked=\"checked\"" } else { "" };
        html.push_str(&format!(
            "<input type=\"radio\" name=\"nobil_icon\" value=\"{i}\"{checked} onchange=\"nobil_select_icon({i})\" /> {}<br>",
            icon.label
        ));
    }
    html.push_str("</div></th>");

    html.push_str("</tr></table><br>");
    html.push_str("<button type=\"button\" onclick=\"nobil_download(false)\">Download GPX</button> ");
    html.push_str("<button type=\"button\" onclick=\"nobil_download(true)\">Download KML</button><br>");
    html.push_str(&format!("{} stations<br>", population.total));
    html.push_str("</form>");
    html
}

const RUNTIME: &str = r#"function nobil_text(b) {
return new TextDecoder("utf-8").decode(new Uint8Array(b));
}
function nobil_toggle_owner(bit, on) {
nobil_owner_mask = on ? (nobil_owner_mask | bit) : (nobil_owner_mask & ~bit);
}
function nobil_toggle_power(bit, on) {
nobil_power_mask = on ? (nobil_power_mask | bit) : (nobil_power_mask & ~bit);
}
function nobil_toggle_type(bit, on) {
nobil_type_mask = on ? (nobil_type_mask | bit) : (nobil_type_mask & ~bit);
}
function nobil_select_icon(index) {
nobil_icon = index;
}
function nobil_emit(parts, kml, gpx_bytes, kml_bytes) {
parts.push(new Uint8Array(kml ? kml_bytes : gpx_bytes));
}
function nobil_download(kml) {
var parts = [];
parts.push(new Uint8Array(kml ? nobil_kml_head[nobil_icon] : nobil_gpx_head));
nobil_collect(parts, kml);
parts.push(new Uint8Array(kml ? nobil_kml_tail : nobil_gpx_tail));
var blob = new Blob(parts, {type: kml ? "application/vnd.google-earth.kml+xml" : "application/gpx+xml"});
var link = document.createElement("a");
link.href = URL.createObjectURL(blob);
link.download = nobil_file_name + (kml ? ".kml" : ".gpx");
document.body.appendChild(link);
link.click();
document.body.removeChild(link);
URL.revokeObjectURL(link.href);
}
"#;

/// Renders the script for a store that has been sorted with
/// `StationStore::sort_by_masks`; an unsorted store still works but repeats
/// guards for tuples that are not adjacent.
///
/// `file_name` is the base name of downloaded files.
pub fn render_script(store: &StationStore, file_name: &str) -> String {
    let population = store.population();
    let mut js = String::new();

    js.push_str("// EV charger stations; datagrunnlaget er hentet fra http://nobil.no\n");
    js.push_str(&format!("var nobil_owner_mask = {};\n", Operator::ALL_MASK));
    js.push_str(&format!("var nobil_power_mask = {};\n", all_power_mask()));
    js.push_str(&format!("var nobil_type_mask = {};\n", ConnectorType::ALL_MASK));
    js.push_str("var nobil_icon = 0;\n");
    js.push_str(&format!("var nobil_file_name = nobil_text({});\n", byte_array(file_name)));
    js.push_str(RUNTIME);

    js.push_str(&format!("var nobil_gpx_head = {};\n", byte_array(GPX_HEADER)));
    js.push_str(&format!("var nobil_gpx_tail = {};\n", byte_array(GPX_FOOTER)));
    let kml_heads: Vec<String> = KML_ICONS
        .iter()
        .map(|icon| byte_array(&kml_header(icon)))
        .collect();
    js.push_str(&format!("var nobil_kml_head = [{}];\n", kml_heads.join(",")));
    js.push_str(&format!("var nobil_kml_tail = {};\n", byte_array(KML_FOOTER)));

    js.push_str("function nobil_collect(parts, kml) {\n");
    for run in store.runs() {
        js.push_str(&format!(
            "if ((nobil_owner_mask & {}) && (nobil_power_mask & {}) && (nobil_type_mask & {})) {{\n",
            run.owner_mask, run.power_mask, run.connector_mask
        ));
        for record in run.records {
            js.push_str(&format!(
                "nobil_emit(parts, kml, {}, {});\n",
                byte_array(record.gpx_fragment()),
                byte_array(record.kml_fragment())
            ));
        }
        js.push_str("}\n");
    }
    js.push_str("}\n");

    js.push_str(&format!("document.write(nobil_text({}));\n", byte_array(&form_markup(&population))));
    js
}
