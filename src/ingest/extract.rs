/// Station extraction from the NOBIL datadump XML.
///
/// Drives a `TagPathMatcher` over the feed and maps each event's path onto
/// a `Node` of the known schema:
///
/// ```text
/// chargerstations/chargerstation                                   Station
///   metadata/{position,name,owned_by,user_comment}                 Metadata
///   attributes/station/attribute                                   StationAttribute
///     {attrtypeid,attrvalid,trans}                                 StationAttributeField
///   attributes/connectors/connector/attribute                      ConnectorAttribute
///     {attrtypeid,attrvalid,trans}                                 ConnectorAttributeField
/// ```
///
/// Text is collected into a `StationBuilder` while the station element is
/// open. Attribute elements fill a small scratch block that is interpreted
/// when the attribute element closes. When the station element closes the
/// builder is validated and, if the station is public and its position
/// decodes, turned into a `StationRecord`.

use std::io::BufRead;

use crate::analysis::StationStore;
use crate::classify::{classify_connector, classify_operator, classify_station_owner};
use crate::ingest::decode::{decode_capacity, decode_position};
use crate::ingest::tag_path::{names_match, TagEvent, TagPath, TagPathMatcher};
use crate::model::{CapacityRange, ConnectorCounts, Operator, StationRecord};
use crate::registry::{
    ATTR_CAPACITY, ATTR_CONNECTOR_TYPE, ATTR_OPEN_24H, ATTR_PUBLIC, ATTR_VALID_YES,
};

const STATION_PATH: [&str; 2] = ["chargerstations", "chargerstation"];
const STATION_ATTRIBUTE: [&str; 3] = ["attributes", "station", "attribute"];
const CONNECTOR_ATTRIBUTE: [&str; 4] = ["attributes", "connectors", "connector", "attribute"];

// ---------------------------------------------------------------------------
// Schema nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetaField {
    Position,
    Name,
    OwnedBy,
    UserComment,
}

impl MetaField {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "position" => Some(MetaField::Position),
            "name" => Some(MetaField::Name),
            "owned_by" => Some(MetaField::OwnedBy),
            "user_comment" => Some(MetaField::UserComment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrField {
    TypeId,
    Valid,
    Trans,
}

impl AttrField {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "attrtypeid" => Some(AttrField::TypeId),
            "attrvalid" => Some(AttrField::Valid),
            "trans" => Some(AttrField::Trans),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Station,
    Metadata(MetaField),
    StationAttribute,
    StationAttributeField(AttrField),
    ConnectorAttribute,
    ConnectorAttributeField(AttrField),
    Unrelated,
}

fn locate(path: &TagPath) -> Node {
    let names = path.names();
    if path.depth() != names.len() || !path.starts_with(&STATION_PATH) {
        return Node::Unrelated;
    }

    let tail = &names[STATION_PATH.len()..];
    let leaf = tail.last().map(String::as_str).unwrap_or_default();

    if tail.is_empty() {
        Node::Station
    } else if tail.len() == 2 && tail[0] == "metadata" {
        MetaField::from_tag(leaf).map_or(Node::Unrelated, Node::Metadata)
    } else if names_match(tail, &STATION_ATTRIBUTE) {
        Node::StationAttribute
    } else if tail.len() == 4 && names_match(&tail[..3], &STATION_ATTRIBUTE) {
        AttrField::from_tag(leaf).map_or(Node::Unrelated, Node::StationAttributeField)
    } else if names_match(tail, &CONNECTOR_ATTRIBUTE) {
        Node::ConnectorAttribute
    } else if tail.len() == 5 && names_match(&tail[..4], &CONNECTOR_ATTRIBUTE) {
        AttrField::from_tag(leaf).map_or(Node::Unrelated, Node::ConnectorAttributeField)
    } else {
        Node::Unrelated
    }
}

// ---------------------------------------------------------------------------
// Scratch state
// ---------------------------------------------------------------------------

/// The three children of an `attribute` element.
#[derive(Debug, Clone, Default)]
struct AttributeScratch {
    type_id: String,
    valid: String,
    trans: String,
}

impl AttributeScratch {
    fn field_mut(&mut self, field: AttrField) -> &mut String {
        match field {
            AttrField::TypeId => &mut self.type_id,
            AttrField::Valid => &mut self.valid,
            AttrField::Trans => &mut self.trans,
        }
    }

    fn type_id(&self) -> &str {
        self.type_id.trim()
    }

    fn is_set(&self) -> bool {
        self.valid.trim() == ATTR_VALID_YES
    }

    fn trans(&self) -> &str {
        self.trans.trim()
    }
}

/// Why a closed station element produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotPublic,
    BadPosition,
}

/// Everything collected for one station element before it closes.
#[derive(Debug, Clone, Default)]
pub struct StationBuilder {
    position: String,
    name: String,
    owned_by: String,
    user_comment: String,
    public: bool,
    open_24h: bool,
    capacity: CapacityRange,
    connectors: ConnectorCounts,
}

impl StationBuilder {
    fn metadata_mut(&mut self, field: MetaField) -> &mut String {
        match field {
            MetaField::Position => &mut self.position,
            MetaField::Name => &mut self.name,
            MetaField::OwnedBy => &mut self.owned_by,
            MetaField::UserComment => &mut self.user_comment,
        }
    }

    fn apply_station_attribute(&mut self, attr: &AttributeScratch) {
        if !attr.is_set() {
            return;
        }
        match attr.type_id() {
            ATTR_OPEN_24H => self.open_24h = true,
            ATTR_PUBLIC => self.public = true,
            _ => {}
        }
    }

    fn apply_connector_attribute(&mut self, attr: &AttributeScratch) {
        match attr.type_id() {
            ATTR_CAPACITY => self.capacity.fold(decode_capacity(attr.trans())),
            ATTR_CONNECTOR_TYPE => self.connectors.increment(classify_connector(attr.trans())),
            _ => {}
        }
    }

    /// Validates the collected fields and builds the record.
    pub fn build(self) -> Result<StationRecord, Rejection> {
        if !self.public {
            return Err(Rejection::NotPublic);
        }
        let position = decode_position(&self.position).ok_or(Rejection::BadPosition)?;
        let owner = classify_station_owner(&self.owned_by, &self.name, &self.user_comment);
        let title = build_title(owner, &self.name, &self.capacity, &self.connectors, self.open_24h);
        Ok(StationRecord::new(position, title, owner, self.capacity, self.connectors))
    }
}

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// Site name up to the first comma, trimmed.
pub fn strip_name(name: &str) -> &str {
    name.split(',').next().unwrap_or_default().trim()
}

fn heading(owner: Operator, name: &str) -> String {
    let stripped = strip_name(name);
    if stripped.is_empty() {
        return owner.display_name().to_string();
    }
    if !owner.is_known() || classify_operator(stripped).is_known() {
        return stripped.to_string();
    }
    format!("{} {}", owner, stripped)
}

/// Builds the display title, e.g. `"Clever Lysaker 22-50kW CCS:2 TP2:4"`.
pub fn build_title(
    owner: Operator,
    name: &str,
    capacity: &CapacityRange,
    connectors: &ConnectorCounts,
    open_24h: bool,
) -> String {
    let mut title = heading(owner, name);

    if capacity.is_known() {
        let min = capacity.min_kw as i64;
        let max = capacity.max_kw as i64;
        if capacity.min_kw == capacity.max_kw {
            title.push_str(&format!(" {}kW", min));
        } else {
            title.push_str(&format!(" {}-{}kW", min, max));
        }
    }
    for (connector, count) in connectors.present() {
        title.push_str(&format!(" {}:{}", connector.code(), count));
    }
    if !open_24h {
        title.push_str(" not open 24/7");
    }
    title
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Counters describing one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub stations_seen: usize,
    pub accepted: usize,
    pub not_public: usize,
    pub bad_position: usize,
    /// The input ended with elements still open.
    pub truncated: bool,
}

#[derive(Debug, Default)]
pub struct StationExtractor {
    builder: Option<StationBuilder>,
    attribute: AttributeScratch,
    store: StationStore,
    summary: ExtractSummary,
}

impl StationExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one matcher event. `path` is the matcher's path at the time
    /// of the event.
    pub fn handle(&mut self, event: &TagEvent, path: &TagPath) {
        let node = locate(path);
        match event {
            TagEvent::Enter(_) => self.enter(node),
            TagEvent::Text(text) => self.text(node, text),
            TagEvent::Exit => self.exit(node),
        }
    }

    fn enter(&mut self, node: Node) {
        match node {
            Node::Station => self.builder = Some(StationBuilder::default()),
            Node::StationAttribute | Node::ConnectorAttribute => {
                self.attribute = AttributeScratch::default();
            }
            Node::Metadata(field) => {
                if let Some(builder) = self.builder.as_mut() {
                    builder.metadata_mut(field).clear();
                }
            }
            Node::StationAttributeField(field) | Node::ConnectorAttributeField(field) => {
                self.attribute.field_mut(field).clear();
            }
            Node::Unrelated => {}
        }
    }

    fn text(&mut self, node: Node, text: &str) {
        match node {
            Node::Metadata(field) => {
                if let Some(builder) = self.builder.as_mut() {
                    builder.metadata_mut(field).push_str(text);
                }
            }
            Node::StationAttributeField(field) | Node::ConnectorAttributeField(field) => {
                self.attribute.field_mut(field).push_str(text);
            }
            _ => {}
        }
    }

    fn exit(&mut self, node: Node) {
        match node {
            Node::Station => {
                if let Some(builder) = self.builder.take() {
                    self.commit(builder);
                }
            }
            Node::StationAttribute => {
                if let Some(builder) = self.builder.as_mut() {
                    builder.apply_station_attribute(&self.attribute);
                }
            }
            Node::ConnectorAttribute => {
                if let Some(builder) = self.builder.as_mut() {
                    builder.apply_connector_attribute(&self.attribute);
                }
            }
            _ => {}
        }
    }

    fn commit(&mut self, builder: StationBuilder) {
        self.summary.stations_seen += 1;
        match builder.build() {
            Ok(record) => {
                self.summary.accepted += 1;
                self.store.push(record);
            }
            Err(Rejection::NotPublic) => self.summary.not_public += 1,
            Err(Rejection::BadPosition) => self.summary.bad_position += 1,
        }
    }

    /// Consumes every event of `matcher` and returns the completed store.
    pub fn run<R: BufRead>(mut self, mut matcher: TagPathMatcher<R>) -> (StationStore, ExtractSummary) {
        while let Some(event) = matcher.next() {
            self.handle(&event, matcher.path());
        }
        self.summary.truncated = matcher.path().depth() > 0;
        (self.store, self.summary)
    }
}

/// Extracts every public station with a valid position from a feed buffer.
pub fn extract_stations(data: &[u8]) -> (StationStore, ExtractSummary) {
    StationExtractor::new().run(TagPathMatcher::from_bytes(data))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConnectorType;

    fn station_attr(id: &str, valid: &str) -> String {
        format!(
            "<attribute><attrtypeid>{}</attrtypeid><attrvalid>{}</attrvalid><trans>x</trans></attribute>",
            id, valid
        )
    }

    fn connector(kind: &str, power: &str) -> String {
        format!(
            "<connector>\
               <attribute><attrtypeid>4</attrtypeid><attrvalid>1</attrvalid><trans>{}</trans></attribute>\
               <attribute><attrtypeid>5</attrtypeid><attrvalid>1</attrvalid><trans>{}</trans></attribute>\
             </connector>",
            kind, power
        )
    }

    fn station(position: &str, name: &str, owned_by: &str, attrs: &[String], connectors: &[String]) -> String {
        format!(
            "<chargerstation>\
               <metadata><position>{}</position><name>{}</name><owned_by>{}</owned_by></metadata>\
               <attributes><station>{}</station><connectors>{}</connectors></attributes>\
             </chargerstation>",
            position,
            name,
            owned_by,
            attrs.concat(),
            connectors.concat()
        )
    }

    fn feed(stations: &[String]) -> String {
        format!("<?xml version=\"1.0\"?><chargerstations>{}</chargerstations>", stations.concat())
    }

    fn public_24h() -> Vec<String> {
        vec![station_attr("2", "1"), station_attr("24", "1")]
    }

    #[test]
    fn test_public_station_with_valid_position_is_extracted() {
        let xml = feed(&[station(
            "(59.9, 10.7, 0)",
            "Clever, Storgata 1",
            "Clever",
            &public_24h(),
            &[connector("CCS/Combo", "DC 50 kW")],
        )]);
        let (store, summary) = extract_stations(xml.as_bytes());
        assert_eq!(store.len(), 1);
        assert_eq!(summary.accepted, 1);
        let rec = &store.records()[0];
        assert_eq!(rec.title(), "Clever 50kW CCS:1");
        assert_eq!(rec.owner(), Operator::Clever);
        assert_eq!(rec.capacity_max(), 50.0);
        assert!(!summary.truncated);
    }

    #[test]
    fn test_private_station_is_dropped() {
        let xml = feed(&[station(
            "(59.9, 10.7, 0)",
            "Privat",
            "",
            &[station_attr("2", "0"), station_attr("24", "1")],
            &[],
        )]);
        let (store, summary) = extract_stations(xml.as_bytes());
        assert!(store.is_empty());
        assert_eq!(summary.not_public, 1);
    }

    #[test]
    fn test_bad_position_is_dropped() {
        for position in ["(59.9, 10.7)", "(59.9, 10.7, 0) garbage", ""] {
            let xml = feed(&[station(position, "X", "", &public_24h(), &[])]);
            let (store, summary) = extract_stations(xml.as_bytes());
            assert!(store.is_empty(), "position {:?} should be rejected", position);
            assert_eq!(summary.bad_position, 1);
        }
    }

    #[test]
    fn test_capacity_range_and_connector_counts() {
        let xml = feed(&[station(
            "(60.0, 11.0, 0)",
            "Kiwi Jessheim, Storgata",
            "Kiwi",
            &[station_attr("2", "1")],
            &[
                connector("Type 2", "AC 22 kW"),
                connector("Type 2", "AC 22 kW"),
                connector("CCS/Combo", "DC 150 kW"),
                connector("CHAdeMO", "DC 50 kW"),
            ],
        )]);
        let (store, _) = extract_stations(xml.as_bytes());
        let rec = &store.records()[0];
        assert_eq!((rec.capacity_min(), rec.capacity_max()), (22.0, 150.0));
        assert_eq!(rec.connector_counts().get(ConnectorType::Type2), 2);
        assert_eq!(
            rec.title(),
            "Kiwi Jessheim 22-150kW CCS:1 CHA:1 TP2:2 not open 24/7"
        );
    }

    #[test]
    fn test_unknown_attribute_ids_are_ignored() {
        let mut attrs = public_24h();
        attrs.push(station_attr("99", "1"));
        let xml = feed(&[station("(59.0, 10.0, 0)", "Site", "", &attrs, &[])]);
        let (store, _) = extract_stations(xml.as_bytes());
        assert_eq!(store.records()[0].title(), "Site");
    }

    #[test]
    fn test_truncated_feed_keeps_completed_stations() {
        let complete = station("(59.0, 10.0, 0)", "A", "", &public_24h(), &[]);
        let xml = format!("<chargerstations>{}<chargerstation><metadata><position>(1", complete);
        let (store, summary) = extract_stations(xml.as_bytes());
        assert_eq!(store.len(), 1);
        assert!(summary.truncated);
    }

    #[test]
    fn test_connector_attribute_outside_station_schema_is_ignored() {
        // Attribute elements at the wrong depth do not touch the station.
        let xml = feed(&[format!(
            "<chargerstation><metadata><position>(59.0, 10.0, 0)</position></metadata>\
             <attributes><station>{}</station><extra>{}</extra></attributes></chargerstation>",
            public_24h().concat(),
            connector("CCS", "50 kW")
        )]);
        let (store, _) = extract_stations(xml.as_bytes());
        assert_eq!(store.records()[0].connector_mask(), 0);
        assert_eq!(store.records()[0].capacity_max(), 0.0);
    }

    #[test]
    fn test_owner_falls_back_to_user_comment() {
        let xml = feed(&[format!(
            "<chargerstation>\
               <metadata><position>(60.8, 10.7, 0)</position><name>Kiwi Moelv</name>\
                 <owned_by>Kiwi Norge</owned_by><user_comment>Drives av Ionity</user_comment></metadata>\
               <attributes><station>{}</station></attributes>\
             </chargerstation>",
            public_24h().concat()
        )]);
        let (store, _) = extract_stations(xml.as_bytes());
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].owner(), Operator::Ionity);
        assert_eq!(store.records()[0].title(), "Ionity Kiwi Moelv");
    }

    #[test]
    fn test_degenerate_position_is_still_emitted() {
        let xml = feed(&[station("(, , )", "Ukjent", "", &public_24h(), &[])]);
        let (store, summary) = extract_stations(xml.as_bytes());
        assert_eq!(store.len(), 1);
        assert_eq!(summary.bad_position, 0);
        assert!(store.records()[0]
            .gpx_fragment()
            .starts_with("<wpt lat=\"0.000000\" lon=\"0.000000\">"));
    }

    #[test]
    fn test_heading_rules() {
        assert_eq!(heading(Operator::Other, "Rema 1000, Sandvika"), "Rema 1000");
        assert_eq!(heading(Operator::Other, ""), "Other");
        assert_eq!(heading(Operator::Clever, ""), "Clever");
        assert_eq!(heading(Operator::Clever, "Clever Lysaker, Oslo"), "Clever Lysaker");
        assert_eq!(heading(Operator::Clever, "Oslo S, P-hus"), "Clever Oslo S");
    }

    #[test]
    fn test_title_capacity_suffix_truncates() {
        let mut capacity = CapacityRange::default();
        capacity.fold(7.4);
        let title = build_title(Operator::Other, "Hytta", &capacity, &ConnectorCounts::default(), true);
        assert_eq!(title, "Hytta 7kW");
    }

    #[test]
    fn test_strip_name() {
        assert_eq!(strip_name("  Circle K Sinsen , Oslo"), "Circle K Sinsen");
        assert_eq!(strip_name("No comma"), "No comma");
        assert_eq!(strip_name(""), "");
    }
}
