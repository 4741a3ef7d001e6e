/// Streaming tag-path walker over an XML byte stream.
///
/// Turns the tokenizer's output into a flat sequence of `Enter`, `Text` and
/// `Exit` events while tracking the path of lower-cased element names from
/// the root. The matcher knows nothing about the NOBIL schema; callers
/// inspect `path()` after each event.
///
/// The path keeps at most `MAX_TAG_DEPTH` names. Deeper elements still count
/// towards `depth()` so the stack stays balanced, but their names are not
/// retained, which bounds memory whatever the input looks like.
///
/// Malformed input ends the sequence early. No error is reported: the
/// events produced before the bad markup stand, and callers should treat the
/// result as possibly incomplete.

use std::io::BufRead;
use std::iter::FusedIterator;

use quick_xml::events::Event;
use quick_xml::Reader;

/// Maximum number of element names retained in a `TagPath`.
pub const MAX_TAG_DEPTH: usize = 32;

// ---------------------------------------------------------------------------
// Path stack
// ---------------------------------------------------------------------------

/// True when `names` is exactly `expected`.
pub fn names_match(names: &[String], expected: &[&str]) -> bool {
    names.len() == expected.len() && names.iter().zip(expected).all(|(a, b)| a == b)
}

/// Bounded stack of enclosing element names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPath {
    names: Vec<String>,
    depth: usize,
}

impl TagPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str) {
        if self.depth < MAX_TAG_DEPTH {
            self.names.push(name.to_lowercase());
        }
        self.depth += 1;
    }

    pub fn pop(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        if self.depth < MAX_TAG_DEPTH {
            self.names.pop();
        }
    }

    /// Number of currently open elements, including unnamed deep ones.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Retained names, root first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True when the open elements are exactly `expected`, root first.
    pub fn is_at(&self, expected: &[&str]) -> bool {
        self.depth == expected.len() && names_match(&self.names, expected)
    }

    /// True when the first `prefix.len()` open elements are `prefix`.
    pub fn starts_with(&self, prefix: &[&str]) -> bool {
        self.names.len() >= prefix.len() && names_match(&self.names[..prefix.len()], prefix)
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// An element opened; carries its lower-cased local name. The path
    /// already includes it.
    Enter(String),
    /// Character data (entities decoded, CDATA passed through) inside the
    /// element at the top of the path.
    Text(String),
    /// The element at the top of the path closed. The path still includes
    /// it until the next event is requested.
    Exit,
}

pub struct TagPathMatcher<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    path: TagPath,
    pop_pending: bool,
    exit_pending: bool,
    finished: bool,
}

impl<'a> TagPathMatcher<&'a [u8]> {
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<R: BufRead> TagPathMatcher<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        TagPathMatcher {
            reader,
            buf: Vec::new(),
            path: TagPath::new(),
            pop_pending: false,
            exit_pending: false,
            finished: false,
        }
    }

    pub fn path(&self) -> &TagPath {
        &self.path
    }
}

impl<R: BufRead> Iterator for TagPathMatcher<R> {
    type Item = TagEvent;

    fn next(&mut self) -> Option<TagEvent> {
        if self.pop_pending {
            self.path.pop();
            self.pop_pending = false;
        }
        if self.exit_pending {
            self.exit_pending = false;
            self.pop_pending = true;
            return Some(TagEvent::Exit);
        }
        if self.finished {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(_) => {
                    self.finished = true;
                    return None;
                }
            };

            match event {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                    self.path.push(&name);
                    return Some(TagEvent::Enter(name));
                }
                Event::Empty(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                    self.path.push(&name);
                    self.exit_pending = true;
                    return Some(TagEvent::Enter(name));
                }
                Event::End(_) => {
                    if self.path.depth() == 0 {
                        continue;
                    }
                    self.pop_pending = true;
                    return Some(TagEvent::Exit);
                }
                Event::Text(e) => match e.unescape() {
                    Ok(text) => return Some(TagEvent::Text(text.into_owned())),
                    Err(_) => {
                        self.finished = true;
                        return None;
                    }
                },
                Event::CData(e) => {
                    return Some(TagEvent::Text(String::from_utf8_lossy(&e).into_owned()));
                }
                Event::Eof => {
                    self.finished = true;
                    return None;
                }
                _ => continue,
            }
        }
    }
}

impl<R: BufRead> FusedIterator for TagPathMatcher<R> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn enter(name: &str) -> TagEvent {
        TagEvent::Enter(name.to_string())
    }

    fn text(value: &str) -> TagEvent {
        TagEvent::Text(value.to_string())
    }

    fn collect(xml: &str) -> Vec<TagEvent> {
        TagPathMatcher::from_bytes(xml.as_bytes()).collect()
    }

    #[test]
    fn test_events_for_simple_document() {
        let events = collect("<Root><Item>hello</Item></Root>");
        assert_eq!(
            events,
            vec![enter("root"), enter("item"), text("hello"), TagEvent::Exit, TagEvent::Exit]
        );
    }

    #[test]
    fn test_path_still_holds_element_during_exit() {
        let mut matcher = TagPathMatcher::from_bytes(b"<a><b></b></a>".as_slice());
        assert_eq!(matcher.next(), Some(enter("a")));
        assert_eq!(matcher.next(), Some(enter("b")));
        assert!(matcher.path().is_at(&["a", "b"]));
        assert_eq!(matcher.next(), Some(TagEvent::Exit));
        assert!(matcher.path().is_at(&["a", "b"]), "b is popped lazily");
        assert_eq!(matcher.next(), Some(TagEvent::Exit));
        assert!(matcher.path().is_at(&["a"]));
        assert_eq!(matcher.next(), None);
        assert_eq!(matcher.path().depth(), 0);
    }

    #[test]
    fn test_self_closing_element_enters_and_exits() {
        let events = collect("<a><b/></a>");
        assert_eq!(
            events,
            vec![enter("a"), enter("b"), TagEvent::Exit, TagEvent::Exit]
        );
    }

    #[test]
    fn test_entities_are_decoded_and_namespaces_dropped() {
        let events = collect("<ns:a xmlns:ns=\"urn:x\">Fish &amp; Chips</ns:a>");
        assert_eq!(events, vec![enter("a"), text("Fish & Chips"), TagEvent::Exit]);
    }

    #[test]
    fn test_whitespace_only_text_is_skipped() {
        let events = collect("<a>\n  <b> x </b>\n</a>");
        assert_eq!(
            events,
            vec![enter("a"), enter("b"), text("x"), TagEvent::Exit, TagEvent::Exit]
        );
    }

    #[test]
    fn test_depth_beyond_limit_is_counted_but_not_named() {
        let levels = MAX_TAG_DEPTH + 8;
        let mut xml = String::new();
        for i in 0..levels {
            xml.push_str(&format!("<e{}>", i));
        }
        for i in (0..levels).rev() {
            xml.push_str(&format!("</e{}>", i));
        }

        let mut matcher = TagPathMatcher::from_bytes(xml.as_bytes());
        let mut max_depth = 0;
        let mut max_names = 0;
        while let Some(_) = matcher.next() {
            max_depth = max_depth.max(matcher.path().depth());
            max_names = max_names.max(matcher.path().names().len());
        }
        assert_eq!(max_depth, levels);
        assert_eq!(max_names, MAX_TAG_DEPTH);
        assert_eq!(matcher.path().depth(), 0, "stack must be balanced at the end");
    }

    #[test]
    fn test_malformed_input_truncates_silently() {
        let events = collect("<a><b>text</c></a>");
        assert_eq!(events, vec![enter("a"), enter("b"), text("text")]);
    }

    #[test]
    fn test_matcher_is_fused_after_end() {
        let mut matcher = TagPathMatcher::from_bytes(b"<a/>".as_slice());
        assert_eq!(matcher.next(), Some(enter("a")));
        assert_eq!(matcher.next(), Some(TagEvent::Exit));
        assert_eq!(matcher.next(), None);
        assert_eq!(matcher.next(), None);
        assert_eq!(matcher.path().depth(), 0);
    }

    #[test]
    fn test_tag_path_helpers() {
        let mut path = TagPath::new();
        path.push("ChargerStations");
        path.push("chargerstation");
        assert!(path.is_at(&["chargerstations", "chargerstation"]));
        assert!(path.starts_with(&["chargerstations"]));
        assert!(!path.is_at(&["chargerstations"]));
        assert_eq!(path.names().last().map(String::as_str), Some("chargerstation"));
        path.pop();
        path.pop();
        path.pop();
        assert_eq!(path.depth(), 0);
        assert!(path.names().is_empty());
    }
}
