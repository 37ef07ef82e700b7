//! Response annotator.
//!
//! Splits a reply into renderable segments. Replies embed station
//! references as `{{STATION_ID:<id>}}` tokens; everything else is text,
//! in which only the `[label](url)` link form is recognized.
//!
//! Token grammar: an opener `{{STATION_ID:` starts a token only when a
//! closing `}}` follows and the payload between them is non-empty and
//! contains neither a line break nor another `{{`. A rejected opener stays
//! literal text and scanning resumes one character later, so a valid token
//! nested behind a broken opener is still found. Annotation is lossless:
//! [`reconstruct`] of the segments always yields the input.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use gridmap_core::StationDirectory;

pub const TOKEN_OPEN: &str = "{{STATION_ID:";
pub const TOKEN_CLOSE: &str = "}}";

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("Invalid link regex"));

/// Format the entity-reference token for a station id.
pub fn entity_token(station_id: &str) -> String {
    format!("{TOKEN_OPEN}{station_id}{TOKEN_CLOSE}")
}

// =============================================================================
// Segment types
// =============================================================================

/// Inline piece of a text line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inline {
    Plain { text: String },
    Link { label: String, url: String },
}

/// Literal text between tokens, pre-split into lines and inline links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSegment {
    /// Exact source text, used for lossless reconstruction.
    pub literal: String,
    /// `literal` split on `\n`; an empty line is an empty list.
    pub lines: Vec<Vec<Inline>>,
}

/// One renderable piece of an annotated reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text(TextSegment),
    EntityAction { station_id: String },
}

impl Segment {
    /// Source text this segment was parsed from.
    pub fn source(&self) -> String {
        match self {
            Segment::Text(text) => text.literal.clone(),
            Segment::EntityAction { station_id } => entity_token(station_id),
        }
    }
}

// =============================================================================
// Tokenizer
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Literal(&'a str),
    Entity(&'a str),
}

/// Next position of a pattern at or after a cursor that only moves forward.
///
/// The last hit is remembered, so a run of rejected openers sharing the
/// same far-away `}}` scans the text once instead of once per opener.
struct Lookahead<'a> {
    text: &'a str,
    find: fn(&str) -> Option<usize>,
    /// `Some(None)` once the pattern is known to be absent from the rest.
    hit: Option<Option<usize>>,
}

impl<'a> Lookahead<'a> {
    fn new(text: &'a str, find: fn(&str) -> Option<usize>) -> Self {
        Self {
            text,
            find,
            hit: None,
        }
    }

    fn next_from(&mut self, from: usize) -> Option<usize> {
        match self.hit {
            Some(Some(pos)) if pos >= from => return Some(pos),
            Some(None) => return None,
            _ => {}
        }
        let pos = (self.find)(&self.text[from..]).map(|offset| from + offset);
        self.hit = Some(pos);
        pos
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;
    let mut closes = Lookahead::new(text, |s| s.find(TOKEN_CLOSE));
    let mut breaks = Lookahead::new(text, |s| s.find(['\n', '\r']));

    while let Some(offset) = text[cursor..].find(TOKEN_OPEN) {
        let open = cursor + offset;
        let payload_start = open + TOKEN_OPEN.len();

        let payload = closes
            .next_from(payload_start)
            .filter(|&close| breaks.next_from(payload_start).map_or(true, |b| b > close))
            .map(|close| &text[payload_start..close])
            .filter(|payload| !payload.is_empty() && !payload.contains("{{"));

        match payload {
            Some(payload) => {
                if open > literal_start {
                    tokens.push(Token::Literal(&text[literal_start..open]));
                }
                tokens.push(Token::Entity(payload));
                cursor = payload_start + payload.len() + TOKEN_CLOSE.len();
                literal_start = cursor;
            }
            // `{` is one byte, so `open + 1` is a char boundary.
            None => cursor = open + 1,
        }
    }

    if literal_start < text.len() {
        tokens.push(Token::Literal(&text[literal_start..]));
    }
    tokens
}

fn parse_line(line: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut last = 0;
    for caps in LINK_PATTERN.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            inlines.push(Inline::Plain {
                text: line[last..whole.start()].to_string(),
            });
        }
        inlines.push(Inline::Link {
            label: caps.get(1).map_or("", |m| m.as_str()).to_string(),
            url: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        });
        last = whole.end();
    }
    if last < line.len() {
        inlines.push(Inline::Plain {
            text: line[last..].to_string(),
        });
    }
    inlines
}

fn text_segment(literal: &str) -> TextSegment {
    TextSegment {
        literal: literal.to_string(),
        lines: literal.split('\n').map(parse_line).collect(),
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Split a reply into text and entity-action segments, in order.
pub fn annotate(text: &str) -> Vec<Segment> {
    tokenize(text)
        .into_iter()
        .map(|token| match token {
            Token::Literal(literal) => Segment::Text(text_segment(literal)),
            Token::Entity(id) => Segment::EntityAction {
                station_id: id.to_string(),
            },
        })
        .collect()
}

/// Rebuild the source text from its segments.
pub fn reconstruct(segments: &[Segment]) -> String {
    segments.iter().map(Segment::source).collect()
}

/// Station ids referenced by an annotated reply, in order of appearance.
pub fn referenced_ids(segments: &[Segment]) -> Vec<&str> {
    segments
        .iter()
        .filter_map(|s| match s {
            Segment::EntityAction { station_id } => Some(station_id.as_str()),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Node handed to the UI for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    /// One line of text with inline links.
    Line { inlines: Vec<Inline> },
    /// Button that selects the station on the map.
    StationAction { station_id: String, label: String },
}

/// Resolve segments against the directory into display nodes.
///
/// Entity actions whose id is not in the directory render as nothing; the
/// text around them is kept.
pub fn render(segments: &[Segment], directory: &StationDirectory) -> Vec<RenderNode> {
    let mut nodes = Vec::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => {
                nodes.extend(text.lines.iter().map(|inlines| RenderNode::Line {
                    inlines: inlines.clone(),
                }));
            }
            Segment::EntityAction { station_id } => match directory.get(station_id) {
                Some(station) => nodes.push(RenderNode::StationAction {
                    station_id: station.id.clone(),
                    label: format!("Ver {} no mapa", station.name),
                }),
                None => {
                    tracing::debug!(station_id = %station_id, "Dropping reference to unknown station");
                }
            },
        }
    }
    nodes
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StationDirectory {
        StationDirectory::builtin().unwrap()
    }

    fn plain(text: &str) -> Inline {
        Inline::Plain {
            text: text.to_string(),
        }
    }

    fn entity_count(segments: &[Segment]) -> usize {
        referenced_ids(segments).len()
    }

    // ---- Entity tokens ----

    #[test]
    fn test_every_station_token_resolves_back() {
        let dir = directory();
        for station in &dir {
            let text = format!("Veja {}", entity_token(&station.id));
            let segments = annotate(&text);
            let ids = referenced_ids(&segments);
            assert_eq!(ids, vec![station.id.as_str()]);
            assert_eq!(dir.get(ids[0]), Some(station));
        }
    }

    #[test]
    fn test_token_only() {
        let segments = annotate("{{STATION_ID:w1}}");
        assert_eq!(
            segments,
            vec![Segment::EntityAction {
                station_id: "w1".to_string()
            }]
        );
    }

    #[test]
    fn test_n_tokens_produce_n_actions_and_round_trip() {
        let text = "A {{STATION_ID:w1}} e B {{STATION_ID:w2}}.\nC {{STATION_ID:e1}}";
        let segments = annotate(text);
        assert_eq!(entity_count(&segments), 3);
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_adjacent_tokens() {
        let segments = annotate("{{STATION_ID:a}}{{STATION_ID:b}}");
        assert_eq!(segments.len(), 2);
        assert_eq!(referenced_ids(&segments), vec!["a", "b"]);
    }

    #[test]
    fn test_unterminated_token_is_literal() {
        let text = "Veja {{STATION_ID:w1 sem fechar";
        let segments = annotate(text);
        assert_eq!(entity_count(&segments), 0);
        assert_eq!(segments.len(), 1);
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_many_unterminated_openers_before_distant_close() {
        let mut text = "{{STATION_ID:x ".repeat(20_000);
        text.push_str("\nfim {{STATION_ID:w1}}");
        let segments = annotate(&text);
        assert_eq!(referenced_ids(&segments), vec!["w1"]);
        assert_eq!(segments.len(), 2);
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_lookahead_reuses_hit_until_passed() {
        let text = "ab}}cd}}";
        let mut closes = Lookahead::new(text, |s| s.find(TOKEN_CLOSE));
        assert_eq!(closes.next_from(0), Some(2));
        assert_eq!(closes.next_from(2), Some(2));
        assert_eq!(closes.next_from(3), Some(6));
        assert_eq!(closes.next_from(7), None);
        assert_eq!(closes.next_from(8), None);
    }

    #[test]
    fn test_empty_payload_is_literal() {
        let segments = annotate("{{STATION_ID:}}");
        assert_eq!(entity_count(&segments), 0);
        assert_eq!(reconstruct(&segments), "{{STATION_ID:}}");
    }

    #[test]
    fn test_payload_with_line_break_is_literal() {
        let text = "{{STATION_ID:w\n1}}";
        let segments = annotate(text);
        assert_eq!(entity_count(&segments), 0);
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_nested_opener_keeps_inner_token() {
        let text = "{{STATION_ID:{{STATION_ID:w1}}";
        let segments = annotate(text);
        assert_eq!(referenced_ids(&segments), vec!["w1"]);
        match &segments[0] {
            Segment::Text(t) => assert_eq!(t.literal, "{{STATION_ID:"),
            other => panic!("expected text, got {other:?}"),
        }
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_ids_with_special_characters() {
        let segments = annotate("{{STATION_ID:etd-são_paulo.01 b}}");
        assert_eq!(referenced_ids(&segments), vec!["etd-são_paulo.01 b"]);
    }

    #[test]
    fn test_trailing_single_brace_after_token() {
        let text = "{{STATION_ID:w1}}}";
        let segments = annotate(text);
        assert_eq!(referenced_ids(&segments), vec!["w1"]);
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_other_placeholder_is_text() {
        let text = "{{OTHER:w1}}";
        let segments = annotate(text);
        assert_eq!(entity_count(&segments), 0);
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_empty_input() {
        assert!(annotate("").is_empty());
        assert_eq!(reconstruct(&[]), "");
    }

    #[test]
    fn test_round_trip_on_assorted_inputs() {
        let inputs = [
            "plain text",
            "linha 1\nlinha 2\n",
            "{{STATION_ID:",
            "}}{{",
            "{{STATION_ID:a}} {{STATION_ID:",
            "Encontrado: [Ver no Mapa](https://maps.google.com/?cid=1)",
            "ação {{STATION_ID:ç}} ünïcödé",
        ];
        for input in inputs {
            assert_eq!(reconstruct(&annotate(input)), input, "input: {input:?}");
        }
    }

    // ---- Text lines and links ----

    #[test]
    fn test_text_split_on_line_breaks() {
        let segments = annotate("um\n\ndois");
        let Segment::Text(text) = &segments[0] else {
            panic!("expected text");
        };
        assert_eq!(text.lines.len(), 3);
        assert_eq!(text.lines[0], vec![plain("um")]);
        assert!(text.lines[1].is_empty());
        assert_eq!(text.lines[2], vec![plain("dois")]);
    }

    #[test]
    fn test_markdown_link_rewritten() {
        let segments = annotate("- Shopping X: [Ver no Mapa](https://maps.example/x) ok");
        let Segment::Text(text) = &segments[0] else {
            panic!("expected text");
        };
        assert_eq!(
            text.lines[0],
            vec![
                plain("- Shopping X: "),
                Inline::Link {
                    label: "Ver no Mapa".to_string(),
                    url: "https://maps.example/x".to_string(),
                },
                plain(" ok"),
            ]
        );
    }

    #[test]
    fn test_other_markdown_left_literal() {
        let segments = annotate("**Encontrado no Google Maps:**");
        let Segment::Text(text) = &segments[0] else {
            panic!("expected text");
        };
        assert_eq!(text.lines[0], vec![plain("**Encontrado no Google Maps:**")]);
    }

    // ---- Rendering ----

    #[test]
    fn test_render_known_station_action() {
        let dir = directory();
        let nodes = render(&annotate("{{STATION_ID:w1}}"), &dir);
        assert_eq!(
            nodes,
            vec![RenderNode::StationAction {
                station_id: "w1".to_string(),
                label: "Ver ETD Barueri no mapa".to_string(),
            }]
        );
    }

    #[test]
    fn test_render_unknown_station_is_dropped() {
        let dir = directory();
        let nodes = render(&annotate("Antes {{STATION_ID:ghost}} depois"), &dir);
        assert_eq!(
            nodes,
            vec![
                RenderNode::Line {
                    inlines: vec![plain("Antes ")]
                },
                RenderNode::Line {
                    inlines: vec![plain(" depois")]
                },
            ]
        );
    }

    #[test]
    fn test_render_serializes_with_kind_tags() {
        let dir = directory();
        let nodes = render(&annotate("Oi {{STATION_ID:w1}}"), &dir);
        let json = serde_json::to_value(&nodes).unwrap();
        assert_eq!(json[0]["kind"], "line");
        assert_eq!(json[0]["inlines"][0]["kind"], "plain");
        assert_eq!(json[1]["kind"], "station_action");
        assert_eq!(json[1]["station_id"], "w1");
    }
}
