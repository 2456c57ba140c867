//! HTML tokenizing using html5ever
//!
//! Only the html5ever *tokenizer* is used. Tokens are folded into a
//! [`Markup`] tree by a small stack machine instead of the HTML5 tree builder,
//! so nothing is implied, reparented or reordered.
//!
//! Tokens carry decoded values only, so the sink also walks the source in
//! step with them and records where each tag, comment, doctype and text run
//! came from. That is what lets untouched markup serialize byte for byte.

use std::cell::RefCell;
use std::ops::Range;

use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tendril::StrTendril;
use tracing::{debug, instrument, trace};

use crate::is_void_element;
use crate::tree::{Attribute, ElementData, Markup, MarkupId, MarkupKind};

/// Parses `html` into a [`Markup`] tree.
///
/// Malformed markup is recovered from the way the tokenizer recovers: stray
/// end tags are ignored and unclosed elements are closed at the end of input.
#[instrument(skip(html), fields(bytes = html.len()))]
pub fn parse(html: &str) -> Markup {
    let state = RefCell::new(TreeState::new(html));

    {
        let sink = TreeSink {
            source: html,
            state: &state,
        };
        let tok = Tokenizer::new(sink, TokenizerOpts::default());
        let buffer = BufferQueue::default();
        buffer.push_back(StrTendril::from(html));
        // The sink never asks for a script pause, so feeding runs to the end.
        let _ = tok.feed(&buffer);
        tok.end();
    }

    let mut state = state.into_inner();
    state.close_text(html.len());
    debug!(nodes = state.markup.len(), "Markup tree built");
    state.markup
}

struct TreeState {
    markup: Markup,
    /// Currently open elements, innermost last.
    open: Vec<(MarkupId, String)>,
    /// End of the last construct traced back to the source.
    cursor: usize,
    /// Text node still growing, with the offset its source starts at.
    text: Option<(MarkupId, usize)>,
    /// Element whose content the tokenizer reads as raw text.
    raw_text: Option<String>,
}

impl TreeState {
    fn new(source: &str) -> Self {
        Self {
            markup: Markup::with_source(source),
            open: Vec::new(),
            cursor: 0,
            text: None,
            raw_text: None,
        }
    }

    fn current(&self) -> Option<MarkupId> {
        self.open.last().map(|(id, _)| *id)
    }

    fn close_text(&mut self, end: usize) {
        if let Some((id, start)) = self.text.take() {
            self.markup.set_raw(id, start..end);
        }
    }

    /// Finds where the construct behind the current token starts.
    ///
    /// A text run in progress ends there. When the source cannot be matched
    /// the node keeps no source text and is serialized from its values.
    fn locate(
        &mut self,
        source: &str,
        accept: impl FnOnce(&[u8], usize) -> bool,
    ) -> Option<usize> {
        let found = match self.raw_text.as_deref() {
            Some("plaintext") => None,
            Some(name) => find_end_tag(source, self.cursor, name),
            None => find_markup(source, self.cursor),
        }
        .filter(|start| accept(source.as_bytes(), *start));

        match found {
            Some(start) => self.close_text(start),
            None => {
                trace!(cursor = self.cursor, "Token not found in source");
                self.text = None;
            }
        }
        found
    }
}

/// Wrapper to implement the TokenSink trait
struct TreeSink<'a> {
    source: &'a str,
    state: &'a RefCell<TreeState>,
}

impl TreeSink<'_> {
    fn process_tag(&self, tag: Tag) -> TokenSinkResult<()> {
        let name = tag.name.to_string();
        let mut state = self.state.borrow_mut();

        match tag.kind {
            TagKind::StartTag => {
                let located = state.locate(self.source, |bytes, start| {
                    bytes.get(start + 1).is_some_and(u8::is_ascii_alphabetic)
                        && names_tag(bytes, start + 1, &name)
                });
                let scanned = located.map(|start| (start, scan_tag(self.source, start + 1)));

                let mut written = scanned
                    .as_ref()
                    .map(|(_, (_, names))| names.clone())
                    .unwrap_or_default();
                let attributes = tag
                    .attrs
                    .into_iter()
                    .map(|attr| {
                        let local = attr.name.local.to_string();
                        let source_name = written
                            .iter()
                            .position(|(written, _)| written.eq_ignore_ascii_case(&local))
                            .map(|index| written.remove(index));

                        let value = attr.value.to_string();
                        match source_name {
                            Some((name, has_value)) => Attribute {
                                valueless: !has_value && value.is_empty(),
                                name,
                                value,
                            },
                            None => Attribute::new(local, value),
                        }
                    })
                    .collect();

                let parent = state.current();
                let id = state.markup.push(
                    MarkupKind::Element(ElementData {
                        name: name.clone(),
                        attributes,
                        self_closing: tag.self_closing,
                    }),
                    parent,
                );

                if let Some((start, (end, _))) = scanned {
                    state.markup.set_raw(id, start..end);
                    state.cursor = end;
                }

                if tag.self_closing || is_void_element(&name) {
                    return TokenSinkResult::Continue;
                }

                state.open.push((id, name.clone()));
                let result = raw_kind_for(&name);
                if !matches!(result, TokenSinkResult::Continue) {
                    state.raw_text = Some(name);
                }
                result
            }
            TagKind::EndTag => {
                let located = state.locate(self.source, |bytes, start| {
                    bytes.get(start + 1) == Some(&b'/') && names_tag(bytes, start + 2, &name)
                });
                let range = located.map(|start| start..scan_tag(self.source, start + 2).0);
                if let Some(range) = &range {
                    state.cursor = range.end;
                }

                if state.raw_text.as_deref() == Some(name.as_str()) {
                    state.raw_text = None;
                }

                if let Some(position) = state.open.iter().rposition(|(_, open)| *open == name) {
                    let id = state.open[position].0;
                    if let Some(range) = range {
                        state.markup.set_raw_close(id, range);
                    }
                    state.open.truncate(position);
                }
                TokenSinkResult::Continue
            }
        }
    }

    fn process_text(&self, text: &str) {
        let mut state = self.state.borrow_mut();
        let parent = state.current();

        // The tokenizer may split a run of characters into several tokens.
        if let Some(last) = state.markup.last_child(parent) {
            if let MarkupKind::Text(existing) = state.markup.kind_mut(last) {
                existing.push_str(text);
                if state.text.is_none() {
                    state.text = state
                        .markup
                        .raw_range(last)
                        .map(|range| (last, range.start));
                }
                return;
            }
        }

        let id = state.markup.push(MarkupKind::Text(text.to_string()), parent);
        let start = state.cursor;
        state.text = Some((id, start));
    }

    fn process_comment(&self, comment: &str) {
        let mut state = self.state.borrow_mut();
        let located = state.locate(self.source, |bytes, start| {
            matches!(bytes.get(start + 1), Some(b'!' | b'?' | b'/'))
        });

        let parent = state.current();
        let id = state
            .markup
            .push(MarkupKind::Comment(comment.to_string()), parent);
        if let Some(range) = located.map(|start| comment_range(self.source, start)) {
            state.cursor = range.end;
            state.markup.set_raw(id, range);
        }
    }

    fn process_doctype(&self, name: Option<&str>) {
        let mut state = self.state.borrow_mut();
        let located = state.locate(self.source, |bytes, start| {
            bytes.get(start + 1) == Some(&b'!')
        });

        let parent = state.current();
        let id = state.markup.push(
            MarkupKind::Doctype(name.unwrap_or("html").to_string()),
            parent,
        );
        if let Some(range) = located.map(|start| declaration_range(self.source, start)) {
            state.cursor = range.end;
            state.markup.set_raw(id, range);
        }
    }
}

impl TokenSink for TreeSink<'_> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => return self.process_tag(tag),
            Token::CharacterTokens(text) => {
                self.process_text(&text);
            }
            Token::CommentToken(comment) => {
                self.process_comment(&comment);
            }
            Token::DoctypeToken(doctype) => {
                self.process_doctype(doctype.name.as_deref());
            }
            Token::EOFToken => {
                self.state.borrow_mut().close_text(self.source.len());
            }
            Token::NullCharacterToken | Token::ParseError(_) => {}
        }
        TokenSinkResult::Continue
    }
}

/// Tells the tokenizer how to read the content of elements that hold raw text.
fn raw_kind_for(name: &str) -> TokenSinkResult<()> {
    match name {
        "script" => TokenSinkResult::RawData(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
            TokenSinkResult::RawData(RawKind::Rawtext)
        }
        "textarea" | "title" => TokenSinkResult::RawData(RawKind::Rcdata),
        "plaintext" => TokenSinkResult::Plaintext,
        _ => TokenSinkResult::Continue,
    }
}

fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'/' || byte == b'>'
}

fn next_lt(bytes: &[u8], from: usize) -> Option<usize> {
    let offset = bytes.get(from..)?.iter().position(|byte| *byte == b'<')?;
    Some(from + offset)
}

/// Offset of the next `<` that opens a tag, comment or doctype.
///
/// Any other `<` is text to the tokenizer, and `</>` produces no token at all.
fn find_markup(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut at = from;
    loop {
        let start = next_lt(bytes, at)?;
        match bytes.get(start + 1) {
            Some(b'/') if bytes.get(start + 2) == Some(&b'>') => at = start + 3,
            Some(b'!' | b'?' | b'/') => return Some(start),
            Some(byte) if byte.is_ascii_alphabetic() => return Some(start),
            _ => at = start + 1,
        }
    }
}

/// Offset of the end tag that closes the raw text content of `name`.
fn find_end_tag(source: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut at = from;
    loop {
        let start = next_lt(bytes, at)?;
        if bytes.get(start + 1) == Some(&b'/') && names_tag(bytes, start + 2, name) {
            return Some(start);
        }
        at = start + 1;
    }
}

/// True when `bytes[at..]` spells `name` in any case, followed by a
/// delimiter or the end of input.
fn names_tag(bytes: &[u8], at: usize, name: &str) -> bool {
    let end = at + name.len();
    bytes
        .get(at..end)
        .is_some_and(|found| found.eq_ignore_ascii_case(name.as_bytes()))
        && bytes.get(end).map_or(true, |byte| is_delimiter(*byte))
}

enum Scan {
    Between,
    Name(usize),
    AfterName(usize, usize),
    BeforeValue,
    Quoted(u8),
    Unquoted,
}

/// Reads a tag from its name, at `at`, through the closing `>`.
///
/// Returns the offset just past the tag, and every attribute name as written
/// along with whether it was given a value.
fn scan_tag(source: &str, at: usize) -> (usize, Vec<(String, bool)>) {
    let bytes = source.as_bytes();
    let mut at = at;
    while at < bytes.len() && !is_delimiter(bytes[at]) {
        at += 1;
    }

    let mut names = Vec::new();
    let mut scan = Scan::Between;
    while at < bytes.len() {
        let byte = bytes[at];
        scan = match scan {
            Scan::Between => match byte {
                b'>' => return (at + 1, names),
                b'/' => Scan::Between,
                byte if byte.is_ascii_whitespace() => Scan::Between,
                _ => Scan::Name(at),
            },
            Scan::Name(start) => match byte {
                b'=' => {
                    names.push((source[start..at].to_string(), true));
                    Scan::BeforeValue
                }
                b'>' => {
                    names.push((source[start..at].to_string(), false));
                    return (at + 1, names);
                }
                b'/' => {
                    names.push((source[start..at].to_string(), false));
                    Scan::Between
                }
                byte if byte.is_ascii_whitespace() => Scan::AfterName(start, at),
                _ => Scan::Name(start),
            },
            Scan::AfterName(start, end) => match byte {
                b'=' => {
                    names.push((source[start..end].to_string(), true));
                    Scan::BeforeValue
                }
                byte if byte.is_ascii_whitespace() => Scan::AfterName(start, end),
                _ => {
                    names.push((source[start..end].to_string(), false));
                    match byte {
                        b'>' => return (at + 1, names),
                        b'/' => Scan::Between,
                        _ => Scan::Name(at),
                    }
                }
            },
            Scan::BeforeValue => match byte {
                b'"' | b'\'' => Scan::Quoted(byte),
                b'>' => return (at + 1, names),
                byte if byte.is_ascii_whitespace() => Scan::BeforeValue,
                _ => Scan::Unquoted,
            },
            Scan::Quoted(quote) if byte == quote => Scan::Between,
            Scan::Quoted(quote) => Scan::Quoted(quote),
            Scan::Unquoted => match byte {
                b'>' => return (at + 1, names),
                byte if byte.is_ascii_whitespace() => Scan::Between,
                _ => Scan::Unquoted,
            },
        };
        at += 1;
    }

    (bytes.len(), names)
}

/// Source range of a comment, including the bogus forms the tokenizer
/// turns into comments (`<?...>`, `<!...>`, `</ ...>`).
fn comment_range(source: &str, start: usize) -> Range<usize> {
    let rest = &source[start..];
    if !rest.starts_with("<!--") {
        return declaration_range(source, start);
    }

    for abrupt in ["<!-->", "<!--->"] {
        if rest.starts_with(abrupt) {
            return start..start + abrupt.len();
        }
    }

    let body = start + 4;
    let end = ["-->", "--!>"]
        .into_iter()
        .filter_map(|close| Some((source[body..].find(close)?, close.len())))
        .min_by_key(|(offset, _)| *offset)
        .map_or(source.len(), |(offset, len)| body + offset + len);
    start..end
}

/// Source range of `<!...>` up to the first `>`.
fn declaration_range(source: &str, start: usize) -> Range<usize> {
    let end = source.as_bytes()[start..]
        .iter()
        .position(|byte| *byte == b'>')
        .map_or(source.len(), |offset| start + offset + 1);
    start..end
}
