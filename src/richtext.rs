//! Renders Prismic structured text ("rich text") into HTML fragments.
//!
//! A rich-text field is an array of [`Block`]s. Each block carries its text
//! plus a list of [`Span`]s that decorate character ranges of that text
//! (bold, italic, links, labels). Consecutive list-item blocks are grouped
//! into a single `<ul>` or `<ol>`. Text is always escaped; embed HTML is
//! passed through as-is since the CMS is the trust boundary.

use crate::util::null_as_default;
use pulldown_cmark::escape::{escape_href, escape_html, StrWrite};
use serde::Deserialize;
use std::io;

/// One block of rich text.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,

    /// Image source, for [`BlockKind::Image`] blocks.
    #[serde(default)]
    pub url: Option<String>,

    /// Image alt text, for [`BlockKind::Image`] blocks.
    #[serde(default)]
    pub alt: Option<String>,

    /// Embedded content, for [`BlockKind::Embed`] blocks.
    #[serde(default)]
    pub oembed: Option<Oembed>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

/// Decorates the character range `start..end` of a block's text. Offsets
/// count characters, not bytes.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    #[serde(rename = "type")]
    pub kind: SpanKind,

    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Emphasis,
    #[serde(rename = "hyperlink")]
    Hyperlink,
    #[serde(rename = "label")]
    Label,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub embed_url: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListState {
    Closed,
    Unordered,
    Ordered,
}

/// Writes rich-text [`Block`]s as HTML. Tracks whether a list is currently
/// open so consecutive list items share one list element.
struct HtmlRenderer {
    list: ListState,
}

impl HtmlRenderer {
    fn new() -> Self {
        HtmlRenderer {
            list: ListState::Closed,
        }
    }

    fn on_block<W: StrWrite>(&mut self, w: &mut W, block: &Block) -> io::Result<()> {
        let wanted = match block.kind {
            BlockKind::ListItem => ListState::Unordered,
            BlockKind::OrderedListItem => ListState::Ordered,
            _ => ListState::Closed,
        };
        if wanted != self.list {
            self.close_list(w)?;
            match wanted {
                ListState::Unordered => w.write_str("<ul>")?,
                ListState::Ordered => w.write_str("<ol>")?,
                ListState::Closed => (),
            }
            self.list = wanted;
        }

        match block.kind {
            BlockKind::Heading1 => self.on_text_block(w, "h1", block),
            BlockKind::Heading2 => self.on_text_block(w, "h2", block),
            BlockKind::Heading3 => self.on_text_block(w, "h3", block),
            BlockKind::Heading4 => self.on_text_block(w, "h4", block),
            BlockKind::Heading5 => self.on_text_block(w, "h5", block),
            BlockKind::Heading6 => self.on_text_block(w, "h6", block),
            BlockKind::Paragraph => self.on_text_block(w, "p", block),
            BlockKind::Preformatted => self.on_text_block(w, "pre", block),
            BlockKind::ListItem | BlockKind::OrderedListItem => {
                self.on_text_block(w, "li", block)
            }
            BlockKind::Image => self.on_image(w, block),
            BlockKind::Embed => self.on_embed(w, block),
            BlockKind::Unknown => Ok(()),
        }
    }

    fn close_list<W: StrWrite>(&mut self, w: &mut W) -> io::Result<()> {
        match self.list {
            ListState::Closed => Ok(()),
            ListState::Unordered => w.write_str("</ul>"),
            ListState::Ordered => w.write_str("</ol>"),
        }?;
        self.list = ListState::Closed;
        Ok(())
    }

    fn on_text_block<W: StrWrite>(
        &mut self,
        w: &mut W,
        element: &str,
        block: &Block,
    ) -> io::Result<()> {
        write!(w, "<{}>", element)?;
        self.on_spanned_text(w, &block.text, &block.spans)?;
        write!(w, "</{}>", element)
    }

    fn on_image<W: StrWrite>(&mut self, w: &mut W, block: &Block) -> io::Result<()> {
        w.write_str(r#"<p class="block-img"><img src=""#)?;
        escape_href(&mut *w, block.url.as_deref().unwrap_or_default())?;
        w.write_str(r#"" alt=""#)?;
        escape_html(&mut *w, block.alt.as_deref().unwrap_or_default())?;
        w.write_str(r#"" /></p>"#)
    }

    fn on_embed<W: StrWrite>(&mut self, w: &mut W, block: &Block) -> io::Result<()> {
        let oembed = match &block.oembed {
            Some(oembed) => oembed,
            None => return Ok(()),
        };
        w.write_str(r#"<div data-oembed=""#)?;
        escape_href(&mut *w, oembed.embed_url.as_deref().unwrap_or_default())?;
        w.write_str(r#"" data-oembed-type=""#)?;
        escape_html(&mut *w, oembed.kind.as_deref().unwrap_or_default())?;
        w.write_str(r#"">"#)?;
        w.write_str(oembed.html.as_deref().unwrap_or_default())?;
        w.write_str("</div>")
    }

    /// Writes `text` with its spans applied. Overlapping spans are closed and
    /// reopened as needed so the output is always well-nested.
    fn on_spanned_text<W: StrWrite>(
        &mut self,
        w: &mut W,
        text: &str,
        spans: &[Span],
    ) -> io::Result<()> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        let mut spans: Vec<&Span> = spans
            .iter()
            .filter(|s| s.start < s.end && s.start < len)
            .collect();
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut boundaries: Vec<usize> = vec![0, len];
        for span in &spans {
            boundaries.push(span.start);
            boundaries.push(span.end.min(len));
        }
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut open: Vec<&Span> = Vec::new();
        let mut pending = spans.into_iter().peekable();
        for (i, &at) in boundaries.iter().enumerate() {
            if let Some(lowest) = open.iter().position(|s| s.end.min(len) <= at) {
                let closed = open.split_off(lowest);
                for span in closed.iter().rev() {
                    close_span(w, span)?;
                }
                for span in closed.into_iter().filter(|s| s.end.min(len) > at) {
                    open_span(w, span)?;
                    open.push(span);
                }
            }

            while let Some(span) = pending.next_if(|s| s.start == at) {
                open_span(w, span)?;
                open.push(span);
            }

            if let Some(&next) = boundaries.get(i + 1) {
                let segment: String = chars[at..next].iter().collect();
                write_text(w, &segment)?;
            }
        }
        for span in open.iter().rev() {
            close_span(w, span)?;
        }
        Ok(())
    }
}

fn open_span<W: StrWrite>(w: &mut W, span: &Span) -> io::Result<()> {
    let data = span.data.as_ref();
    match span.kind {
        SpanKind::Strong => w.write_str("<strong>"),
        SpanKind::Emphasis => w.write_str("<em>"),
        SpanKind::Hyperlink => match data.and_then(|d| d.url.as_deref()) {
            Some(url) => {
                w.write_str(r#"<a href=""#)?;
                escape_href(&mut *w, url)?;
                match data.and_then(|d| d.target.as_deref()) {
                    Some(target) => {
                        w.write_str(r#"" target=""#)?;
                        escape_html(&mut *w, target)?;
                        w.write_str(r#"" rel="noopener">"#)
                    }
                    None => w.write_str(r#"">"#),
                }
            }
            None => Ok(()),
        },
        SpanKind::Label => {
            w.write_str(r#"<span class=""#)?;
            escape_html(&mut *w, data.and_then(|d| d.label.as_deref()).unwrap_or_default())?;
            w.write_str(r#"">"#)
        }
        SpanKind::Unknown => Ok(()),
    }
}

fn close_span<W: StrWrite>(w: &mut W, span: &Span) -> io::Result<()> {
    match span.kind {
        SpanKind::Strong => w.write_str("</strong>"),
        SpanKind::Emphasis => w.write_str("</em>"),
        SpanKind::Hyperlink => match span.data.as_ref().and_then(|d| d.url.as_ref()) {
            Some(_) => w.write_str("</a>"),
            None => Ok(()),
        },
        SpanKind::Label => w.write_str("</span>"),
        SpanKind::Unknown => Ok(()),
    }
}

/// Escapes `text`, turning line breaks into `<br />`.
fn write_text<W: StrWrite>(w: &mut W, text: &str) -> io::Result<()> {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            w.write_str("<br />")?;
        }
        escape_html(&mut *w, line)?;
    }
    Ok(())
}

/// Writes `blocks` as HTML into `w`.
pub fn push_html<W: StrWrite>(w: &mut W, blocks: &[Block]) -> io::Result<()> {
    let mut renderer = HtmlRenderer::new();
    for block in blocks {
        renderer.on_block(w, block)?;
    }
    renderer.close_list(w)
}

/// Converts `blocks` into an HTML string.
pub fn as_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    // writing into a String never fails
    let _ = push_html(&mut out, blocks);
    out
}

/// Converts `blocks` into inline HTML for use inside an element the caller
/// provides. Each block's text is written with its spans applied and without
/// a wrapping element; blocks are separated by a space. Images and embeds are
/// dropped.
pub fn as_inline_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut renderer = HtmlRenderer::new();
    for block in blocks.iter().filter(|b| !b.text.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        // writing into a String never fails
        let _ = renderer.on_spanned_text(&mut out, &block.text, &block.spans);
    }
    out
}

/// Extracts the plain text of `blocks`, one block per space-separated run.
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|b| !b.text.is_empty())
        .map(|b| b.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    fn blocks(json: &str) -> Vec<Block> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_paragraph_is_escaped() {
        let input = blocks(r#"[{"type": "paragraph", "text": "a < b & c", "spans": []}]"#);
        assert_eq!("<p>a &lt; b &amp; c</p>", as_html(&input));
    }

    #[test]
    fn test_headings_and_preformatted() {
        let input = blocks(
            r#"[
                {"type": "heading2", "text": "Title", "spans": []},
                {"type": "preformatted", "text": "let x = 1;", "spans": []}
            ]"#,
        );
        assert_eq!("<h2>Title</h2><pre>let x = 1;</pre>", as_html(&input));
    }

    #[test]
    fn test_spans() {
        let input = blocks(
            r#"[{"type": "paragraph", "text": "Hello bold world", "spans": [
                {"start": 6, "end": 10, "type": "strong"},
                {"start": 11, "end": 16, "type": "hyperlink",
                 "data": {"link_type": "Web", "url": "https://example.com"}}
            ]}]"#,
        );
        assert_eq!(
            r#"<p>Hello <strong>bold</strong> <a href="https://example.com">world</a></p>"#,
            as_html(&input)
        );
    }

    #[test]
    fn test_nested_spans() {
        let input = blocks(
            r#"[{"type": "paragraph", "text": "abcdef", "spans": [
                {"start": 2, "end": 4, "type": "em"},
                {"start": 0, "end": 6, "type": "strong"}
            ]}]"#,
        );
        assert_eq!(
            "<p><strong>ab<em>cd</em>ef</strong></p>",
            as_html(&input)
        );
    }

    #[test]
    fn test_overlapping_spans_stay_well_nested() {
        let input = blocks(
            r#"[{"type": "paragraph", "text": "abcdef", "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 2, "end": 6, "type": "em"}
            ]}]"#,
        );
        assert_eq!(
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>",
            as_html(&input)
        );
    }

    #[test]
    fn test_spans_count_characters() {
        let input = blocks(
            r#"[{"type": "paragraph", "text": "não é", "spans": [
                {"start": 4, "end": 5, "type": "em"}
            ]}]"#,
        );
        assert_eq!("<p>não <em>é</em></p>", as_html(&input));
    }

    #[test]
    fn test_link_with_target() {
        let input = blocks(
            r#"[{"type": "paragraph", "text": "go", "spans": [
                {"start": 0, "end": 2, "type": "hyperlink",
                 "data": {"url": "https://example.com", "target": "_blank"}}
            ]}]"#,
        );
        assert_eq!(
            r#"<p><a href="https://example.com" target="_blank" rel="noopener">go</a></p>"#,
            as_html(&input)
        );
    }

    #[test]
    fn test_line_breaks() {
        let input = blocks(r#"[{"type": "paragraph", "text": "one\ntwo", "spans": []}]"#);
        assert_eq!("<p>one<br />two</p>", as_html(&input));
    }

    #[test]
    fn test_lists_are_grouped() {
        let input = blocks(
            r#"[
                {"type": "list-item", "text": "a", "spans": []},
                {"type": "list-item", "text": "b", "spans": []},
                {"type": "o-list-item", "text": "one", "spans": []},
                {"type": "paragraph", "text": "end", "spans": []},
                {"type": "list-item", "text": "c", "spans": []}
            ]"#,
        );
        assert_eq!(
            "<ul><li>a</li><li>b</li></ul><ol><li>one</li></ol><p>end</p><ul><li>c</li></ul>",
            as_html(&input)
        );
    }

    #[test]
    fn test_image() {
        let input = blocks(
            r#"[{"type": "image", "url": "https://images.prismic.io/a.png", "alt": "A \"quote\"", "text": null}]"#,
        );
        assert_eq!(
            r#"<p class="block-img"><img src="https://images.prismic.io/a.png" alt="A &quot;quote&quot;" /></p>"#,
            as_html(&input)
        );
    }

    #[test]
    fn test_embed_passes_html_through() {
        let input = blocks(
            r#"[{"type": "embed", "oembed": {"type": "video", "embed_url": "https://youtu.be/x", "html": "<iframe></iframe>"}}]"#,
        );
        assert_eq!(
            r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video"><iframe></iframe></div>"#,
            as_html(&input)
        );
    }

    #[test]
    fn test_unknown_blocks_are_skipped() {
        let input = blocks(
            r#"[{"type": "table", "text": "?"}, {"type": "paragraph", "text": "ok"}]"#,
        );
        assert_eq!("<p>ok</p>", as_html(&input));
    }

    #[test]
    fn test_as_inline_html() {
        let blocks = blocks(
            r#"[
                {"type": "heading2", "text": "Tom & Jerry", "spans": [
                    {"start": 0, "end": 3, "type": "em"}
                ]},
                {"type": "image", "url": "https://images.prismic.io/x.png"},
                {"type": "heading2", "text": "again", "spans": []}
            ]"#,
        );
        assert_eq!("<em>Tom</em> &amp; Jerry again", as_inline_html(&blocks));
    }

    #[test]
    fn test_as_text() {
        let input = blocks(
            r#"[{"type": "heading1", "text": "Hello"}, {"type": "image", "url": "x"}, {"type": "paragraph", "text": "world"}]"#,
        );
        assert_eq!("Hello world", as_text(&input));
    }
}
