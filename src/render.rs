//! Markdown to HTML rendering.
//!
//! Rendering is a pure function of the resolved body and [`RenderOptions`]:
//! it touches no filesystem and keeps no state between documents, so the
//! same input always yields the same HTML.
//!
//! On top of plain pulldown-cmark output the renderer
//! - gives headings an `id` anchor (duplicates get `-1`, `-2`, ...),
//! - prefixes relative image sources with the document's `asset_path`,
//! - appends the footnote section.

use crate::{
    config::{SiteConfig, SlugMode},
    document::MetaValue,
    resolve::{Footnote, ResolvedDocument},
    utils::slug::slugify,
};
use chrono::NaiveDate;
use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, html};
use std::collections::{BTreeMap, HashSet};

/// Markdown options taken from `[build.markdown]` and `[build.slug]`.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub smart_punctuation: bool,
    pub heading_anchors: bool,
    pub fragment_slug: SlugMode,
}

impl RenderOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            smart_punctuation: config.build.markdown.smart_punctuation,
            heading_anchors: config.build.markdown.heading_anchors,
            fragment_slug: config.build.slug.fragment,
        }
    }

    fn parser_options(&self) -> Options {
        let mut options =
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        if self.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }
}

/// A document rendered to HTML, ready for the publisher.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    pub slug: String,
    pub date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub layout: Option<String>,
    pub summary: Option<String>,
    pub author: Option<String>,
    /// Header keys without a derived field
    pub extra: BTreeMap<String, MetaValue>,
    /// Body HTML followed by the footnote section
    pub html: String,
}

/// Render a resolved document.
pub fn render(resolved: &ResolvedDocument, options: &RenderOptions) -> RenderedPage {
    let doc = &resolved.document;
    let mut html = render_markdown(&resolved.body, doc.asset_path.as_deref(), options);
    html.push_str(&render_footnotes(&resolved.footnotes, doc.asset_path.as_deref(), options));

    RenderedPage {
        id: doc.id.clone(),
        title: doc.title.clone(),
        category: doc.category.clone(),
        slug: doc.slug.clone(),
        date: doc.date,
        tags: doc.tags.clone(),
        layout: doc.layout.clone(),
        summary: doc.summary.clone(),
        author: doc.author.clone(),
        extra: doc.extra(),
        html,
    }
}

/// Render one Markdown text to HTML.
pub fn render_markdown(text: &str, asset_path: Option<&str>, options: &RenderOptions) -> String {
    let parser = Parser::new_ext(text, options.parser_options());
    let mut anchors = Anchors::new(options.fragment_slug);
    let mut heading: Option<HeadingBuffer<'_>> = None;
    let mut events = Vec::new();

    for event in parser {
        match event {
            Event::Start(Tag::Heading(level, id, classes)) if options.heading_anchors => {
                heading = Some(HeadingBuffer {
                    level,
                    explicit_id: id.map(str::to_owned),
                    classes: classes.join(" "),
                    text: String::new(),
                    events: Vec::new(),
                });
            }
            Event::End(Tag::Heading(..)) if heading.is_some() => {
                if let Some(buffer) = heading.take() {
                    buffer.flush(&mut anchors, &mut events);
                }
            }
            Event::Start(Tag::Image(link_type, dest, title)) => {
                let dest = match asset_path {
                    Some(prefix) if is_relative(&dest) => CowStr::from(join_asset(prefix, &dest)),
                    _ => dest,
                };
                push(&mut heading, &mut events, Event::Start(Tag::Image(link_type, dest, title)));
            }
            event => {
                if let Some(buffer) = heading.as_mut()
                    && let Event::Text(text) | Event::Code(text) = &event
                {
                    buffer.text.push_str(text);
                }
                push(&mut heading, &mut events, event);
            }
        }
    }

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

fn push<'a>(heading: &mut Option<HeadingBuffer<'a>>, events: &mut Vec<Event<'a>>, event: Event<'a>) {
    match heading {
        Some(buffer) => buffer.events.push(event),
        None => events.push(event),
    }
}

/// Events of an open heading, held back until its anchor is known.
struct HeadingBuffer<'a> {
    level: HeadingLevel,
    explicit_id: Option<String>,
    classes: String,
    text: String,
    events: Vec<Event<'a>>,
}

impl<'a> HeadingBuffer<'a> {
    fn flush(self, anchors: &mut Anchors, out: &mut Vec<Event<'a>>) {
        let id = match self.explicit_id {
            Some(id) => anchors.claim(id),
            None => anchors.derive(&self.text),
        };
        let class = if self.classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, escape_html(&self.classes))
        };
        out.push(Event::Html(
            format!(r#"<{} id="{}"{class}>"#, self.level, escape_html(&id)).into(),
        ));
        out.extend(self.events);
        out.push(Event::Html(format!("</{}>\n", self.level).into()));
    }
}

/// Heading anchors already used on the page.
struct Anchors {
    mode: SlugMode,
    used: HashSet<String>,
}

impl Anchors {
    fn new(mode: SlugMode) -> Self {
        Self { mode, used: HashSet::new() }
    }

    fn derive(&mut self, text: &str) -> String {
        let slug = slugify(text.trim(), self.mode);
        self.claim(if slug.is_empty() { "section".to_owned() } else { slug })
    }

    fn claim(&mut self, base: String) -> String {
        let mut candidate = base.clone();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Render the footnote list. Empty input renders nothing.
fn render_footnotes(footnotes: &[Footnote], asset_path: Option<&str>, options: &RenderOptions) -> String {
    if footnotes.is_empty() {
        return String::new();
    }
    let options = RenderOptions { heading_anchors: false, ..*options };

    let mut out = String::from("<section class=\"footnotes\"><ol>\n");
    for note in footnotes {
        let n = note.ordinal;
        let backref = (0..note.references.max(1))
            .map(|repeat| match repeat {
                0 => format!(r##"<a href="#fnref:{n}" class="reversefootnote">&#8617;</a>"##),
                k => format!(
                    r##"<a href="#fnref:{n}:{k}" class="reversefootnote">&#8617;<sup>{}</sup></a>"##,
                    k + 1
                ),
            })
            .collect::<Vec<_>>()
            .join(" ");
        let mut body = render_markdown(&note.text, asset_path, &options);
        let trimmed = body.trim_end().len();
        body.truncate(trimmed);

        match body.strip_suffix("</p>") {
            Some(head) => body = format!("{head} {backref}</p>"),
            None => {
                body.push(' ');
                body.push_str(&backref);
            }
        }
        out.push_str(&format!("<li id=\"fn:{n}\">{body}</li>\n"));
    }
    out.push_str("</ol></section>\n");
    out
}

/// `true` for sources that are neither absolute, fragment-only nor carry a scheme.
fn is_relative(src: &str) -> bool {
    !(src.is_empty()
        || src.starts_with('/')
        || src.starts_with('#')
        || src.starts_with("data:")
        || src.contains("://"))
}

fn join_asset(prefix: &str, src: &str) -> String {
    let src = src.trim_start_matches("./");
    format!("{}/{src}", prefix.trim_end_matches('/'))
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
