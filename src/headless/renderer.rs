//! Headless render sessions
//!
//! There is no page to draw on, so a session only tracks what a browser
//! renderer would expose: the markup, the current viewport, the live
//! metadata and the surface position. Mounts and unmounts are reported as
//! events so the host can mirror them.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use gridwidget_app::renderer::{DiagramRenderer, RenderSession, SessionId, SessionSpec};
use gridwidget_core::prelude::*;
use gridwidget_core::{BranchState, Point, ViewBox};

use super::{EventWriter, HeadlessEvent};

static ROOT_TAG_RE: OnceLock<Option<Regex>> = OnceLock::new();
static VIEWBOX_ATTR_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Span of the first `<svg ...>` opening tag
fn root_svg_tag(markup: &str) -> Option<Range<usize>> {
    cached(&ROOT_TAG_RE, r"<svg\b[^>]*>")?
        .find(markup)
        .map(|m| m.range())
}

/// Span of the `viewBox` value inside the root tag, relative to the document
fn root_viewbox_value(markup: &str, tag: &Range<usize>) -> Option<Range<usize>> {
    let re = cached(&VIEWBOX_ATTR_RE, r#"\bviewBox\s*=\s*["']([^"']+)["']"#)?;
    let value = re.captures(&markup[tag.clone()])?.get(1)?;
    Some(tag.start + value.start()..tag.start + value.end())
}

/// `viewBox` attribute of the root element of an SVG document
pub fn extract_viewbox(markup: &str) -> Option<ViewBox> {
    let tag = root_svg_tag(markup)?;
    let value = root_viewbox_value(markup, &tag)?;
    ViewBox::parse(&markup[value])
}

/// Replace (or add) the root `viewBox` attribute
pub fn with_viewbox(markup: &str, viewbox: &ViewBox) -> String {
    let Some(tag) = root_svg_tag(markup) else {
        return markup.to_string();
    };

    match root_viewbox_value(markup, &tag) {
        // Swap the attribute value only, keeping the quote style
        Some(value) => format!(
            "{}{}{}",
            &markup[..value.start],
            viewbox.to_attr(),
            &markup[value.end..]
        ),
        None => {
            let insert_at = tag.start + "<svg".len();
            format!(
                "{} viewBox=\"{}\"{}",
                &markup[..insert_at],
                viewbox.to_attr(),
                &markup[insert_at..]
            )
        }
    }
}

#[derive(Debug)]
pub struct HeadlessSession {
    spec: SessionSpec,
    viewbox: Option<ViewBox>,
    live_metadata: Option<String>,
    origin: Point,
    branch_states: Vec<BranchState>,
}

impl HeadlessSession {
    fn new(spec: SessionSpec) -> Self {
        let viewbox = spec.initial_viewbox.or_else(|| extract_viewbox(&spec.markup));
        Self {
            viewbox,
            live_metadata: spec.metadata.as_ref().map(|m| m.0.to_string()),
            origin: Point::default(),
            branch_states: Vec::new(),
            spec,
        }
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    pub fn set_viewbox(&mut self, viewbox: ViewBox) {
        self.viewbox = Some(viewbox);
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn set_live_metadata(&mut self, metadata: String) {
        self.live_metadata = Some(metadata);
    }

    pub fn branch_states(&self) -> &[BranchState] {
        &self.branch_states
    }
}

impl RenderSession for HeadlessSession {
    fn id(&self) -> SessionId {
        self.spec.session_id
    }

    fn current_markup(&self) -> String {
        match &self.viewbox {
            Some(viewbox) => with_viewbox(&self.spec.markup, viewbox),
            None => self.spec.markup.clone(),
        }
    }

    fn viewbox(&self) -> Option<ViewBox> {
        self.viewbox
    }

    fn metadata_snapshot(&self) -> Option<String> {
        self.live_metadata.clone()
    }

    fn set_branch_states(&mut self, states: &[BranchState]) {
        debug!(
            "Session {}: {} branch state(s)",
            self.spec.session_id,
            states.len()
        );
        self.branch_states = states.to_vec();
    }

    fn surface_origin(&self) -> Point {
        self.origin
    }
}

/// Renderer reporting session lifecycle on the event stream
#[derive(Debug)]
pub struct HeadlessRenderer {
    writer: EventWriter,
}

impl HeadlessRenderer {
    pub fn new(writer: EventWriter) -> Self {
        Self { writer }
    }
}

impl DiagramRenderer for HeadlessRenderer {
    type Session = HeadlessSession;

    fn create_session(&mut self, spec: SessionSpec) -> HeadlessSession {
        HeadlessSession::new(spec)
    }

    fn attach(&mut self, session: &HeadlessSession) {
        let spec = session.spec();
        self.writer.emit(&HeadlessEvent::SessionMounted {
            session_id: spec.session_id,
            kind: spec.kind,
            viewbox: session.viewbox(),
            invalid_lf: spec.invalid_lf,
            grayout: spec.grayout,
            options: spec.options.clone(),
            callbacks: spec.callbacks.enabled_slots(),
        });
    }

    fn detach(&mut self, session: HeadlessSession) {
        self.writer.emit(&HeadlessEvent::SessionUnmounted {
            session_id: session.id(),
        });
    }
}
