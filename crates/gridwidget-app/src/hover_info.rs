//! Debounced hover information popup
//!
//! [`HoverInfoService`] decides *when* descriptive content for a hovered
//! element is fetched and *whether* a completed fetch may still be shown.
//! It never sleeps or awaits itself: it returns [`HoverAction`]s that the
//! engine turns into a debounce timer and a fetch task, and both come back
//! as messages carrying the `request_id` they were issued for.
//!
//! The latest issued `request_id` is the only cancellation token. A timer or
//! fetch result carrying an older id is dropped on arrival.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::HoverSettings;
use gridwidget_core::prelude::*;
use gridwidget_core::Point;

/// Quiet period used when no settings are supplied
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Payload of a hover info fetch (`{"id": ..., "type": ...}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverInfoRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: String,
}

impl HoverInfoRequest {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
        }
    }
}

/// Source of hover content for an element.
///
/// An empty string means there is nothing to show.
#[trait_variant::make(HoverInfoFetcher: Send)]
pub trait LocalHoverInfoFetcher {
    async fn fetch_info(&self, request: &HoverInfoRequest) -> Result<String>;
}

/// Hover toggle reported by the renderer, already in widget coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct HoverIntent {
    pub should_display: bool,
    pub position: Option<Point>,
    pub element_id: String,
    pub element_type: String,
}

/// Visible state of the info popup
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InfoBox {
    pub visible: bool,
    pub content: String,
    pub position: Point,
}

/// Work the engine must schedule on behalf of the service
#[derive(Debug, Clone, PartialEq)]
pub enum HoverAction {
    /// Start the debounce timer for `request_id`
    ScheduleFetch { request_id: u64, delay: Duration },

    /// Run the fetch for `request_id`
    Fetch {
        request_id: u64,
        request: HoverInfoRequest,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum HoverPhase {
    Idle,
    Pending {
        request_id: u64,
        target: HoverInfoRequest,
    },
    InFlight {
        request_id: u64,
        target: HoverInfoRequest,
    },
    Settled {
        target: HoverInfoRequest,
    },
}

impl HoverPhase {
    fn target(&self) -> Option<&HoverInfoRequest> {
        match self {
            Self::Idle => None,
            Self::Pending { target, .. }
            | Self::InFlight { target, .. }
            | Self::Settled { target } => Some(target),
        }
    }
}

/// Hover popup state machine for one render session
#[derive(Debug)]
pub struct HoverInfoService {
    last_request_id: u64,
    phase: HoverPhase,
    pointer: Point,
    info_box: InfoBox,
    applied_count: u64,
    debounce: Duration,
    offset: Point,
    error_prefix: String,
}

impl HoverInfoService {
    pub fn new(settings: &HoverSettings) -> Self {
        Self {
            last_request_id: 0,
            phase: HoverPhase::Idle,
            pointer: Point::default(),
            info_box: InfoBox::default(),
            applied_count: 0,
            debounce: settings.debounce(),
            offset: Point::new(settings.offset_x, settings.offset_y),
            error_prefix: settings.error_prefix.clone(),
        }
    }

    /// React to a hover toggle from the renderer.
    ///
    /// Hover-off hides the popup at once. A new element restarts the
    /// debounce; the element already pending or shown only moves the popup.
    pub fn handle_hover(&mut self, intent: HoverIntent) -> Option<HoverAction> {
        let position = match (intent.should_display, intent.position) {
            (true, Some(position)) => position,
            _ => {
                self.last_request_id += 1;
                self.phase = HoverPhase::Idle;
                self.info_box.visible = false;
                self.info_box.content.clear();
                debug!("Hover off, request {} hides info box", self.last_request_id);
                return None;
            }
        };

        self.pointer = position;
        let target = HoverInfoRequest::new(intent.element_id, intent.element_type);

        if self.phase.target() == Some(&target) {
            if self.info_box.visible {
                self.info_box.position = self.popup_position();
            }
            trace!("Hover repeated on '{}', reusing current state", target.id);
            return None;
        }

        self.last_request_id += 1;
        let request_id = self.last_request_id;
        debug!(
            "Hover on '{}' ({}), scheduling request {}",
            target.id, target.element_type, request_id
        );
        self.phase = HoverPhase::Pending { request_id, target };
        Some(HoverAction::ScheduleFetch {
            request_id,
            delay: self.debounce,
        })
    }

    /// The debounce timer for `request_id` elapsed
    pub fn timer_fired(&mut self, request_id: u64) -> Option<HoverAction> {
        match &self.phase {
            HoverPhase::Pending {
                request_id: pending,
                target,
            } if *pending == request_id => {
                let request = target.clone();
                self.phase = HoverPhase::InFlight {
                    request_id,
                    target: request.clone(),
                };
                Some(HoverAction::Fetch {
                    request_id,
                    request,
                })
            }
            _ => {
                trace!("Debounce timer {} superseded", request_id);
                None
            }
        }
    }

    /// A fetch finished. Returns true if its result was applied.
    ///
    /// Failures become a visible error line in the popup.
    pub fn fetch_completed(
        &mut self,
        request_id: u64,
        result: std::result::Result<String, String>,
    ) -> bool {
        let target = match &self.phase {
            HoverPhase::InFlight {
                request_id: current,
                target,
            } if *current == request_id && request_id == self.last_request_id => target.clone(),
            _ => {
                trace!("Discarding stale hover result {}", request_id);
                return false;
            }
        };

        let content = match result {
            Ok(content) => content,
            Err(e) => {
                warn!("Hover info for '{}' failed: {}", target.id, e);
                format!("{}: {}", self.error_prefix, e)
            }
        };

        self.info_box = InfoBox {
            visible: !content.is_empty(),
            content,
            position: self.popup_position(),
        };
        self.phase = HoverPhase::Settled { target };
        self.applied_count += 1;
        true
    }

    pub fn last_request_id(&self) -> u64 {
        self.last_request_id
    }

    pub fn info_box(&self) -> &InfoBox {
        &self.info_box
    }

    /// Number of fetch results that reached the popup
    pub fn applied_count(&self) -> u64 {
        self.applied_count
    }

    fn popup_position(&self) -> Point {
        self.pointer.offset(self.offset.x, self.offset.y)
    }
}

impl Default for HoverInfoService {
    fn default() -> Self {
        Self::new(&HoverSettings::default())
    }
}
