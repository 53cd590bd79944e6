//! Right-click context menu with keyboard navigation
//!
//! `Closed -> Open(anchor, target, focus = none) -> Closed`.
//!
//! Opening does not listen for outside clicks or keys right away: the
//! listeners are armed one event-loop turn later (see
//! [`PopupMenu::listeners_armed`]) so the click that opened the menu cannot
//! close it again. Every way of closing detaches them.

use std::fmt;

use serde::Serialize;

use crate::input_key::InputKey;
use gridwidget_core::prelude::*;
use gridwidget_core::Point;

/// Item chosen in the menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    pub index: usize,
    pub target_id: String,
}

/// Callback invoked with the chosen item before the menu closes
pub type SelectionCallback = Box<dyn FnMut(MenuSelection) + Send>;

/// Outside-click and keyboard listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Detached,
    /// Menu is open, registration deferred to the next turn
    Arming,
    Attached,
}

#[derive(Debug, Clone)]
struct MenuSession {
    anchor: Point,
    target_id: String,
    focused: Option<usize>,
    highlighted: Option<usize>,
}

/// Rendered menu, for the surface that draws it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuView {
    pub anchor: Point,
    pub target_id: String,
    pub focused: Option<usize>,
    pub items: Vec<MenuItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItemView {
    pub label: String,
    pub highlighted: bool,
}

pub struct PopupMenu {
    items: Vec<String>,
    on_select: SelectionCallback,
    session: Option<MenuSession>,
    listeners: ListenerState,
    /// Bumped on every open; identifies which open an arming belongs to
    generation: u64,
}

impl fmt::Debug for PopupMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupMenu")
            .field("items", &self.items)
            .field("session", &self.session)
            .field("listeners", &self.listeners)
            .field("generation", &self.generation)
            .finish()
    }
}

impl PopupMenu {
    pub fn new(items: Vec<String>, on_select: impl FnMut(MenuSelection) + Send + 'static) -> Self {
        Self {
            items,
            on_select: Box::new(on_select),
            session: None,
            listeners: ListenerState::Detached,
            generation: 0,
        }
    }

    /// Open the menu at `(x, y)` for `target_id`.
    ///
    /// Returns the arming token to hand back to
    /// [`listeners_armed`](Self::listeners_armed) on the next turn, or `None`
    /// if the menu was already open.
    pub fn display_menu(&mut self, x: f64, y: f64, target_id: &str) -> Option<u64> {
        if self.session.is_some() {
            trace!("Menu already open, ignoring display at ({}, {})", x, y);
            return None;
        }
        self.generation += 1;
        self.session = Some(MenuSession {
            anchor: Point::new(x, y),
            target_id: target_id.to_string(),
            focused: None,
            highlighted: None,
        });
        self.listeners = ListenerState::Arming;
        debug!("Menu opened for '{}' at ({}, {})", target_id, x, y);
        Some(self.generation)
    }

    /// Deferred listener registration for the open identified by `token`
    pub fn listeners_armed(&mut self, token: u64) {
        if self.listeners == ListenerState::Arming && token == self.generation {
            self.listeners = ListenerState::Attached;
        }
    }

    pub fn listener_state(&self) -> ListenerState {
        self.listeners
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.focused)
    }

    pub fn target_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.target_id.as_str())
    }

    /// Keyboard event while listeners are attached.
    ///
    /// Returns true if the key was consumed and its default page behaviour
    /// must be suppressed.
    pub fn handle_key(&mut self, key: &InputKey) -> bool {
        if self.listeners != ListenerState::Attached || self.session.is_none() {
            return false;
        }
        match key {
            InputKey::Down => {
                self.focus_next();
                true
            }
            InputKey::Up => {
                self.focus_previous();
                true
            }
            InputKey::Enter => {
                if let Some(index) = self.focused_index() {
                    self.activate(index);
                }
                true
            }
            InputKey::Esc => {
                self.hide_menu();
                true
            }
            _ => false,
        }
    }

    /// Pointer pressed somewhere on the page
    pub fn handle_pointer_down(&mut self, inside_menu: bool) {
        if self.listeners == ListenerState::Attached && self.session.is_some() && !inside_menu {
            debug!("Outside click closes menu");
            self.hide_menu();
        }
    }

    pub fn item_hovered(&mut self, index: usize) {
        if index < self.items.len() {
            self.focus(index);
        }
    }

    /// Pointer left an item: its highlight goes, focus stays
    pub fn item_left(&mut self, index: usize) {
        if let Some(session) = self.session.as_mut() {
            if session.highlighted == Some(index) {
                session.highlighted = None;
            }
        }
    }

    pub fn item_clicked(&mut self, index: usize) {
        if self.session.is_some() && index < self.items.len() {
            self.activate(index);
        }
    }

    /// Close without selection; no-op when already closed
    pub fn hide_menu(&mut self) {
        if self.session.take().is_some() {
            trace!("Menu closed");
        }
        self.listeners = ListenerState::Detached;
    }

    pub fn view(&self) -> Option<MenuView> {
        let session = self.session.as_ref()?;
        Some(MenuView {
            anchor: session.anchor,
            target_id: session.target_id.clone(),
            focused: session.focused,
            items: self
                .items
                .iter()
                .enumerate()
                .map(|(i, label)| MenuItemView {
                    label: label.clone(),
                    highlighted: session.highlighted == Some(i),
                })
                .collect(),
        })
    }

    fn focus(&mut self, index: usize) {
        if let Some(session) = self.session.as_mut() {
            session.focused = Some(index);
            session.highlighted = Some(index);
        }
    }

    fn focus_next(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let next = match self.focused_index() {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.focus(next);
    }

    fn focus_previous(&mut self) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let previous = match self.focused_index() {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.focus(previous);
    }

    fn activate(&mut self, index: usize) {
        let Some(target_id) = self.target_id().map(str::to_string) else {
            return;
        };
        (self.on_select)(MenuSelection { index, target_id });
        self.hide_menu();
    }
}
