#![forbid(unsafe_code)]

//! Key events to dashboard actions.
//!
//! The dispatcher never touches dashboard state. It maps a key to an
//! [`Action`] and posts it through a [`DashboardHandle`], which queues the
//! action and wakes the poll loop; the controller applies it on its next
//! tick.
//!
//! Focus buttons use Ctrl+Shift+<first letter of the label>, so a label set
//! like `top, jungle, mid, bottom, support` binds Ctrl+Shift+T, J, M, B, S.
//! Terminals without the kitty keyboard protocol cannot report that chord
//! (Ctrl+Shift+M arrives as Enter), so every label is also bound to
//! Alt+<letter> and to its position `1`..`9`.

use std::collections::HashMap;

use bitflags::bitflags;
use crossterm::event as cte;
use tracing::debug;

use teamboard_render::color::{BUTTON, HIGHLIGHT};

use crate::controller::DashboardHandle;

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Keys the dashboard can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
}

/// A key press, normalized so that letters are lowercase and an uppercase
/// letter sets [`Modifiers::SHIFT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        match code {
            KeyCode::Char(c) if c.is_uppercase() => Self {
                code: KeyCode::Char(c.to_lowercase().next().unwrap_or(c)),
                modifiers: modifiers | Modifiers::SHIFT,
            },
            _ => Self { code, modifiers },
        }
    }

    /// Plain letter or symbol.
    #[must_use]
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::NONE)
    }

    /// Ctrl+Shift+`c`, the focus button chord.
    #[must_use]
    pub fn ctrl_shift(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::CTRL | Modifiers::SHIFT)
    }

    /// Map a crossterm event. Only key presses are kept.
    #[must_use]
    pub fn from_crossterm(event: &cte::Event) -> Option<Self> {
        let cte::Event::Key(key) = event else {
            return None;
        };
        if key.kind != cte::KeyEventKind::Press {
            return None;
        }
        let code = match key.code {
            cte::KeyCode::Char(c) => KeyCode::Char(c),
            cte::KeyCode::Enter => KeyCode::Enter,
            cte::KeyCode::Esc => KeyCode::Escape,
            cte::KeyCode::Tab => KeyCode::Tab,
            cte::KeyCode::BackTab => KeyCode::BackTab,
            _ => return None,
        };
        Some(Self::new(code, map_modifiers(key.modifiers)))
    }
}

fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(cte::KeyModifiers::SUPER) {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

/// State transitions a key can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Show enrichments for this focus; `None` clears it.
    SetFocus(Option<String>),
    /// Move to the next focus label.
    CycleFocus,
    /// Redraw on the next tick even if nothing changed.
    Refresh,
    /// End the session and leave the poll loop.
    Quit,
}

/// Key bindings.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyEvent, Action>,
}

impl Keymap {
    /// Empty keymap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ctrl+C and `q` quit, `r` refreshes, Tab cycles the focus.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .bind(
                KeyEvent::new(KeyCode::Char('c'), Modifiers::CTRL),
                Action::Quit,
            )
            .bind(KeyEvent::char('q'), Action::Quit)
            .bind(KeyEvent::char('r'), Action::Refresh)
            .bind(KeyEvent::new(KeyCode::Tab, Modifiers::NONE), Action::CycleFocus)
    }

    /// Bind `key` to `action`, replacing any earlier binding.
    #[must_use]
    pub fn bind(mut self, key: KeyEvent, action: Action) -> Self {
        self.bindings.insert(key, action);
        self
    }

    /// Bind each label to focusing it: Ctrl+Shift+<first letter>,
    /// Alt+<first letter>, and the digit of its position (first nine only).
    ///
    /// A chord already bound, by an earlier label or otherwise, is left
    /// alone.
    #[must_use]
    pub fn buttons<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (position, label) in labels.into_iter().enumerate() {
            let label = label.as_ref();
            let action = Action::SetFocus(Some(label.to_owned()));
            if let Some(letter) = label.chars().next().filter(|c| c.is_alphabetic()) {
                self.bind_free(label, KeyEvent::ctrl_shift(letter), &action);
                let lower = letter.to_lowercase().next().unwrap_or(letter);
                self.bind_free(
                    label,
                    KeyEvent::new(KeyCode::Char(lower), Modifiers::ALT),
                    &action,
                );
            }
            if let Some(digit) = u32::try_from(position + 1)
                .ok()
                .and_then(|n| char::from_digit(n, 10))
            {
                self.bind_free(label, KeyEvent::char(digit), &action);
            }
        }
        self
    }

    fn bind_free(&mut self, label: &str, key: KeyEvent, action: &Action) {
        if self.bindings.contains_key(&key) {
            debug!(event = "dispatch.button_conflict", label, key = ?key);
            return;
        }
        self.bindings.insert(key, action.clone());
    }

    /// Action bound to `key`.
    #[must_use]
    pub fn lookup(&self, key: &KeyEvent) -> Option<&Action> {
        self.bindings.get(key)
    }
}

/// Focus buttons with highlighted hotkey letters.
///
/// The focused label is drawn in the accent color. Visible text is the
/// labels separated by two spaces.
#[must_use]
pub fn button_bar<S: AsRef<str>>(labels: &[S], focus: Option<&str>) -> String {
    let mut out = String::new();
    for (i, label) in labels.iter().enumerate() {
        let label = label.as_ref();
        if i > 0 {
            out.push_str("  ");
        }
        let mut chars = label.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        let mut buf = [0u8; 4];
        BUTTON.paint_into(&mut out, first.encode_utf8(&mut buf));
        let rest = chars.as_str();
        if focus == Some(label) {
            HIGHLIGHT.paint_into(&mut out, rest);
        } else {
            out.push_str(rest);
        }
    }
    out
}

/// Outcome of one dispatched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// An action was posted.
    Handled,
    /// Quit was posted; the key reader should stop.
    Quit,
    /// No binding.
    Ignored,
}

/// Posts keymap actions to a dashboard.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    keymap: Keymap,
    handle: DashboardHandle,
}

impl Dispatcher {
    #[must_use]
    pub fn new(keymap: Keymap, handle: DashboardHandle) -> Self {
        Self { keymap, handle }
    }

    pub fn dispatch(&self, key: &KeyEvent) -> Dispatch {
        let Some(action) = self.keymap.lookup(key) else {
            return Dispatch::Ignored;
        };
        debug!(event = "dispatch.key", key = ?key, action = ?action);
        let quit = *action == Action::Quit;
        self.handle.send(action.clone());
        if quit { Dispatch::Quit } else { Dispatch::Handled }
    }
}
