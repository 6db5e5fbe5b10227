//! Shortcut bindings: a button chord, an action, a payload
//!
//! A chord is the *set* of buttons held, but the order the user pressed them
//! in is kept for display. Equality, hashing and the total order all go
//! through the sorted, deduplicated button set, so `{A,B}` and `{B,A}` are
//! the same binding.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::target::ShortcutTarget;

/// A single input button, namespaced by device class so keyboard, mouse and
/// gamepad buttons share one identifier space and one ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonId(pub u64);

impl ButtonId {
    const KEYBOARD: u64 = 0x1_0000_0000;
    const MOUSE: u64 = 0x2_0000_0000;
    const GAMEPAD: u64 = 0x3_0000_0000;

    pub fn keyboard(code: u16) -> Self {
        Self(Self::KEYBOARD | u64::from(code))
    }

    pub fn mouse(button: u8) -> Self {
        Self(Self::MOUSE | u64::from(button))
    }

    pub fn gamepad(button: u16) -> Self {
        Self(Self::GAMEPAD | u64::from(button))
    }
}

/// The set of simultaneously-held buttons that triggers a shortcut.
///
/// Press order is preserved for display only; it never participates in
/// comparison or hashing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonChord {
    buttons: Vec<ButtonId>,
}

impl ButtonChord {
    pub fn new<I: IntoIterator<Item = ButtonId>>(buttons: I) -> Self {
        Self {
            buttons: buttons.into_iter().collect(),
        }
    }

    /// Buttons in the order the user pressed them (for UI display).
    pub fn buttons(&self) -> &[ButtonId] {
        &self.buttons
    }

    /// Canonical form: sorted, duplicates removed.
    pub fn normalized(&self) -> Vec<ButtonId> {
        let mut set = self.buttons.clone();
        set.sort_unstable();
        set.dedup();
        set
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}

impl PartialEq for ButtonChord {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for ButtonChord {}

impl Hash for ButtonChord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl Ord for ButtonChord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl PartialOrd for ButtonChord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Action-specific payload carried by a binding.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionData {
    #[default]
    None,
    /// Numeric command id interpreted by the action
    Command(u64),
    /// Entities the action applies to
    Target(ShortcutTarget),
    /// Free-form data (e.g. a chat message to send)
    Text(String),
}

/// One configured binding: chord + action index + payload + suppress flag.
///
/// `suppress` means the triggering input event is consumed and not passed on
/// to other applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortcut {
    /// Which logical action this binding serves
    pub index: i32,
    pub chord: ButtonChord,
    #[serde(default)]
    pub data: ActionData,
    #[serde(default)]
    pub suppress: bool,
}

impl Shortcut {
    pub fn new(index: i32, chord: ButtonChord, data: ActionData, suppress: bool) -> Self {
        Self {
            index,
            chord,
            data,
            suppress,
        }
    }

    /// A binding is server-specific iff its payload targets concrete users
    /// or channels. Command and text payloads never are.
    pub fn is_server_specific(&self) -> bool {
        match &self.data {
            ActionData::Target(target) => target.is_server_specific(),
            _ => false,
        }
    }
}

impl PartialEq for Shortcut {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.chord == other.chord
            && self.data == other.data
            && self.suppress == other.suppress
    }
}

impl Eq for Shortcut {}

impl Hash for Shortcut {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.chord.hash(state);
        self.data.hash(state);
        self.suppress.hash(state);
    }
}

impl Ord for Shortcut {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then_with(|| self.chord.cmp(&other.chord))
            .then_with(|| self.data.cmp(&other.data))
            .then_with(|| self.suppress.cmp(&other.suppress))
    }
}

impl PartialOrd for Shortcut {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find bindings that share a chord but serve different actions.
///
/// Returns index pairs into `shortcuts`. Unbound shortcuts (empty chords)
/// never conflict. One sort plus one adjacent-pair pass, no pairwise scan.
pub fn find_chord_conflicts(shortcuts: &[Shortcut]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..shortcuts.len()).collect();
    order.sort_unstable_by(|&a, &b| {
        shortcuts[a]
            .chord
            .cmp(&shortcuts[b].chord)
            .then_with(|| shortcuts[a].index.cmp(&shortcuts[b].index))
    });

    let mut conflicts = Vec::new();
    for pair in order.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if !shortcuts[a].chord.is_empty()
            && shortcuts[a].chord == shortcuts[b].chord
            && shortcuts[a].index != shortcuts[b].index
        {
            conflicts.push((a, b));
        }
    }
    conflicts
}
