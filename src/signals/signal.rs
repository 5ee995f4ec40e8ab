//! Named lifecycle checkpoints.

use std::fmt;

/// A named checkpoint on an element's signal bus.
///
/// Success-path order for one element:
/// ```text
/// ReadyToUpgrade ─► Upgraded ─► Built ─► Mounted ─► RenderStart ─► LoadStart ─► LoadEnd ─► IniLoad
/// ```
/// `Unload` is signalled by an unlayout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// The behavior class is known (element is no longer a stub).
    ReadyToUpgrade,
    /// Behavior resolution completed.
    Upgraded,
    Built,
    Mounted,
    RenderStart,
    LoadStart,
    LoadEnd,
    /// Initial content finished loading.
    IniLoad,
    Unload,
}

impl Signal {
    /// Checkpoints belonging to a single layout pass.
    ///
    /// These return to pending whenever the element is reset for a fresh mount.
    pub const PER_PASS: [Signal; 5] = [
        Signal::Mounted,
        Signal::RenderStart,
        Signal::LoadStart,
        Signal::LoadEnd,
        Signal::IniLoad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::ReadyToUpgrade => "ready-upgrade",
            Signal::Upgraded => "upgraded",
            Signal::Built => "built",
            Signal::Mounted => "mounted",
            Signal::RenderStart => "render-start",
            Signal::LoadStart => "load-start",
            Signal::LoadEnd => "load-end",
            Signal::IniLoad => "ini-load",
            Signal::Unload => "unload",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
