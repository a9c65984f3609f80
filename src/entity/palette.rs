//! Preset note colors and the popover that picks between them.

pub const DEFAULT_COLOR: &str = "#fef08a";

pub const PRESET_COLORS: [&str; 10] = [
    "#fef08a", // yellow
    "#fbbf24", // amber
    "#fb7185", // rose
    "#a78bfa", // purple
    "#60a5fa", // blue
    "#34d399", // emerald
    "#f97316", // orange
    "#ec4899", // pink
    "#8b5cf6", // violet
    "#06b6d4", // cyan
];

/// Resolve a user-supplied color to a preset, either by palette index
/// (`"0"`..`"9"`) or by hex value (case-insensitive).
pub fn resolve_preset(input: &str) -> Option<&'static str> {
    if let Ok(index) = input.parse::<usize>() {
        return PRESET_COLORS.get(index).copied();
    }
    let wanted = input.trim().to_lowercase();
    PRESET_COLORS.iter().copied().find(|c| *c == wanted)
}

/// Open/closed state of a note's palette popover
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorPicker {
    open: bool,
}

impl ColorPicker {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Pick the swatch at `index`, closing the popover. Returns `None` and
    /// leaves the popover alone when it is closed or the index is out of range.
    pub fn select(&mut self, index: usize) -> Option<&'static str> {
        if !self.open {
            return None;
        }
        let color = PRESET_COLORS.get(index).copied()?;
        self.open = false;
        Some(color)
    }
}
