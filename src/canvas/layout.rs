//! Geometry of a rendered note, used to resolve a bare canvas point to the
//! target a pointer event would have landed on.

use super::{NotePart, Target};
use crate::entity::{Note, Point};

pub const HEADER_HEIGHT: f64 = 32.0;
pub const RESIZE_HANDLE_SIZE: f64 = 12.0;

/// Resolve `point` against the topmost note under it. Notes painted later win
/// ties in stacking order.
pub fn hit_test(notes: &[Note], point: Point) -> Target {
    let hit = notes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.contains(point))
        .max_by_key(|(index, n)| (n.z_index, *index))
        .map(|(_, n)| n);

    match hit {
        Some(note) => Target::Note {
            id: note.id.clone(),
            part: part_at(note, point),
        },
        None => Target::Background,
    }
}

fn part_at(note: &Note, point: Point) -> NotePart {
    // The handle is the lower-right triangle of the bottom-right square.
    let lx = point.x - (note.x + note.width - RESIZE_HANDLE_SIZE);
    let ly = point.y - (note.y + note.height - RESIZE_HANDLE_SIZE);
    if lx >= 0.0 && ly >= 0.0 && lx + ly >= RESIZE_HANDLE_SIZE {
        return NotePart::ResizeHandle;
    }

    if point.y < note.y + HEADER_HEIGHT {
        NotePart::Chrome
    } else {
        NotePart::Content
    }
}
