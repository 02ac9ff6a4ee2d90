//! Key arithmetic shared by the segment maps.
//!
//! Segment keys are slot numbers: a segment of width `w` at key `k` occupies
//! slots `k..k + w`, so the next segment sits at `k + w`. Both itinerary maps
//! are re-keyed with the same functions so they can never drift apart.

use std::collections::BTreeMap;

/// Move every key above `after` down by `by`.
///
/// The caller removes the entry at `after` first; `by` is its width.
pub fn shift_down_after<V>(map: &mut BTreeMap<u32, V>, after: u32, by: u32) {
    let tail = map.split_off(&(after + 1));
    map.extend(tail.into_iter().map(|(k, v)| (k - by, v)));
}

/// Exchange two neighbouring entries.
///
/// The entry at `second` (of width `second_width`) moves to `first`, and the
/// entry at `first` moves right behind it. Returns `false`, changing nothing,
/// if either key is missing.
pub fn swap_adjacent<V>(
    map: &mut BTreeMap<u32, V>,
    first: u32,
    second: u32,
    second_width: u32,
) -> bool {
    if !map.contains_key(&first) || !map.contains_key(&second) {
        return false;
    }
    let (Some(a), Some(b)) = (map.remove(&first), map.remove(&second)) else {
        return false;
    };
    map.insert(first, b);
    map.insert(first + second_width, a);
    true
}

/// Check that keys are packed from 1 with the given widths.
///
/// Returns the next free key.
pub fn is_packed(keys_and_widths: impl IntoIterator<Item = (u32, u32)>) -> Result<u32, String> {
    let mut expected = 1;
    for (key, width) in keys_and_widths {
        if key != expected {
            return Err(format!("segment {key} should be at {expected}"));
        }
        if width == 0 {
            return Err(format!("segment {key} has no width"));
        }
        expected = key + width;
    }
    Ok(expected)
}
