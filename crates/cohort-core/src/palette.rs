//! # Group Palette
//!
//! Deterministic colour labels for groups: the ten tab10 colours followed by
//! the twelve Set3 colours, cycled when more groups are requested.

use serde::Serialize;
use std::fmt;

/// tab10 then Set3, as `#rrggbb`.
pub const PALETTE: [&str; 22] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462",
    "#b3de69", "#fccde5", "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

/// A palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Color(&'static str);

impl Color {
    /// The `#rrggbb` token.
    #[must_use]
    pub fn hex(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The first `count` palette colours, wrapping around after 22.
#[must_use]
pub fn colors(count: usize) -> Vec<Color> {
    PALETTE.iter().copied().cycle().take(count).map(Color).collect()
}

/// Colours for several populations at once.
///
/// Population `p` gets the colours following those of populations `0..p`, so
/// two populations only share a colour once the palette wraps.
#[must_use]
pub fn assign(group_counts: &[usize]) -> Vec<Vec<Color>> {
    let total: usize = group_counts.iter().sum();
    let mut all = colors(total).into_iter();
    group_counts
        .iter()
        .map(|&count| all.by_ref().take(count).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_starts_with_tab10_then_set3() {
        let first = colors(11);
        assert_eq!(first[0].hex(), "#1f77b4");
        assert_eq!(first[9].hex(), "#17becf");
        assert_eq!(first[10].hex(), "#8dd3c7");
    }

    #[test]
    fn palette_cycles() {
        let many = colors(PALETTE.len() + 2);
        assert_eq!(many[PALETTE.len()], many[0]);
        assert_eq!(many[PALETTE.len() + 1].to_string(), "#ff7f0e");
        assert!(colors(0).is_empty());
    }

    #[test]
    fn populations_get_consecutive_offsets() {
        let assigned = assign(&[3, 2]);
        assert_eq!(assigned.len(), 2);
        assert_eq!(assigned[0], colors(3));
        assert_eq!(assigned[1][0].hex(), "#d62728");
        assert_eq!(assigned[1][1].hex(), "#9467bd");
    }

    #[test]
    fn color_serializes_as_hex_string() {
        let json = serde_json::to_string(&colors(1)).expect("serialize");
        assert_eq!(json, r##"["#1f77b4"]"##);
    }
}
