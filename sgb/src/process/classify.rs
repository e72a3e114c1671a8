//! Positional stream classification.
//!
//! Puppeteer sound banks lay streams out in fixed-size groups, three per
//! cue in every bank seen so far: background music first, then an ambient
//! bed, then a spoken demo track. Roles therefore follow from directory
//! position alone, no payload inspection involved.

use std::fmt;

/// Semantic role of a stream, derived from its directory position.
///
/// Ordering follows the in-group position so sorted output listings read
/// in bank order, with `Unknown` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AudioType {
    Music,
    Ambient,
    Demo,
    Unknown,
}

impl AudioType {
    /// Lowercase name as used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            AudioType::Music => "music",
            AudioType::Ambient => "ambient",
            AudioType::Demo => "demo",
            AudioType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AudioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positional role lookup: `roles[index % group_size]`.
///
/// Classification is total. Positions past the directory, positions in a
/// trailing incomplete group and positions without a table entry all map
/// to [`AudioType::Unknown`] rather than failing, so one odd bank layout
/// never stops an extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    group_size: usize,
    roles: Vec<AudioType>,
}

impl Default for RoleTable {
    /// The layout of every known Puppeteer bank: groups of three.
    fn default() -> Self {
        Self::new(3, vec![AudioType::Music, AudioType::Ambient, AudioType::Demo])
    }
}

impl RoleTable {
    pub fn new(group_size: usize, roles: Vec<AudioType>) -> Self {
        Self { group_size, roles }
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Role of the stream at `index` in a directory of `total` streams.
    pub fn classify(&self, index: usize, total: usize) -> AudioType {
        if self.group_size == 0 || index >= total {
            return AudioType::Unknown;
        }

        // A group cut short by the end of the directory does not follow
        // the usual layout, so none of its positions get a role.
        let group_start = index - index % self.group_size;
        if group_start + self.group_size > total {
            return AudioType::Unknown;
        }

        self.roles
            .get(index % self.group_size)
            .copied()
            .unwrap_or(AudioType::Unknown)
    }
}

#[test]
fn classifies_group_positions() {
    let table = RoleTable::default();

    assert_eq!(table.classify(0, 3), AudioType::Music);
    assert_eq!(table.classify(1, 3), AudioType::Ambient);
    assert_eq!(table.classify(2, 3), AudioType::Demo);
    assert_eq!(table.classify(3, 6), AudioType::Music);
    assert_eq!(table.classify(5, 6), AudioType::Demo);
}

#[test]
fn out_of_range_positions_are_unknown() {
    let table = RoleTable::default();

    assert_eq!(table.classify(0, 0), AudioType::Unknown);
    assert_eq!(table.classify(3, 3), AudioType::Unknown);
    assert_eq!(table.classify(100, 3), AudioType::Unknown);
}

#[test]
fn trailing_incomplete_group_is_unknown() {
    let table = RoleTable::default();

    assert_eq!(table.classify(2, 5), AudioType::Demo);
    assert_eq!(table.classify(3, 5), AudioType::Unknown);
    assert_eq!(table.classify(4, 5), AudioType::Unknown);
}

#[test]
fn short_role_list_pads_with_unknown() {
    let table = RoleTable::new(4, vec![AudioType::Music, AudioType::Ambient]);

    assert_eq!(table.classify(0, 4), AudioType::Music);
    assert_eq!(table.classify(1, 4), AudioType::Ambient);
    assert_eq!(table.classify(2, 4), AudioType::Unknown);
    assert_eq!(table.classify(3, 4), AudioType::Unknown);
}

#[test]
fn degenerate_tables_never_panic() {
    let empty = RoleTable::new(0, Vec::new());
    for index in 0..8 {
        assert_eq!(empty.classify(index, 8), AudioType::Unknown);
    }

    let single = RoleTable::new(1, vec![AudioType::Music]);
    assert_eq!(single.classify(7, 8), AudioType::Music);
}

#[test]
fn role_order_matches_bank_layout() {
    assert!(AudioType::Music < AudioType::Ambient);
    assert!(AudioType::Ambient < AudioType::Demo);
    assert!(AudioType::Demo < AudioType::Unknown);
}

#[test]
fn display_is_lowercase() {
    assert_eq!(AudioType::Music.to_string(), "music");
    assert_eq!(AudioType::Unknown.to_string(), "unknown");
}
