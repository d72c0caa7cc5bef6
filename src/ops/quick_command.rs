use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::model::{BlockType, ClockTime, QuickCommandConfig};

static QUICK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z])([0-9]{1,4})$").expect("quick command regex"));

/// A parsed quick command: "create a block of this type at this time"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickCommand {
    pub block_type: BlockType,
    pub label: String,
    pub time: ClockTime,
}

/// Letter -> (type, label) lookup for quick commands
#[derive(Debug, Clone)]
pub struct QuickCommandTable {
    entries: IndexMap<char, (BlockType, String)>,
}

impl Default for QuickCommandTable {
    fn default() -> Self {
        let mut entries = IndexMap::new();
        for (letter, block_type) in [
            ('d', BlockType::DeepWork),
            ('a', BlockType::Admin),
            ('b', BlockType::Break),
            ('m', BlockType::Meeting),
            ('p', BlockType::Personal),
            ('e', BlockType::Event),
            ('r', BlockType::Routine),
        ] {
            entries.insert(letter, (block_type, block_type.label().to_string()));
        }
        entries.insert('w', (BlockType::Personal, "Workout".to_string()));
        QuickCommandTable { entries }
    }
}

impl QuickCommandTable {
    /// Default table with config entries layered on top. Keys that are not a
    /// single ASCII letter are ignored.
    pub fn with_overrides(overrides: &IndexMap<String, QuickCommandConfig>) -> Self {
        let mut table = QuickCommandTable::default();
        for (key, entry) in overrides {
            let mut chars = key.chars();
            let (Some(letter), None) = (chars.next(), chars.next()) else {
                continue;
            };
            if !letter.is_ascii_alphabetic() {
                continue;
            }
            let label = entry
                .label
                .clone()
                .unwrap_or_else(|| entry.block_type.label().to_string());
            table
                .entries
                .insert(letter.to_ascii_lowercase(), (entry.block_type, label));
        }
        table
    }

    pub fn lookup(&self, letter: char) -> Option<(BlockType, &str)> {
        self.entries
            .get(&letter.to_ascii_lowercase())
            .map(|(t, l)| (*t, l.as_str()))
    }

    /// `(letter, type, label)` in table order
    pub fn entries(&self) -> impl Iterator<Item = (char, BlockType, &str)> {
        self.entries.iter().map(|(c, (t, l))| (*c, *t, l.as_str()))
    }

    /// Parse a token like `d930`, `m14`, `w0630`. Returns None when the token
    /// is not a quick command so the caller can fall back to the menus.
    pub fn parse(&self, input: &str) -> Option<QuickCommand> {
        let caps = QUICK_RE.captures(input.trim())?;
        let letter = caps.get(1)?.as_str().chars().next()?;
        let (block_type, label) = self.lookup(letter)?;
        let time = parse_compact_time(caps.get(2)?.as_str())?;
        Some(QuickCommand {
            block_type,
            label: label.to_string(),
            time,
        })
    }
}

/// Parse a quick command with the default table.
pub fn parse_quick_command(input: &str) -> Option<QuickCommand> {
    QuickCommandTable::default().parse(input)
}

/// Interpret 1-4 digits as a time: `H`/`HH` is a whole hour, `HMM` and
/// `HHMM` carry minutes.
pub fn parse_compact_time(digits: &str) -> Option<ClockTime> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hour, minute) = match digits.len() {
        1 | 2 => (digits, "0"),
        3 => (&digits[..1], &digits[1..]),
        4 => (&digits[..2], &digits[2..]),
        _ => return None,
    };
    ClockTime::new(hour.parse().ok()?, minute.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn t(h: u8, m: u8) -> ClockTime {
        ClockTime::new(h, m).unwrap()
    }

    #[test]
    fn parse_table() {
        assert_eq!(
            parse_quick_command("d930"),
            Some(QuickCommand {
                block_type: BlockType::DeepWork,
                label: "Deep Work".into(),
                time: t(9, 30),
            })
        );
        assert_eq!(
            parse_quick_command("m14"),
            Some(QuickCommand {
                block_type: BlockType::Meeting,
                label: "Meeting".into(),
                time: t(14, 0),
            })
        );
        assert_eq!(parse_quick_command("zz"), None);
    }

    #[test]
    fn digit_count_disambiguates() {
        assert_eq!(parse_quick_command("a9").unwrap().time, t(9, 0));
        assert_eq!(parse_quick_command("a09").unwrap().time, t(9, 0));
        assert_eq!(parse_quick_command("a915").unwrap().time, t(9, 15));
        assert_eq!(parse_quick_command("a1545").unwrap().time, t(15, 45));
        assert_eq!(parse_quick_command("w630").unwrap().time, t(6, 30));
    }

    #[test]
    fn workout_letter_is_personal() {
        let cmd = parse_quick_command("w630").unwrap();
        assert_eq!(cmd.block_type, BlockType::Personal);
        assert_eq!(cmd.label, "Workout");
    }

    #[test]
    fn rejects_out_of_range_and_malformed() {
        assert_eq!(parse_quick_command("d2400"), None);
        assert_eq!(parse_quick_command("d975"), None);
        assert_eq!(parse_quick_command("d25"), None);
        assert_eq!(parse_quick_command("d12345"), None);
        assert_eq!(parse_quick_command("d"), None);
        assert_eq!(parse_quick_command("930"), None);
        assert_eq!(parse_quick_command("x930"), None);
        assert_eq!(parse_quick_command("dd930"), None);
    }

    #[test]
    fn letter_is_case_insensitive_and_trimmed() {
        assert_eq!(parse_quick_command(" D930 ").unwrap().time, t(9, 30));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = IndexMap::new();
        overrides.insert(
            "d".to_string(),
            QuickCommandConfig {
                block_type: BlockType::Admin,
                label: Some("Desk".into()),
            },
        );
        overrides.insert(
            "x".to_string(),
            QuickCommandConfig {
                block_type: BlockType::Break,
                label: None,
            },
        );
        overrides.insert(
            "long".to_string(),
            QuickCommandConfig {
                block_type: BlockType::Break,
                label: None,
            },
        );
        let table = QuickCommandTable::with_overrides(&overrides);
        let d = table.parse("d10").unwrap();
        assert_eq!((d.block_type, d.label.as_str()), (BlockType::Admin, "Desk"));
        let x = table.parse("x10").unwrap();
        assert_eq!((x.block_type, x.label.as_str()), (BlockType::Break, "Break"));
        assert_eq!(table.entries().count(), 9);
    }
}
