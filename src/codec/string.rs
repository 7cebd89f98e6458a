//! Adaptive string encoding.
//!
//! Every string is written with the cheapest fixed-width character table
//! that covers all of its characters, or as UTF-8 when no table does. Tables
//! are grouped in two tracks (prose and identifiers); within a track each
//! level is a superset of the previous one, so a scan only moves forward.

use once_cell::sync::Lazy;

use super::bit_buffer::BitBuffer;
use super::wire::{
    MAX_STRING_LENGTH, SHORT_STRING_LENGTH_MAX, STRING_SELECTOR_BITS, UTF8_SELECTOR,
};
use crate::error::{DecodeError, EncodeError};

const ASCII_RANGE: usize = 128;
const NO_CODE: u8 = u8::MAX;

const PROSE_4: &str = "etaionsrhlcdumfp";
const PROSE_5: &str = "qwertzuiopasdfghjklyxcvbnm ,.'!?";
const PROSE_6: &str = "qwertzuiopasdfghjklyxcvbnmQWERTZUIOPASDFGHJKLYXCVBNM ,.-'!?\":)(+";
const IDENT_4: &str = "0123456789abcdef";
const IDENT_5: &str = "ertuiopasdfghjklycbnm0123456789_";
const IDENT_6: &str = "qwertzuiopasdfghjklyxcvbnmQWERTZUIOPASDFGHJKLYXCVBNM0123456789_.";

/// A table of exactly `2^bits` ASCII characters.
#[derive(Debug)]
pub struct EncodingSet {
    selector: u8,
    bits: u32,
    chars: Vec<u8>,
    codes: [u8; ASCII_RANGE],
}

impl EncodingSet {
    fn new(selector: u8, bits: u32, chars: Vec<u8>) -> Self {
        debug_assert_eq!(chars.len(), 1 << bits, "encoding set {selector} has the wrong size");
        let mut codes = [NO_CODE; ASCII_RANGE];
        for (code, &c) in chars.iter().enumerate() {
            codes[c as usize] = code as u8;
        }
        EncodingSet {
            selector,
            bits,
            chars,
            codes,
        }
    }

    fn from_table(selector: u8, bits: u32, table: &str) -> Self {
        Self::new(selector, bits, table.bytes().collect())
    }

    /// Selector written in front of strings using this table.
    pub fn selector(&self) -> u8 {
        self.selector
    }

    /// Width of a single character code.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn contains(&self, c: char) -> bool {
        self.code(c).is_some()
    }

    pub fn code(&self, c: char) -> Option<u8> {
        let index = c as usize;
        if index >= ASCII_RANGE {
            return None;
        }
        match self.codes[index] {
            NO_CODE => None,
            code => Some(code),
        }
    }

    fn encode(&self, buf: &mut BitBuffer, s: &str) -> Result<(), EncodeError> {
        for c in s.chars() {
            let code = self.code(c).ok_or_else(|| EncodeError::TypeMismatch {
                member: "string".into(),
                expected: format!("character of encoding set {}", self.selector),
                actual: format!("{c:?}"),
            })?;
            buf.write(code as u64, self.bits)?;
        }
        Ok(())
    }

    fn decode(&self, buf: &mut BitBuffer, len: usize) -> Result<String, DecodeError> {
        let mut out = String::with_capacity(len);
        for _ in 0..len {
            let code = buf.read(self.bits)? as usize;
            out.push(self.chars[code] as char);
        }
        Ok(out)
    }
}

/// Sets sharing one code width within a track.
#[derive(Debug)]
pub struct EncodingLevel {
    sets: Vec<EncodingSet>,
}

impl EncodingLevel {
    fn single(set: EncodingSet) -> Self {
        EncodingLevel { sets: vec![set] }
    }

    pub fn sets(&self) -> &[EncodingSet] {
        &self.sets
    }
}

/// Scan state of one track over the characters of a string.
struct TrackScan<'a> {
    levels: &'a [EncodingLevel],
    level: usize,
    valid: Vec<bool>,
}

impl<'a> TrackScan<'a> {
    fn new(levels: &'a [EncodingLevel]) -> Self {
        let valid = levels
            .first()
            .map(|l| vec![true; l.sets.len()])
            .unwrap_or_default();
        TrackScan {
            levels,
            level: 0,
            valid,
        }
    }

    fn exhausted(&self) -> bool {
        self.level >= self.levels.len()
    }

    fn abandon(&mut self) {
        self.level = self.levels.len();
    }

    /// Account for a newly seen character; `seen` holds the earlier ones.
    fn offer(&mut self, c: char, seen: &[char]) {
        while let Some(level) = self.levels.get(self.level) {
            let mut any = false;
            for (valid, set) in self.valid.iter_mut().zip(&level.sets) {
                *valid = *valid && set.contains(c);
                any |= *valid;
            }
            if any {
                return;
            }
            self.level += 1;
            if let Some(next) = self.levels.get(self.level) {
                self.valid = next
                    .sets
                    .iter()
                    .map(|set| seen.iter().all(|&p| set.contains(p)))
                    .collect();
            }
        }
    }

    fn selected(&self) -> Option<&'a EncodingSet> {
        let level = self.levels.get(self.level)?;
        level
            .sets
            .iter()
            .zip(&self.valid)
            .find(|(_, valid)| **valid)
            .map(|(set, _)| set)
    }
}

/// The two tracks of encoding tables.
#[derive(Debug)]
pub struct StringEncoder {
    prose: Vec<EncodingLevel>,
    identifier: Vec<EncodingLevel>,
}

impl StringEncoder {
    fn new() -> Self {
        let full_ascii = EncodingSet::new(7, 7, (0..ASCII_RANGE as u8).collect());
        StringEncoder {
            prose: vec![
                EncodingLevel::single(EncodingSet::from_table(1, 4, PROSE_4)),
                EncodingLevel::single(EncodingSet::from_table(2, 5, PROSE_5)),
                EncodingLevel::single(EncodingSet::from_table(3, 6, PROSE_6)),
            ],
            identifier: vec![
                EncodingLevel::single(EncodingSet::from_table(4, 4, IDENT_4)),
                EncodingLevel::single(EncodingSet::from_table(5, 5, IDENT_5)),
                EncodingLevel::single(EncodingSet::from_table(6, 6, IDENT_6)),
                EncodingLevel::single(full_ascii),
            ],
        }
    }

    /// Every table of both tracks.
    pub fn sets(&self) -> impl Iterator<Item = &EncodingSet> {
        self.prose
            .iter()
            .chain(&self.identifier)
            .flat_map(|level| level.sets.iter())
    }

    /// Look up a table by selector.
    pub fn set(&self, selector: u8) -> Option<&EncodingSet> {
        self.sets().find(|set| set.selector == selector)
    }

    /// Pick the cheapest table able to encode `s`, preferring prose.
    ///
    /// `None` means the string must fall back to UTF-8.
    pub fn select(&self, s: &str) -> Option<&EncodingSet> {
        let mut prose = TrackScan::new(&self.prose);
        let mut identifier = TrackScan::new(&self.identifier);
        let mut seen_flags = [false; ASCII_RANGE];
        let mut seen = Vec::new();

        for c in s.chars() {
            let index = c as usize;
            if index >= ASCII_RANGE {
                prose.abandon();
                identifier.abandon();
                break;
            }
            if seen_flags[index] {
                continue;
            }
            prose.offer(c, &seen);
            identifier.offer(c, &seen);
            if prose.exhausted() && identifier.exhausted() {
                break;
            }
            seen_flags[index] = true;
            seen.push(c);
        }

        prose.selected().or_else(|| identifier.selected())
    }
}

static STRING_ENCODER: Lazy<StringEncoder> = Lazy::new(StringEncoder::new);

/// Shared encoding tables.
pub fn string_encoder() -> &'static StringEncoder {
    &STRING_ENCODER
}

fn write_length(buf: &mut BitBuffer, len: usize) -> Result<(), EncodeError> {
    if len <= SHORT_STRING_LENGTH_MAX {
        buf.write(0, 1)?;
        buf.write(len as u64, 7)?;
    } else {
        buf.write(1, 1)?;
        buf.write(len as u64, 15)?;
    }
    Ok(())
}

fn read_length(buf: &mut BitBuffer) -> Result<usize, DecodeError> {
    let long = buf.read(1)? == 1;
    let len = buf.read(if long { 15 } else { 7 })?;
    Ok(len as usize)
}

/// Write `s` with the cheapest available encoding.
pub fn write_string(buf: &mut BitBuffer, s: &str) -> Result<(), EncodeError> {
    let set = string_encoder().select(s);
    // Table strings are pure ASCII, so bytes and characters coincide.
    let len = s.len();
    if len > MAX_STRING_LENGTH {
        return Err(EncodeError::StringTooLong {
            len,
            max: MAX_STRING_LENGTH,
        });
    }

    match set {
        Some(set) => {
            buf.write(set.selector as u64, STRING_SELECTOR_BITS)?;
            write_length(buf, len)?;
            set.encode(buf, s)
        }
        None => {
            buf.write(UTF8_SELECTOR as u64, STRING_SELECTOR_BITS)?;
            write_length(buf, len)?;
            for b in s.bytes() {
                buf.write(b as u64, 8)?;
            }
            Ok(())
        }
    }
}

/// Read a string written by [`write_string`].
pub fn read_string(buf: &mut BitBuffer) -> Result<String, DecodeError> {
    let selector = buf.read(STRING_SELECTOR_BITS)? as u8;
    let len = read_length(buf)?;

    if selector == UTF8_SELECTOR {
        let mut bytes = Vec::with_capacity(len);
        for _ in 0..len {
            bytes.push(buf.read(8)? as u8);
        }
        return Ok(String::from_utf8(bytes)?);
    }

    let set = string_encoder()
        .set(selector)
        .ok_or(DecodeError::UnknownEncodingSet(selector))?;
    set.decode(buf, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        for set in string_encoder().sets() {
            assert_eq!(set.chars.len(), 1 << set.bits(), "set {}", set.selector());
        }
    }

    #[test]
    fn test_levels_are_supersets() {
        let encoder = string_encoder();
        for track in [&encoder.prose, &encoder.identifier] {
            for pair in track.windows(2) {
                for lower in pair[0].sets() {
                    for &c in &lower.chars {
                        assert!(
                            pair[1].sets().iter().all(|s| s.contains(c as char)),
                            "{:?} of set {} missing from the next level",
                            c as char,
                            lower.selector()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_selection() {
        let encoder = string_encoder();
        assert_eq!(encoder.select("").map(|s| s.selector()), Some(1));
        assert_eq!(encoder.select("the rain").map(|s| s.selector()), Some(2));
        assert_eq!(encoder.select("Hello, World!").map(|s| s.selector()), Some(3));
        assert_eq!(encoder.select("deadbeef42").map(|s| s.selector()), Some(4));
        assert_eq!(encoder.select("player_01").map(|s| s.selector()), Some(5));
        assert_eq!(encoder.select("Player_01.x").map(|s| s.selector()), Some(6));
        assert_eq!(encoder.select("a{b}#c").map(|s| s.selector()), Some(7));
        assert!(encoder.select("grüße").is_none());
    }

    #[test]
    fn test_advancing_level_rechecks_seen_characters() {
        // 'x' pushes the identifier track past hex; the seen 'f' must still fit.
        let set = string_encoder().select("f_x0").unwrap();
        assert_eq!(set.selector(), 6);
    }
}
