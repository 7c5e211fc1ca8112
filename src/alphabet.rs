// Copyright (c) 2026 n0cturne

use std::char;

/// Ordered glyph set one rain instance samples from, uniformly at random,
/// once per column per frame. Each instance owns its own alphabet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    glyphs: Vec<char>,
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

impl Alphabet {
    /// Backdrop alphabet: binary digits plus halfwidth katakana. Halfwidth
    /// forms stay one terminal cell wide.
    pub fn matrix() -> Self {
        let mut glyphs = vec!['0', '1'];
        push_range(&mut glyphs, 0xFF66, 0xFF9D);
        Self { glyphs }
    }

    /// Section-panel alphabet: binary digits plus the brand token's
    /// characters. Whitespace and control characters are dropped; an empty
    /// token degrades to plain binary.
    pub fn token(token: &str) -> Self {
        let mut glyphs = vec!['0', '1'];
        glyphs.extend(token.chars().filter(|c| !c.is_whitespace() && !c.is_control()));
        Self { glyphs }
    }

    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Column pitch for this alphabet: 2 when any glyph occupies two
    /// terminal cells, else 1. Halfwidth katakana are narrow.
    pub fn pitch(&self) -> u16 {
        if self.glyphs.iter().any(|&ch| is_wide(ch)) {
            2
        } else {
            1
        }
    }
}

// East Asian wide and emoji pictograph ranges that matter for
// user-supplied tokens.
pub(crate) fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1FAFF
    )
}
