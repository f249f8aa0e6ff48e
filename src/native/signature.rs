//! Byte-pattern signatures with wildcard positions.

use std::fmt;
use std::str::FromStr;

use super::NativeError;

/// Opcode of `call rel32`.
const CALL_REL32: u8 = 0xE8;
/// Opcode of `jmp rel32`.
const JMP_REL32: u8 = 0xE9;

/// A byte pattern such as `48 89 5C 24 ?? 57`.
///
/// `??` (or `?`) matches any byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<Option<u8>>,
}

impl Signature {
    /// Number of bytes the pattern spans.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the pattern is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn matches_at(&self, haystack: &[u8], offset: usize) -> bool {
        self.bytes
            .iter()
            .zip(&haystack[offset..offset + self.bytes.len()])
            .all(|(want, got)| want.map_or(true, |b| b == *got))
    }

    /// Offset of the first match in `haystack`.
    pub fn find(&self, haystack: &[u8]) -> Option<usize> {
        if self.bytes.is_empty() || haystack.len() < self.bytes.len() {
            return None;
        }

        let last = haystack.len() - self.bytes.len();
        // Anchor on the first concrete byte to skip most positions cheaply.
        match self.bytes.iter().position(Option::is_some) {
            Some(anchor) => {
                let anchor_byte = self.bytes[anchor];
                (0..=last).find(|&offset| {
                    Some(haystack[offset + anchor]) == anchor_byte
                        && self.matches_at(haystack, offset)
                })
            }
            None => Some(0),
        }
    }

    /// Resolve the pattern inside a code region starting at address `base`.
    ///
    /// A match on a relative `call`/`jmp` resolves to the branch target rather
    /// than the instruction itself.
    pub fn resolve(&self, code: &[u8], base: usize) -> Option<usize> {
        let offset = self.find(code)?;
        let address = base.wrapping_add(offset);

        match code[offset] {
            CALL_REL32 | JMP_REL32 if offset + 5 <= code.len() => {
                let rel = i32::from_le_bytes([
                    code[offset + 1],
                    code[offset + 2],
                    code[offset + 3],
                    code[offset + 4],
                ]);
                Some(address.wrapping_add(5).wrapping_add_signed(rel as isize))
            }
            _ => Some(address),
        }
    }
}

impl FromStr for Signature {
    type Err = NativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s
            .split_whitespace()
            .map(|token| match token {
                "?" | "??" => Ok(None),
                hex if hex.len() == 2 => u8::from_str_radix(hex, 16)
                    .map(Some)
                    .map_err(|_| NativeError::InvalidPattern(s.to_string())),
                _ => Err(NativeError::InvalidPattern(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if bytes.is_empty() {
            return Err(NativeError::InvalidPattern(s.to_string()));
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .bytes
            .iter()
            .map(|b| b.map_or_else(|| "??".to_string(), |b| format!("{b:02X}")))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
