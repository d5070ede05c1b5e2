//! Bjoern Hoehrmann's flexible and economical UTF-8 automaton.
//!
//! <http://bjoern.hoehrmann.de/utf-8/decoder/dfa/>
//!
//! Portions Copyright (c) 2008-2009 Bjoern Hoehrmann <bjoern@hoehrmann.de>,
//! used under the MIT license.
//!
//! The table has two regions. The first 256 entries map a byte to its class;
//! the class doubles as the number of leading bits to strip from a starter
//! byte. The remaining 108 entries are the transitions, indexed by
//! `256 + state + class`. States are multiples of 12 so that no
//! multiplication is needed to find a row.
//!
//! Classes:
//!
//! | class | bytes | role |
//! |---|---|---|
//! | 0 | `00-7F` | single byte |
//! | 1 | `80-8F` | continuation |
//! | 2 | `C2-DF` | starts a two byte sequence |
//! | 3 | `E1-EC`, `EE-EF` | starts a three byte sequence |
//! | 4 | `ED` | three bytes, second restricted to `80-9F` (no surrogates) |
//! | 5 | `F4` | four bytes, second restricted to `80-8F` (max U+10FFFF) |
//! | 6 | `F1-F3` | starts a four byte sequence |
//! | 7 | `A0-BF` | continuation |
//! | 8 | `C0-C1`, `F5-FF` | never valid |
//! | 9 | `90-9F` | continuation |
//! | 10 | `E0` | three bytes, second restricted to `A0-BF` (no overlongs) |
//! | 11 | `F0` | four bytes, second restricted to `90-BF` (no overlongs) |

/// Start state, and the state after every complete code point.
pub(crate) const ACCEPT: u8 = 0;
/// Absorbing error state.
pub(crate) const REJECT: u8 = 12;

const CLASSES: usize = 256;

#[rustfmt::skip]
static DFA: [u8; 364] = [
    // byte classes
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 00..1F
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 20..3F
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 40..5F
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0, // 60..7F
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1, 9,9,9,9,9,9,9,9,9,9,9,9,9,9,9,9, // 80..9F
    7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, 7,7,7,7,7,7,7,7,7,7,7,7,7,7,7,7, // A0..BF
    8,8,2,2,2,2,2,2,2,2,2,2,2,2,2,2, 2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2, // C0..DF
    10,3,3,3,3,3,3,3,3,3,3,3,3,4,3,3, 11,6,6,6,5,8,8,8,8,8,8,8,8,8,8,8, // E0..FF

    // transitions
     0,12,24,36,60,96,84,12,12,12,48,72, // 0: accept
    12,12,12,12,12,12,12,12,12,12,12,12, // 12: reject
    12, 0,12,12,12,12,12, 0,12, 0,12,12, // 24: one continuation left
    12,24,12,12,12,12,12,24,12,24,12,12, // 36: two left
    12,12,12,12,12,12,12,24,12,12,12,12, // 48: after E0, needs A0-BF
    12,24,12,12,12,12,12,12,12,24,12,12, // 60: after ED, needs 80-9F
    12,12,12,12,12,12,12,36,12,36,12,12, // 72: after F0, needs 90-BF
    12,36,12,12,12,12,12,36,12,36,12,12, // 84: three left
    12,36,12,12,12,12,12,12,12,12,12,12, // 96: after F4, needs 80-8F
];

/// Feeds one byte through the automaton.
///
/// Updates `code_point` in place and returns the next state. The value in
/// `code_point` is a complete scalar only when the returned state is
/// [`ACCEPT`].
#[inline(always)]
pub(crate) fn step(state: u8, code_point: &mut u32, byte: u8) -> u8 {
    let class = DFA[byte as usize];
    *code_point = if state == ACCEPT {
        (0xFF >> class) & u32::from(byte)
    } else {
        (u32::from(byte) & 0x3F) | (*code_point << 6)
    };
    DFA[CLASSES + state as usize + class as usize]
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use rstest::rstest;

    use super::{ACCEPT, DFA, REJECT, step};

    /// Runs `bytes` through the automaton and collects the scalars, or `None`
    /// on rejection or a dangling sequence.
    fn run(bytes: &[u8]) -> Option<Vec<u32>> {
        let mut state = ACCEPT;
        let mut cp = 0;
        let mut out = Vec::new();
        for &b in bytes {
            state = step(state, &mut cp, b);
            match state {
                ACCEPT => out.push(cp),
                REJECT => return None,
                _ => {}
            }
        }
        (state == ACCEPT).then_some(out)
    }

    #[test]
    fn transitions_stay_in_table() {
        for &next in &DFA[256..] {
            assert_eq!(next % 12, 0);
            assert!(usize::from(next) + 11 < DFA.len() - 256);
        }
        assert!(DFA[..256].iter().all(|&class| class <= 11));
    }

    #[test]
    fn reject_is_absorbing() {
        let mut cp = 0;
        for b in 0..=u8::MAX {
            assert_eq!(step(REJECT, &mut cp, b), REJECT);
        }
    }

    #[rstest]
    #[case(&[0x41], &[0x41])]
    #[case(&[0xC2, 0xA2], &[0xA2])]
    #[case(&[0xE2, 0x82, 0xAC], &[0x20AC])]
    #[case(&[0xF0, 0x9F, 0x9A, 0x80], &[0x1F680])]
    #[case(&[0xF4, 0x8F, 0xBF, 0xBF], &[0x10FFFF])]
    #[case(&[0xED, 0x9F, 0xBF], &[0xD7FF])]
    #[case(&[0xEE, 0x80, 0x80], &[0xE000])]
    fn decodes_scalars(#[case] bytes: &[u8], #[case] expected: &[u32]) {
        assert_eq!(run(bytes).as_deref(), Some(expected));
    }

    #[rstest]
    #[case::overlong_nul(&[0xC0, 0x80])]
    #[case::overlong_slash(&[0xE0, 0x80, 0xAF])]
    #[case::overlong_four(&[0xF0, 0x8F, 0xBF, 0xBF])]
    #[case::surrogate_high(&[0xED, 0xA0, 0x80])]
    #[case::surrogate_low(&[0xED, 0xBF, 0xBF])]
    #[case::beyond_max(&[0xF4, 0x90, 0x80, 0x80])]
    #[case::f5(&[0xF5, 0x80, 0x80, 0x80])]
    #[case::ff(&[0xFF])]
    #[case::lone_continuation(&[0x80])]
    #[case::starter_then_ascii(&[0xE2, 0x41])]
    fn rejects(#[case] bytes: &[u8]) {
        assert_eq!(run(bytes), None);
    }

    #[test]
    fn agrees_with_core_on_all_two_byte_inputs() {
        for a in 0..=u8::MAX {
            for b in 0..=u8::MAX {
                let input = [a, b];
                let expected = core::str::from_utf8(&input)
                    .ok()
                    .map(|s| s.chars().map(u32::from).collect::<Vec<_>>());
                assert_eq!(run(&input), expected, "input {input:02X?}");
            }
        }
    }

    #[test]
    fn agrees_with_core_on_three_and_four_byte_starters() {
        let probes = [0x00, 0x41, 0x7F, 0x80, 0x8F, 0x90, 0x9F, 0xA0, 0xBF, 0xC0, 0xF4, 0xFF];
        for lead in 0xE0..=u8::MAX {
            for second in 0..=u8::MAX {
                for &third in &probes {
                    for &fourth in &probes {
                        let input = [lead, second, third, fourth];
                        let expected = core::str::from_utf8(&input)
                            .ok()
                            .map(|s| s.chars().map(u32::from).collect::<Vec<_>>());
                        assert_eq!(run(&input), expected, "input {input:02X?}");
                    }
                }
            }
        }
    }
}
