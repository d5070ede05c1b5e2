//! UTF-16 code unit arithmetic shared by both codecs.

pub(crate) const HIGH_SURROGATE_START: u16 = 0xD800;
pub(crate) const LOW_SURROGATE_START: u16 = 0xDC00;
const SURROGATE_END: u16 = 0xDFFF;
const SUPPLEMENTARY_START: u32 = 0x1_0000;

#[inline]
pub(crate) fn is_surrogate(unit: u16) -> bool {
    (HIGH_SURROGATE_START..=SURROGATE_END).contains(&unit)
}

#[inline]
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (HIGH_SURROGATE_START..LOW_SURROGATE_START).contains(&unit)
}

#[inline]
pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (LOW_SURROGATE_START..=SURROGATE_END).contains(&unit)
}

/// Splits a supplementary code point into its high and low surrogates.
///
/// `code_point` must lie in `0x10000..=0x10FFFF`.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn split_supplementary(code_point: u32) -> (u16, u16) {
    debug_assert!((SUPPLEMENTARY_START..=0x10_FFFF).contains(&code_point));
    let offset = code_point - SUPPLEMENTARY_START;
    (
        HIGH_SURROGATE_START + (offset >> 10) as u16,
        LOW_SURROGATE_START + (offset & 0x3FF) as u16,
    )
}

/// Inverse of [`split_supplementary`].
#[inline]
pub(crate) fn combine_surrogates(high: u16, low: u16) -> u32 {
    debug_assert!(is_high_surrogate(high) && is_low_surrogate(low));
    SUPPLEMENTARY_START
        + ((u32::from(high - HIGH_SURROGATE_START) << 10) | u32::from(low - LOW_SURROGATE_START))
}
