//! Wire format constants shared by the codecs.

/// Member id terminating an object body.
pub const END_STRUCTURE_ID: u16 = 0;
/// Largest member id the framing codec can write.
pub const MAX_MEMBER_ID: u16 = 511;
/// Member ids above this use the long (9-bit) form.
pub const SHORT_MEMBER_ID_MAX: u16 = 31;

/// Largest type id the framing codec can write.
pub const MAX_TYPE_ID: u16 = 32767;
/// Type ids above this use the long (15-bit) form.
pub const SHORT_TYPE_ID_MAX: u16 = 127;

/// Type index written for a null object.
pub const NULL_TYPE_INDEX: u16 = 0;
/// Largest type index the framing codec can write.
pub const MAX_TYPE_INDEX: u16 = 127;
/// Type indexes above this use the long (7-bit) form.
pub const SHORT_TYPE_INDEX_MAX: u16 = 7;

/// Deepest nesting of object bodies the codecs accept.
pub const MAX_OBJECT_DEPTH: usize = 128;

/// Largest array length the framing codec can write.
pub const MAX_ARRAY_LENGTH: usize = (1 << 20) - 1;

/// Longest string, in characters or UTF-8 bytes.
pub const MAX_STRING_LENGTH: usize = 32767;
/// String lengths above this use the long (15-bit) form.
pub const SHORT_STRING_LENGTH_MAX: usize = 127;
/// Width of the string encoding selector.
pub const STRING_SELECTOR_BITS: u32 = 3;
/// Selector for the UTF-8 fallback.
pub const UTF8_SELECTOR: u8 = 0;

/// Width of the lossy float band selector.
pub const FLOAT_SELECTOR_BITS: u32 = 3;
/// Selector meaning "stored losslessly".
pub const LOSSLESS_FLOAT_SELECTOR: u8 = 0;
/// Magnitudes below this are stored losslessly.
pub const LOSSY_FLOAT_MIN: f32 = 0.0078125;
/// Magnitudes above this are stored losslessly.
pub const LOSSY_FLOAT_MAX: f32 = 1023.99;

/// One quantization band of the lossy float encoding.
#[derive(Debug, Clone, Copy)]
pub struct FloatBand {
    pub selector: u8,
    /// Magnitudes strictly above this fall into the band.
    pub lower: f32,
    pub multiplier: f32,
    pub bits: u32,
}

impl FloatBand {
    /// Largest code representable in the band.
    pub fn max_code(&self) -> u64 {
        (1u64 << self.bits) - 1
    }
}

/// Bands ordered from the largest magnitudes down.
pub const FLOAT_BANDS: [FloatBand; 7] = [
    FloatBand { selector: 1, lower: 127.999, multiplier: 128.0, bits: 17 },
    FloatBand { selector: 2, lower: 15.999, multiplier: 512.0, bits: 16 },
    FloatBand { selector: 3, lower: 1.999, multiplier: 4096.0, bits: 16 },
    FloatBand { selector: 4, lower: 0.4999, multiplier: 16384.0, bits: 15 },
    FloatBand { selector: 5, lower: 0.124999, multiplier: 65536.0, bits: 15 },
    FloatBand { selector: 6, lower: 0.03124999, multiplier: 131072.0, bits: 14 },
    FloatBand { selector: 7, lower: 0.0, multiplier: 262144.0, bits: 13 },
];

/// Look up a band by its selector.
pub fn float_band(selector: u8) -> Option<&'static FloatBand> {
    FLOAT_BANDS.iter().find(|band| band.selector == selector)
}

/// Pick the band for a magnitude already known to lie in the lossy range.
pub fn band_for(magnitude: f32) -> &'static FloatBand {
    FLOAT_BANDS
        .iter()
        .find(|band| magnitude > band.lower)
        .unwrap_or(&FLOAT_BANDS[FLOAT_BANDS.len() - 1])
}
