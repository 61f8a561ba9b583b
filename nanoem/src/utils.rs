pub const fn fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    u32::from_le_bytes([a, b, c, d])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    Unknown = -1,
    Sjis,
    Utf8,
    Utf16,
}

impl From<i32> for CodecType {
    fn from(value: i32) -> Self {
        match value {
            0 => CodecType::Sjis,
            1 => CodecType::Utf8,
            2 => CodecType::Utf16,
            _ => CodecType::Unknown,
        }
    }
}

impl CodecType {
    pub fn get_encoding_object(&self) -> &'static encoding_rs::Encoding {
        match self {
            CodecType::Sjis => encoding_rs::SHIFT_JIS,
            CodecType::Utf16 => encoding_rs::UTF_16LE,
            CodecType::Utf8 | CodecType::Unknown => encoding_rs::UTF_8,
        }
    }
}

#[test]
fn test_fourcc() {
    assert_eq!(1u32, fourcc(1u8, 0u8, 0u8, 0u8));
}

#[test]
fn test_codec_type_from_i32() {
    assert_eq!(CodecType::Utf8, CodecType::from(1));
    assert_eq!(CodecType::Unknown, CodecType::from(7));
}
