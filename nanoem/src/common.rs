use std::mem::size_of;

use crate::utils::CodecType;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Status {
    Unknown = -1, //< Unknown
    Success,
    ErrorMallocFailed,                 //< Failed to allocate memory
    ErrorReallocFailed,                //< Failed to allocate memory
    ErrorNullObject,                   //< Null object is referred
    ErrorBufferEnd,                    //< Buffer is end
    ErrorDecodeUnicodeStringFailed,    //< Failed to decode unicode string
    ErrorEncodeUnicodeStringFailed,    //< Failed to encode unicode string
    ErrorBufferNotEnd,                 //< Costum, Finish Loading but Buffer is not End
    ErrorInvalidSignature = 100,       //< Invalid signature
    ErrorMotionTargetNameCorrupted,    //< Target name is corrupted
    ErrorMotionBoneKeyframeCorrupted,  //< The bone keyframe is corrupted
    ErrorMotionCameraKeyframeCorrupted, //< The camera keyframe data is corrupted
    ErrorMotionLightKeyframeCorrupted, //< The light keyframe data is corrupted
    ErrorMotionModelKeyframeCorrupted, //< The model keyframe data is corrupted
    ErrorMotionMorphKeyframeCorrupted, //< The morph keyframe data is corrupted
    ErrorMotionSelfShadowKeyframeCorrupted, //< Self Shadow keyframe data is corrupted
    ErrorMotionAccessoryKeyframeCorrupted, //< Costum, The accessory keyframe is corrupted
    ErrorMotionBoneKeyframeAlreadyExists = 201, //< The bone keyframe already exists
    ErrorMotionBoneKeyframeNotFound,   //< The bone keyframe is not found
    ErrorMotionCameraKeyframeAlreadyExists = 204, //< The camera keyframe already exists
    ErrorMotionCameraKeyframeNotFound, //< The camera keyframe is not found
    ErrorMotionLightKeyframeAlreadyExists = 207, //< The light keyframe already exists
    ErrorMotionLightKeyframeNotFound,  //< The light keyframe is not found
    ErrorMotionModelKeyframeAlreadyExists = 210, //< The model keyframe already exists
    ErrorMotionModelKeyframeNotFound,  //< The model keyframe is not found
    ErrorMotionMorphKeyframeAlreadyExists = 213, //< The morph keyframe already exists
    ErrorMotionMorphKeyframeNotFound,  //< The morph keyframe is not found
    ErrorMotionSelfShadowKeyframeAlreadyExists = 216, //< The self shadow keyframe already exists
    ErrorMotionSelfShadowKeyframeNotFound, //< The self shadow keyframe is not found
    ErrorMotionAccessoryKeyframeAlreadyExists = 219, //< The accessory keyframe already exists
    ErrorMotionAccessoryKeyframeNotFound, //< The accessory keyframe is not found
    ErrorModelConstraintStateAlreadyExists = 225, //< IK keyframe already exists
    ErrorModelConstraintStateNotFound, //< IK keyframe not found
    ErrorModelBindingAlreadyExists = 228, //< Outside parent model keyframe already exists
    ErrorModelBindingNotFound,         //< Outside parent model keyframe is not found
}

impl Status {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[repr(align(16))]
pub struct F128(pub [f32; 4]);

impl From<[f32; 4]> for F128 {
    fn from(v: [f32; 4]) -> Self {
        Self(v)
    }
}

#[macro_export]
macro_rules! read_primitive {
    ($typ: ty, $read_typ:ident) => {
        pub fn $read_typ(&mut self) -> Result<$typ, Status> {
            let typ_len = size_of::<$typ>();
            if self.can_read_len(typ_len) {
                let bytes = self.data[self.offset..self.offset + typ_len]
                    .try_into()
                    .map_err(|_| Status::ErrorBufferEnd)?;
                self.offset += typ_len;
                Ok(<$typ>::from_le_bytes(bytes))
            } else {
                Err(Status::ErrorBufferEnd)
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct Buffer {
    data: Vec<u8>,
    offset: usize,
}

impl Buffer {
    pub fn create(data: Vec<u8>) -> Buffer {
        Buffer { data, offset: 0 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn can_read_len(&self, len: usize) -> bool {
        self.len() >= self.offset && self.len() - self.offset >= len
    }

    pub fn is_end(&self) -> bool {
        self.len() <= self.offset
    }

    pub fn skip(&mut self, skip: usize) -> Result<(), Status> {
        if self.can_read_len(skip) {
            self.offset += skip;
            Ok(())
        } else {
            Err(Status::ErrorBufferEnd)
        }
    }

    pub fn read_byte(&mut self) -> Result<u8, Status> {
        if self.can_read_len(1) {
            let result = self.data[self.offset];
            self.offset += 1;
            Ok(result)
        } else {
            Err(Status::ErrorBufferEnd)
        }
    }

    pub fn read_bool(&mut self) -> Result<bool, Status> {
        Ok(self.read_byte()? != 0)
    }

    /// Reads a length prefix and checks the remaining bytes can hold it.
    pub fn read_len(&mut self) -> Result<usize, Status> {
        let len = self.read_u32_little_endian()? as usize;
        if self.can_read_len(len) {
            Ok(len)
        } else {
            Err(Status::ErrorBufferEnd)
        }
    }

    read_primitive!(u16, read_u16_little_endian);
    read_primitive!(u32, read_u32_little_endian);
    read_primitive!(i32, read_i32_little_endian);
    read_primitive!(f32, read_f32_little_endian);

    pub fn read_f32_3_little_endian(&mut self) -> Result<F128, Status> {
        Ok(F128([
            self.read_f32_little_endian()?,
            self.read_f32_little_endian()?,
            self.read_f32_little_endian()?,
            0.0f32,
        ]))
    }

    pub fn read_f32_4_little_endian(&mut self) -> Result<F128, Status> {
        Ok(F128([
            self.read_f32_little_endian()?,
            self.read_f32_little_endian()?,
            self.read_f32_little_endian()?,
            self.read_f32_little_endian()?,
        ]))
    }

    pub fn read_buffer(&mut self, len: usize) -> Result<&[u8], Status> {
        if self.can_read_len(len) {
            let result = &self.data[self.offset..self.offset + len];
            self.offset += len;
            Ok(result)
        } else {
            Err(Status::ErrorBufferEnd)
        }
    }

    pub fn read_interpolation(&mut self) -> Result<[u8; 4], Status> {
        Ok([
            self.read_byte()?,
            self.read_byte()?,
            self.read_byte()?,
            self.read_byte()?,
        ])
    }

    pub fn read_string(&mut self, codec_type: CodecType) -> Result<String, Status> {
        let len = self.read_len()?;
        let src = self.read_buffer(len)?;
        let (cow, _, had_errors) = codec_type.get_encoding_object().decode(src);
        if had_errors {
            Err(Status::ErrorDecodeUnicodeStringFailed)
        } else {
            Ok(cow.into())
        }
    }
}

#[test]
fn test_from_le_to_u16() {
    let data: [u8; 2] = [20, 16];
    assert_eq!(2, size_of::<u16>());
    assert_eq!(
        ((data[1] as u16) << 8) | data[0] as u16,
        u16::from_le_bytes(data)
    );
}

#[test]
fn test_buffer_read_primitive() {
    let mut buffer = Buffer::create(vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13]);
    assert_eq!(Ok(1), buffer.read_byte());
    assert_eq!(Ok((3 << 8) | 2), buffer.read_u16_little_endian());
    assert_eq!(
        Ok(i32::from_le_bytes([4, 5, 6, 7])),
        buffer.read_i32_little_endian()
    );
    assert_eq!(7, buffer.offset());
}

#[test]
fn test_buffer_read_past_end() {
    let mut buffer = Buffer::create(vec![1, 2, 3]);
    assert_eq!(Err(Status::ErrorBufferEnd), buffer.read_u32_little_endian());
    assert_eq!(0, buffer.offset());
    assert!(buffer.skip(3).is_ok());
    assert!(buffer.is_end());
    assert_eq!(Err(Status::ErrorBufferEnd), buffer.read_byte());
}

#[test]
fn test_buffer_read_len_overflow() {
    let mut buffer = Buffer::create(vec![255, 0, 0, 0, 1, 2]);
    assert_eq!(Err(Status::ErrorBufferEnd), buffer.read_len());
}
