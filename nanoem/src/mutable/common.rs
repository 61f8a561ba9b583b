use crate::{
    common::{Buffer, Status, F128},
    utils::CodecType,
};

#[macro_export]
macro_rules! write_primitive {
    ($typ: ty, $write_typ:ident) => {
        pub fn $write_typ(&mut self, value: $typ) -> Result<(), Status> {
            self.write_byte_array(&value.to_le_bytes())
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct MutableBuffer {
    data: Vec<u8>,
}

impl MutableBuffer {
    pub fn create() -> Result<MutableBuffer, Status> {
        Self::create_with_reserved_size(2 << 12)
    }

    pub fn create_with_reserved_size(capacity: usize) -> Result<MutableBuffer, Status> {
        let mut buffer = MutableBuffer { data: Vec::new() };
        buffer.ensure_size(capacity)?;
        Ok(buffer)
    }

    fn ensure_size(&mut self, required: usize) -> Result<(), Status> {
        self.data
            .try_reserve(required)
            .map_err(|_| Status::ErrorReallocFailed)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_byte_array(&mut self, data: &[u8]) -> Result<(), Status> {
        self.ensure_size(data.len())?;
        self.data.extend_from_slice(data);
        Ok(())
    }

    pub fn write_byte(&mut self, value: u8) -> Result<(), Status> {
        self.write_byte_array(&[value])
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), Status> {
        self.write_byte(value as u8)
    }

    write_primitive!(u16, write_u16_little_endian);
    write_primitive!(u32, write_u32_little_endian);
    write_primitive!(i32, write_i32_little_endian);
    write_primitive!(f32, write_f32_little_endian);

    pub fn write_string(&mut self, value: &str, codec_type: CodecType) -> Result<(), Status> {
        let (bytes, _, had_errors) = codec_type.get_encoding_object().encode(value);
        if had_errors {
            self.write_u32_little_endian(0u32)?;
            Err(Status::ErrorEncodeUnicodeStringFailed)
        } else {
            self.write_u32_little_endian(bytes.len() as u32)?;
            self.write_byte_array(&bytes)
        }
    }

    pub fn write_interpolation(&mut self, value: [u8; 4]) -> Result<(), Status> {
        self.write_byte_array(&value)
    }

    pub fn write_f32_3_little_endian(&mut self, value: F128) -> Result<(), Status> {
        self.write_f32_little_endian(value.0[0])?;
        self.write_f32_little_endian(value.0[1])?;
        self.write_f32_little_endian(value.0[2])
    }

    pub fn write_f32_4_little_endian(&mut self, value: F128) -> Result<(), Status> {
        self.write_f32_3_little_endian(value)?;
        self.write_f32_little_endian(value.0[3])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn create_buffer_object(self) -> Buffer {
        Buffer::create(self.data)
    }
}

#[test]
fn test_write_then_read_primitives() {
    let mut buffer = MutableBuffer::create().unwrap();
    buffer.write_u32_little_endian(0xdead_beef).unwrap();
    buffer.write_f32_little_endian(1.5f32).unwrap();
    buffer.write_string("センター", CodecType::Utf8).unwrap();
    buffer.write_bool(true).unwrap();
    let mut reader = buffer.create_buffer_object();
    assert_eq!(Ok(0xdead_beef), reader.read_u32_little_endian());
    assert_eq!(Ok(1.5f32), reader.read_f32_little_endian());
    assert_eq!(Ok("センター".to_owned()), reader.read_string(CodecType::Utf8));
    assert_eq!(Ok(true), reader.read_bool());
    assert!(reader.is_end());
}
