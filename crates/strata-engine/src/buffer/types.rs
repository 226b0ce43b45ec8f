/// What a buffer is bound as on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Per-vertex attribute records.
    Vertex,
    /// Index tuples referencing vertex records.
    Element,
}

impl BufferType {
    /// Byte alignment applied to every attribute offset and to the record size.
    ///
    /// Vertex fetch requires 4-byte aligned attributes; element records are
    /// tightly packed so they can be bound directly as an index buffer.
    #[inline]
    pub const fn attribute_alignment(self) -> usize {
        match self {
            BufferType::Vertex => 4,
            BufferType::Element => 1,
        }
    }
}

/// Numeric element type of one attribute component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeType {
    Byte,
    #[default]
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Float,
}

impl AttributeType {
    /// Size in bytes of one component.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "BYTE",
            Self::UnsignedByte => "UNSIGNED_BYTE",
            Self::Short => "SHORT",
            Self::UnsignedShort => "UNSIGNED_SHORT",
            Self::Int => "INT",
            Self::UnsignedInt => "UNSIGNED_INT",
            Self::Float => "FLOAT",
        }
    }

    /// Writes `value` into `dst[..self.size()]` in native byte order.
    ///
    /// Integer types truncate toward zero and wrap to their width; non-finite
    /// values store as 0. `Float` rounds to the nearest `f32`.
    pub(crate) fn write(self, dst: &mut [u8], value: f64) {
        let int = to_integer(value);
        let size = self.size();
        match self {
            Self::Byte => dst[..size].copy_from_slice(bytemuck::bytes_of(&(int as i8))),
            Self::UnsignedByte => dst[..size].copy_from_slice(bytemuck::bytes_of(&(int as u8))),
            Self::Short => dst[..size].copy_from_slice(bytemuck::bytes_of(&(int as i16))),
            Self::UnsignedShort => dst[..size].copy_from_slice(bytemuck::bytes_of(&(int as u16))),
            Self::Int => dst[..size].copy_from_slice(bytemuck::bytes_of(&(int as i32))),
            Self::UnsignedInt => dst[..size].copy_from_slice(bytemuck::bytes_of(&(int as u32))),
            Self::Float => dst[..size].copy_from_slice(bytemuck::bytes_of(&(value as f32))),
        }
    }

    /// Reads one component from `src[..self.size()]`.
    pub(crate) fn read(self, src: &[u8]) -> f64 {
        let bytes = &src[..self.size()];
        match self {
            Self::Byte => bytemuck::pod_read_unaligned::<i8>(bytes) as f64,
            Self::UnsignedByte => bytemuck::pod_read_unaligned::<u8>(bytes) as f64,
            Self::Short => bytemuck::pod_read_unaligned::<i16>(bytes) as f64,
            Self::UnsignedShort => bytemuck::pod_read_unaligned::<u16>(bytes) as f64,
            Self::Int => bytemuck::pod_read_unaligned::<i32>(bytes) as f64,
            Self::UnsignedInt => bytemuck::pod_read_unaligned::<u32>(bytes) as f64,
            Self::Float => bytemuck::pod_read_unaligned::<f32>(bytes) as f64,
        }
    }
}

#[inline]
fn to_integer(value: f64) -> i64 {
    if value.is_finite() { value.trunc() as i64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(ty: AttributeType, value: f64) -> f64 {
        let mut buf = [0u8; 4];
        ty.write(&mut buf, value);
        ty.read(&buf)
    }

    #[test]
    fn sizes() {
        assert_eq!(AttributeType::Byte.size(), 1);
        assert_eq!(AttributeType::UnsignedShort.size(), 2);
        assert_eq!(AttributeType::Float.size(), 4);
    }

    #[test]
    fn integer_types_truncate_toward_zero() {
        assert_eq!(round_trip(AttributeType::Short, 34.9), 34.0);
        assert_eq!(round_trip(AttributeType::Short, -34.9), -34.0);
    }

    #[test]
    fn integer_types_wrap() {
        assert_eq!(round_trip(AttributeType::UnsignedByte, 300.0), 44.0);
        assert_eq!(round_trip(AttributeType::Byte, 200.0), -56.0);
        assert_eq!(round_trip(AttributeType::UnsignedShort, -1.0), 65535.0);
    }

    #[test]
    fn non_finite_integers_store_zero() {
        assert_eq!(round_trip(AttributeType::Int, f64::NAN), 0.0);
        assert_eq!(round_trip(AttributeType::UnsignedInt, f64::INFINITY), 0.0);
    }

    #[test]
    fn float_keeps_f32_precision() {
        assert_eq!(round_trip(AttributeType::Float, 0.5), 0.5);
        assert_eq!(round_trip(AttributeType::Float, 0.1), 0.1f32 as f64);
    }

    #[test]
    fn alignment_by_buffer_type() {
        assert_eq!(BufferType::Vertex.attribute_alignment(), 4);
        assert_eq!(BufferType::Element.attribute_alignment(), 1);
    }
}
