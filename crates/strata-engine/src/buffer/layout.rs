//! Record layouts for structured buffers.
//!
//! A [`BufferLayout`] fixes the byte offset of every named attribute inside one
//! record. Offsets are assigned in declaration order; each attribute starts at
//! the running record size, which is re-aligned after every attribute to the
//! buffer type's attribute alignment.
//!
//! ```text
//! vertex layout  map: UNSIGNED_BYTE x1, box: SHORT x2
//!
//!   byte  0      1  2  3   4  5   6  7
//!        [map ][ padding ][box.0][box.1]     item_size = 8
//! ```

use super::types::{AttributeType, BufferType};

/// One attribute placed inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutAttribute {
    pub name: String,
    pub components: usize,
    pub ty: AttributeType,
    /// Byte offset from the start of the record.
    pub offset: usize,
}

impl LayoutAttribute {
    /// Size in bytes, excluding alignment padding.
    #[inline]
    pub fn size(&self) -> usize {
        self.ty.size() * self.components
    }
}

/// Byte layout of one record in a [`StructuredBuffer`](super::StructuredBuffer).
///
/// Vertex records are not packed: `item_size` may exceed the sum of
/// `components × type width` over the attributes, because every vertex
/// attribute offset and the record stride are rounded up to 4 bytes as wgpu
/// vertex fetch requires. [`packed_size`](Self::packed_size) reports the
/// unpadded sum. Element records are always packed, so the two sizes agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferLayout {
    buffer_type: BufferType,
    attributes: Vec<LayoutAttribute>,
    item_size: usize,
    component_count: usize,
}

impl BufferLayout {
    /// Lays out `(name, components, type)` triples in order.
    pub fn new<I, N>(buffer_type: BufferType, attributes: I) -> Self
    where
        I: IntoIterator<Item = (N, usize, AttributeType)>,
        N: Into<String>,
    {
        let alignment = buffer_type.attribute_alignment();
        let mut item_size = 0;
        let mut component_count = 0;

        let attributes = attributes
            .into_iter()
            .map(|(name, components, ty)| {
                let attribute = LayoutAttribute {
                    name: name.into(),
                    components,
                    ty,
                    offset: item_size,
                };
                item_size = align(attribute.offset + attribute.size(), alignment);
                component_count += components;
                attribute
            })
            .collect();

        Self {
            buffer_type,
            attributes,
            item_size,
            component_count,
        }
    }

    /// Element layout holding one `components`-tuple of vertex indices.
    pub fn element(components: usize, ty: AttributeType) -> Self {
        Self::new(BufferType::Element, [("vertices", components, ty)])
    }

    #[inline]
    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    #[inline]
    pub fn attributes(&self) -> &[LayoutAttribute] {
        &self.attributes
    }

    /// Record size in bytes, including alignment padding.
    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Sum of attribute sizes without padding.
    pub fn packed_size(&self) -> usize {
        self.attributes.iter().map(LayoutAttribute::size).sum()
    }

    /// Total components across all attributes: the length of one flat record.
    #[inline]
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    pub fn attribute(&self, name: &str) -> Option<&LayoutAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[inline]
fn align(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}
