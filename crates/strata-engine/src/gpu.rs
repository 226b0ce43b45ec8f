//! wgpu descriptors for uploading populated buckets.
//!
//! Nothing here touches a device. The renderer uploads
//! [`StructuredBuffer::as_bytes`](crate::buffer::StructuredBuffer::as_bytes)
//! and issues one `draw_indexed` per [`DrawSegment`].

use std::ops::Range;

use crate::bucket::ElementGroup;
use crate::buffer::AttributeType;
use crate::error::BucketError;
use crate::schema::{BufferRole, CompiledInterface, IndexWidth};

// ── formats ───────────────────────────────────────────────────────────────

/// Vertex format for `components` values of `ty`, if wgpu has one.
///
/// Integer attributes map to the non-normalized formats; the shader sees the
/// stored integers. Three-component 8 and 16 bit vectors have no wgpu format.
pub fn vertex_format(ty: AttributeType, components: usize) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match (ty, components) {
        (AttributeType::Byte, 1) => F::Sint8,
        (AttributeType::Byte, 2) => F::Sint8x2,
        (AttributeType::Byte, 4) => F::Sint8x4,
        (AttributeType::UnsignedByte, 1) => F::Uint8,
        (AttributeType::UnsignedByte, 2) => F::Uint8x2,
        (AttributeType::UnsignedByte, 4) => F::Uint8x4,
        (AttributeType::Short, 1) => F::Sint16,
        (AttributeType::Short, 2) => F::Sint16x2,
        (AttributeType::Short, 4) => F::Sint16x4,
        (AttributeType::UnsignedShort, 1) => F::Uint16,
        (AttributeType::UnsignedShort, 2) => F::Uint16x2,
        (AttributeType::UnsignedShort, 4) => F::Uint16x4,
        (AttributeType::Int, 1) => F::Sint32,
        (AttributeType::Int, 2) => F::Sint32x2,
        (AttributeType::Int, 3) => F::Sint32x3,
        (AttributeType::Int, 4) => F::Sint32x4,
        (AttributeType::UnsignedInt, 1) => F::Uint32,
        (AttributeType::UnsignedInt, 2) => F::Uint32x2,
        (AttributeType::UnsignedInt, 3) => F::Uint32x3,
        (AttributeType::UnsignedInt, 4) => F::Uint32x4,
        (AttributeType::Float, 1) => F::Float32,
        (AttributeType::Float, 2) => F::Float32x2,
        (AttributeType::Float, 3) => F::Float32x3,
        (AttributeType::Float, 4) => F::Float32x4,
        _ => return None,
    })
}

#[inline]
pub fn index_format(width: IndexWidth) -> wgpu::IndexFormat {
    match width {
        IndexWidth::U16 => wgpu::IndexFormat::Uint16,
        IndexWidth::U32 => wgpu::IndexFormat::Uint32,
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

/// Owned counterpart of `wgpu::VertexBufferLayout` for one interface.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayoutDesc {
    pub array_stride: wgpu::BufferAddress,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl VertexLayoutDesc {
    /// Maps the interface's vertex layout, assigning shader locations from
    /// `first_location` in declaration order.
    pub fn from_interface(interface: &CompiledInterface, first_location: u32) -> Result<Self, BucketError> {
        let layout = interface
            .layout(BufferRole::Vertex)
            .ok_or_else(|| BucketError::mismatch(interface.name(), "missing vertex layout"))?;

        let attributes = layout
            .attributes()
            .iter()
            .zip(first_location..)
            .map(|(attr, shader_location)| -> Result<wgpu::VertexAttribute, BucketError> {
                let format = vertex_format(attr.ty, attr.components).ok_or_else(|| {
                    BucketError::mismatch(
                        interface.name(),
                        format!(
                            "attribute `{}` ({}x{}) has no vertex format",
                            attr.name,
                            attr.ty.name(),
                            attr.components
                        ),
                    )
                })?;
                Ok(wgpu::VertexAttribute {
                    format,
                    offset: attr.offset as wgpu::BufferAddress,
                    shader_location,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            array_stride: layout.item_size() as wgpu::BufferAddress,
            attributes,
        })
    }

    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

// ── draw segments ─────────────────────────────────────────────────────────

/// One `draw_indexed` call: index ranges are in index units, not records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawSegment {
    pub base_vertex: i32,
    pub indices: Range<u32>,
    pub second_indices: Range<u32>,
}

/// Converts a group sequence into draw calls. Empty groups are dropped.
pub fn draw_segments(interface: &CompiledInterface, groups: &[ElementGroup]) -> Result<Vec<DrawSegment>, BucketError> {
    let components = |role| {
        interface
            .layout(role)
            .map_or(0, |layout| layout.component_count())
    };
    let primary = components(BufferRole::Element);
    let secondary = components(BufferRole::SecondElement);

    groups
        .iter()
        .filter(|g| !g.is_empty())
        .map(|g| -> Result<DrawSegment, BucketError> {
            Ok(DrawSegment {
                base_vertex: i32::try_from(g.vertex_start).map_err(|_| BucketError::OutOfRange {
                    what: "base vertex",
                    index: g.vertex_start,
                    length: i32::MAX as usize,
                })?,
                indices: index_range(g.element_range(), primary)?,
                second_indices: index_range(g.second_element_range(), secondary)?,
            })
        })
        .collect()
}

fn index_range(records: Range<usize>, components: usize) -> Result<Range<u32>, BucketError> {
    let convert = |record: usize| {
        record
            .checked_mul(components)
            .and_then(|i| u32::try_from(i).ok())
            .ok_or(BucketError::OutOfRange {
                what: "index offset",
                index: record,
                length: u32::MAX as usize,
            })
    };
    Ok(convert(records.start)?..convert(records.end)?)
}
