use std::sync::Arc;

use crate::config::BufferOptions;
use crate::error::BucketError;

use super::layout::BufferLayout;
use super::types::BufferType;

/// A record decoded from a [`StructuredBuffer`], one entry per layout attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Vec<f64>)>,
}

impl Record {
    /// Component values of the named attribute.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Iterates `(name, components)` in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for Record
where
    N: Into<String>,
    V: Into<Vec<f64>>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
        }
    }
}

/// Growable byte store of fixed-layout records.
///
/// Performance characteristics:
/// - `add()` is amortized O(1); capacity grows by `growth_factor` when full
/// - `clear()` is O(1) and keeps the allocation for the next populate cycle
///
/// Bytes past `len() * item_size()` are stale and never observable: `get` and
/// `as_bytes` are gated by `len()`.
#[derive(Debug, Clone)]
pub struct StructuredBuffer {
    label: String,
    layout: Arc<BufferLayout>,
    data: Vec<u8>,
    capacity: usize,
    length: usize,
    growth_factor: f32,
}

impl StructuredBuffer {
    /// Creates an empty buffer with `options.initial_capacity` records reserved.
    pub fn new(
        label: impl Into<String>,
        layout: Arc<BufferLayout>,
        options: &BufferOptions,
    ) -> Result<Self, BucketError> {
        let mut buffer = Self {
            label: label.into(),
            layout,
            data: Vec::new(),
            capacity: 0,
            length: 0,
            growth_factor: options.growth_factor,
        };
        buffer.resize(options.initial_capacity)?;
        Ok(buffer)
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn layout(&self) -> &Arc<BufferLayout> {
        &self.layout
    }

    #[inline]
    pub fn buffer_type(&self) -> BufferType {
        self.layout.buffer_type()
    }

    #[inline]
    pub fn item_size(&self) -> usize {
        self.layout.item_size()
    }

    /// Number of records written.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of records that fit without growing.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends one record given as flat component values in layout order.
    ///
    /// Returns the zero-based index of the new record.
    pub fn add(&mut self, values: &[f64]) -> Result<usize, BucketError> {
        let expected = self.layout.component_count();
        if values.len() != expected {
            return Err(BucketError::mismatch(
                &self.label,
                format!("record has {} components, layout expects {}", values.len(), expected),
            ));
        }

        if self.length == self.capacity {
            self.grow_to(self.length + 1)?;
        }

        let item_size = self.layout.item_size();
        let start = self.length * item_size;
        let record = &mut self.data[start..start + item_size];

        let mut values = values.iter().copied();
        for attribute in self.layout.attributes() {
            let width = attribute.ty.size();
            for c in 0..attribute.components {
                let offset = attribute.offset + c * width;
                let value = values.next().unwrap_or(0.0);
                attribute.ty.write(&mut record[offset..offset + width], value);
            }
        }

        let index = self.length;
        self.length += 1;
        Ok(index)
    }

    /// Decodes the record at `index` into named attributes.
    pub fn get(&self, index: usize) -> Result<Record, BucketError> {
        if index >= self.length {
            return Err(BucketError::OutOfRange {
                what: "record",
                index,
                length: self.length,
            });
        }

        let item_size = self.layout.item_size();
        let record = &self.data[index * item_size..(index + 1) * item_size];

        Ok(self
            .layout
            .attributes()
            .iter()
            .map(|attribute| {
                let width = attribute.ty.size();
                let values: Vec<f64> = (0..attribute.components)
                    .map(|c| attribute.ty.read(&record[attribute.offset + c * width..]))
                    .collect();
                (attribute.name.clone(), values)
            })
            .collect())
    }

    /// Resets the length to zero. Capacity and allocation are kept.
    #[inline]
    pub fn clear(&mut self) {
        self.length = 0;
    }

    /// Drops records past `length`. Like `clear`, bytes are not erased.
    #[inline]
    pub(crate) fn truncate(&mut self, length: usize) {
        self.length = self.length.min(length);
    }

    /// Ensures room for `additional` more records without further growth.
    pub fn reserve(&mut self, additional: usize) -> Result<(), BucketError> {
        let required = self.length.saturating_add(additional);
        if required > self.capacity {
            self.grow_to(required)?;
        }
        Ok(())
    }

    /// Raw bytes of the written records, ready for upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.length * self.layout.item_size()]
    }

    fn grow_to(&mut self, required: usize) -> Result<(), BucketError> {
        let mut new_capacity = self.capacity;
        while new_capacity < required {
            new_capacity = next_capacity(new_capacity, self.growth_factor);
        }

        log::debug!(
            "growing buffer '{}': {} -> {} records (preserving {})",
            self.label,
            self.capacity,
            new_capacity,
            self.length
        );

        self.resize(new_capacity)
    }

    fn resize(&mut self, capacity: usize) -> Result<(), BucketError> {
        let failure = |requested_bytes| BucketError::AllocationFailure {
            buffer: self.label.clone(),
            requested_bytes,
        };

        let bytes = capacity
            .checked_mul(self.layout.item_size())
            .ok_or_else(|| failure(usize::MAX))?;
        if bytes > self.data.len() {
            self.data
                .try_reserve_exact(bytes - self.data.len())
                .map_err(|_| failure(bytes))?;
            self.data.resize(bytes, 0);
        }
        self.capacity = capacity;
        Ok(())
    }
}

/// Next capacity step: `capacity * factor`, rounded up, and always at least one more record.
#[inline]
fn next_capacity(capacity: usize, factor: f32) -> usize {
    let scaled = (capacity as f64 * factor as f64).ceil() as usize;
    scaled.max(capacity.saturating_add(1))
}
