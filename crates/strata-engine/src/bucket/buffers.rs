use std::sync::Arc;

use crate::buffer::StructuredBuffer;
use crate::config::BucketConfig;
use crate::error::BucketError;
use crate::schema::{BufferRole, CompiledInterface, CompiledSchema};

use super::group::{ElementGroup, ElementGroups};

/// Buffers and group sequence owned for one shader interface.
#[derive(Debug, Clone)]
pub struct InterfaceBuffers {
    vertex: StructuredBuffer,
    element: Option<StructuredBuffer>,
    second_element: Option<StructuredBuffer>,
    groups: ElementGroups,
}

impl InterfaceBuffers {
    fn new(interface: &CompiledInterface, config: &BucketConfig) -> Result<Self, BucketError> {
        let make = |role: BufferRole| {
            interface
                .layout(role)
                .map(|layout| {
                    StructuredBuffer::new(interface.buffer_name(role), layout.clone(), &config.buffers)
                })
                .transpose()
        };

        Ok(Self {
            vertex: make(BufferRole::Vertex)?
                .ok_or_else(|| BucketError::mismatch(interface.name(), "missing vertex layout"))?,
            element: make(BufferRole::Element)?,
            second_element: make(BufferRole::SecondElement)?,
            groups: ElementGroups::new(),
        })
    }

    pub fn buffer(&self, role: BufferRole) -> Option<&StructuredBuffer> {
        match role {
            BufferRole::Vertex => Some(&self.vertex),
            BufferRole::Element => self.element.as_ref(),
            BufferRole::SecondElement => self.second_element.as_ref(),
        }
    }

    fn buffer_mut(&mut self, role: BufferRole) -> Option<&mut StructuredBuffer> {
        match role {
            BufferRole::Vertex => Some(&mut self.vertex),
            BufferRole::Element => self.element.as_mut(),
            BufferRole::SecondElement => self.second_element.as_mut(),
        }
    }

    #[inline]
    pub fn groups(&self) -> &ElementGroups {
        &self.groups
    }

    fn len_of(&self, role: BufferRole) -> usize {
        self.buffer(role).map_or(0, StructuredBuffer::len)
    }

    fn checkpoint(&self) -> SlotCheckpoint {
        SlotCheckpoint {
            lengths: BufferRole::ALL.map(|role| self.len_of(role)),
            groups: self.groups.checkpoint(),
        }
    }

    fn rollback(&mut self, mark: SlotCheckpoint) {
        for (role, length) in BufferRole::ALL.into_iter().zip(mark.lengths) {
            if let Some(buffer) = self.buffer_mut(role) {
                buffer.truncate(length);
            }
        }
        self.groups.rollback(mark.groups);
    }

    fn reset(&mut self) {
        self.vertex.clear();
        if let Some(b) = self.element.as_mut() {
            b.clear();
        }
        if let Some(b) = self.second_element.as_mut() {
            b.clear();
        }
        self.groups.clear();
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotCheckpoint {
    /// Record counts indexed like `BufferRole::ALL`.
    lengths: [usize; 3],
    groups: (usize, Option<ElementGroup>),
}

/// State of every interface at a feature boundary; see [`BucketBuffers::checkpoint`].
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint(Vec<SlotCheckpoint>);

/// Write side of a bucket handed to geometry emitters.
///
/// Emitters call [`make_room_for`](Self::make_room_for) once per feature with
/// the feature's total vertex count, then emit vertices and element tuples.
/// Vertex indices returned by [`add_vertex`](Self::add_vertex) are relative to
/// the active group and are passed unchanged as element operands.
#[derive(Debug)]
pub struct BucketBuffers {
    schema: Arc<CompiledSchema>,
    slots: Vec<InterfaceBuffers>,
    check_element_operands: bool,
    scratch: Vec<f64>,
}

impl BucketBuffers {
    /// Creates empty buffers for every interface in `schema`.
    pub fn new(schema: Arc<CompiledSchema>, config: &BucketConfig) -> Result<Self, BucketError> {
        let slots = schema
            .interfaces()
            .iter()
            .map(|i| InterfaceBuffers::new(i, config))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            schema,
            slots,
            check_element_operands: config.check_element_operands,
            scratch: Vec::new(),
        })
    }

    #[inline]
    pub fn schema(&self) -> &Arc<CompiledSchema> {
        &self.schema
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceBuffers> {
        self.schema.position(name).map(|i| &self.slots[i])
    }

    /// Iterates interfaces with their buffers, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompiledInterface, &InterfaceBuffers)> {
        self.schema.interfaces().iter().zip(self.slots.iter())
    }

    pub fn buffer(&self, interface: &str, role: BufferRole) -> Option<&StructuredBuffer> {
        self.interface(interface).and_then(|slot| slot.buffer(role))
    }

    /// Group sequence of `interface`; empty for unknown interfaces.
    pub fn element_groups(&self, interface: &str) -> &[ElementGroup] {
        self.interface(interface)
            .map_or(&[], |slot| slot.groups.as_slice())
    }

    /// Guarantees the active group of `interface` can take `vertices` more vertices.
    ///
    /// Opens a new group when none exists or the active one would pass the
    /// index-width ceiling. A request larger than the ceiling itself can never
    /// fit and fails with [`BucketError::CapacityOverflow`] without touching
    /// any state.
    pub fn make_room_for(&mut self, interface: &str, vertices: usize) -> Result<&ElementGroup, BucketError> {
        let index = self.position(interface)?;
        let compiled = &self.schema.interfaces()[index];
        let ceiling = compiled.index_width().max_vertices();

        if vertices as u64 > ceiling {
            return Err(BucketError::CapacityOverflow {
                interface: interface.to_string(),
                requested: vertices,
                ceiling,
            });
        }

        let slot = &mut self.slots[index];
        if slot.groups.needs_new_group(vertices, ceiling) {
            if let Some(sealed) = slot.groups.active() {
                log::debug!(
                    "'{}': sealing group {} at {} vertices",
                    interface,
                    slot.groups.len() - 1,
                    sealed.vertex_length
                );
            }
            let group = ElementGroup::starting_at(
                slot.len_of(BufferRole::Vertex),
                slot.len_of(BufferRole::Element),
                slot.len_of(BufferRole::SecondElement),
            );
            return Ok(slot.groups.start_group(group));
        }

        slot.groups
            .active()
            .ok_or_else(|| BucketError::NoActiveGroup(interface.to_string()))
    }

    /// Evaluates the interface's attribute expressions over `args` and appends one vertex.
    ///
    /// Returns the vertex index relative to the active group's start.
    pub fn add_vertex(&mut self, interface: &str, args: &[f64]) -> Result<u32, BucketError> {
        let index = self.position(interface)?;
        let compiled = &self.schema.interfaces()[index];
        let ceiling = compiled.index_width().max_vertices();
        let slot = &mut self.slots[index];

        let group = slot
            .groups
            .active()
            .ok_or_else(|| BucketError::NoActiveGroup(interface.to_string()))?;
        if group.vertex_length as u64 >= ceiling {
            return Err(BucketError::CapacityOverflow {
                interface: interface.to_string(),
                requested: group.vertex_length + 1,
                ceiling,
            });
        }

        compiled.eval_vertex(args, &mut self.scratch)?;
        let absolute = slot.vertex.add(&self.scratch)?;

        let group = slot
            .groups
            .active_mut()
            .ok_or_else(|| BucketError::NoActiveGroup(interface.to_string()))?;
        group.vertex_length += 1;
        Ok((absolute - group.vertex_start) as u32)
    }

    /// Appends one primary element tuple (e.g. a triangle).
    ///
    /// Returns the absolute index of the element record.
    pub fn add_element(&mut self, interface: &str, operands: &[u32]) -> Result<usize, BucketError> {
        self.push_element(interface, BufferRole::Element, operands)
    }

    /// Appends one secondary element tuple (e.g. an outline segment).
    pub fn add_second_element(&mut self, interface: &str, operands: &[u32]) -> Result<usize, BucketError> {
        self.push_element(interface, BufferRole::SecondElement, operands)
    }

    /// Records buffer lengths and group counters of every interface.
    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.slots.iter().map(InterfaceBuffers::checkpoint).collect())
    }

    /// Discards everything written since `mark`, including groups opened since.
    pub(crate) fn rollback(&mut self, mark: Checkpoint) {
        for (slot, saved) in self.slots.iter_mut().zip(mark.0) {
            slot.rollback(saved);
        }
    }

    /// Clears every buffer and drops every group.
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    fn position(&self, interface: &str) -> Result<usize, BucketError> {
        self.schema
            .position(interface)
            .ok_or_else(|| BucketError::UnknownInterface(interface.to_string()))
    }

    fn push_element(&mut self, interface: &str, role: BufferRole, operands: &[u32]) -> Result<usize, BucketError> {
        let index = self.position(interface)?;
        let ceiling = self.schema.interfaces()[index].index_width().max_vertices();
        let check = self.check_element_operands;
        let slot = &mut self.slots[index];

        let group = *slot
            .groups
            .active()
            .ok_or_else(|| BucketError::NoActiveGroup(interface.to_string()))?;
        let buffer = slot.buffer_mut(role).ok_or_else(|| {
            BucketError::mismatch(interface, format!("interface has no {} buffer", role.suffix()))
        })?;

        let components = buffer.layout().component_count();
        if operands.len() != components {
            return Err(BucketError::mismatch(
                interface,
                format!(
                    "{} takes {} operands, got {}",
                    role.suffix(),
                    components,
                    operands.len()
                ),
            ));
        }

        // Operands must fit the index type; optionally they must also name a
        // vertex already written to the active group.
        let limit = if check { group.vertex_length as u64 } else { ceiling };
        if let Some(&bad) = operands.iter().find(|&&v| v as u64 >= limit) {
            return Err(BucketError::OutOfRange {
                what: "element operand",
                index: bad as usize,
                length: limit.min(usize::MAX as u64) as usize,
            });
        }

        self.scratch.clear();
        self.scratch.extend(operands.iter().map(|&v| v as f64));
        let record = buffer.add(&self.scratch)?;

        if let Some(group) = slot.groups.active_mut() {
            match role {
                BufferRole::SecondElement => group.second_element_length += 1,
                _ => group.element_length += 1,
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::AttributeType;
    use crate::schema::{AttributeDecl, IndexWidth, ShaderInterface};

    fn sink_with(width: IndexWidth, config: BucketConfig) -> BucketBuffers {
        let decl = ShaderInterface::new("test")
            .args(["x", "y"])
            .attribute(AttributeDecl::new("map").value(["x"]))
            .attribute(
                AttributeDecl::new("box")
                    .components(2)
                    .ty(AttributeType::Short)
                    .value(["x * 2", "y * 2"]),
            )
            .element(3)
            .second_element(2)
            .index_width(width);
        let schema = Arc::new(CompiledSchema::compile(&[decl]).unwrap());
        BucketBuffers::new(schema, &config).unwrap()
    }

    fn sink() -> BucketBuffers {
        sink_with(IndexWidth::U16, BucketConfig::default())
    }

    // ── groups ───────────────────────────────────────────────────────────

    #[test]
    fn vertex_before_room_is_contract_violation() {
        let mut s = sink();
        let err = s.add_vertex("test", &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, BucketError::NoActiveGroup("test".into()));
        assert!(s.element_groups("test").is_empty());
    }

    #[test]
    fn first_reservation_opens_group() {
        let mut s = sink();
        let group = *s.make_room_for("test", 1).unwrap();
        assert_eq!(group, ElementGroup::default());
        assert_eq!(s.element_groups("test").len(), 1);
        s.make_room_for("test", 1).unwrap();
        assert_eq!(s.element_groups("test").len(), 1);
    }

    #[test]
    fn split_at_ceiling_rebases_indices() {
        let mut s = sink();
        s.make_room_for("test", 65_535).unwrap();
        for _ in 0..65_535 {
            s.add_vertex("test", &[0.0, 0.0]).unwrap();
        }
        s.make_room_for("test", 1).unwrap();
        assert_eq!(s.add_vertex("test", &[0.0, 0.0]).unwrap(), 65_535);
        assert_eq!(s.element_groups("test").len(), 1);

        s.make_room_for("test", 2).unwrap();
        let groups = s.element_groups("test");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].vertex_start, 65_536);
        assert_eq!(s.add_vertex("test", &[0.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn oversized_reservation_is_rejected_untouched() {
        let mut s = sink();
        let err = s.make_room_for("test", 65_537).unwrap_err();
        assert!(matches!(err, BucketError::CapacityOverflow { ceiling: 65_536, .. }));
        assert!(s.element_groups("test").is_empty());
    }

    #[test]
    fn vertex_past_ceiling_without_reservation_overflows() {
        let mut s = sink();
        s.make_room_for("test", 1).unwrap();
        for _ in 0..65_536 {
            s.add_vertex("test", &[0.0, 0.0]).unwrap();
        }
        let err = s.add_vertex("test", &[0.0, 0.0]).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(s.buffer("test", BufferRole::Vertex).unwrap().len(), 65_536);
    }

    // ── elements ─────────────────────────────────────────────────────────

    #[test]
    fn element_counters_track_group() {
        let mut s = sink();
        s.make_room_for("test", 1).unwrap();
        s.add_vertex("test", &[17.0, 42.0]).unwrap();
        assert_eq!(s.add_element("test", &[1, 2, 3]).unwrap(), 0);
        assert_eq!(s.add_second_element("test", &[17, 42]).unwrap(), 0);

        let g = s.element_groups("test")[0];
        assert_eq!((g.vertex_length, g.element_length, g.second_element_length), (1, 1, 1));
    }

    #[test]
    fn element_arity_is_checked() {
        let mut s = sink();
        s.make_room_for("test", 1).unwrap();
        let err = s.add_element("test", &[1, 2]).unwrap_err();
        assert!(matches!(err, BucketError::SchemaMismatch { .. }));
        assert_eq!(s.element_groups("test")[0].element_length, 0);
    }

    #[test]
    fn operand_past_u16_is_out_of_range() {
        let mut s = sink();
        s.make_room_for("test", 1).unwrap();
        let err = s.add_element("test", &[0, 1, 70_000]).unwrap_err();
        assert!(matches!(err, BucketError::OutOfRange { index: 70_000, .. }));
    }

    #[test]
    fn optional_operand_check_uses_group_length() {
        let mut s = sink_with(
            IndexWidth::U16,
            BucketConfig::default().with_element_operand_checks(true),
        );
        s.make_room_for("test", 2).unwrap();
        s.add_vertex("test", &[0.0, 0.0]).unwrap();
        s.add_vertex("test", &[1.0, 1.0]).unwrap();
        assert!(s.add_second_element("test", &[0, 1]).is_ok());
        let err = s.add_second_element("test", &[1, 2]).unwrap_err();
        assert!(matches!(err, BucketError::OutOfRange { index: 2, length: 2, .. }));
    }

    #[test]
    fn u32_width_accepts_wide_operands() {
        let mut s = sink_with(IndexWidth::U32, BucketConfig::default());
        s.make_room_for("test", 70_000).unwrap();
        s.add_element("test", &[0, 1, 69_999]).unwrap();
        let record = s.buffer("test", BufferRole::Element).unwrap().get(0).unwrap();
        assert_eq!(record.get("vertices"), Some(&[0.0, 1.0, 69_999.0][..]));
    }

    // ── misc ─────────────────────────────────────────────────────────────

    #[test]
    fn unknown_interface() {
        let mut s = sink();
        assert_eq!(
            s.make_room_for("glyph", 1).unwrap_err(),
            BucketError::UnknownInterface("glyph".into())
        );
        assert!(s.element_groups("glyph").is_empty());
        assert!(s.buffer("glyph", BufferRole::Vertex).is_none());
    }

    #[test]
    fn rollback_discards_partial_writes() {
        let mut s = sink();
        s.make_room_for("test", 1).unwrap();
        s.add_vertex("test", &[1.0, 5.0]).unwrap();
        let mark = s.checkpoint();

        s.make_room_for("test", 65_536).unwrap();
        s.add_vertex("test", &[2.0, 2.0]).unwrap();
        s.add_element("test", &[0, 0, 0]).unwrap();
        s.add_second_element("test", &[0, 0]).unwrap();
        s.rollback(mark);

        assert_eq!(s.buffer("test", BufferRole::Vertex).unwrap().len(), 1);
        assert_eq!(s.buffer("test", BufferRole::Element).unwrap().len(), 0);
        assert_eq!(s.buffer("test", BufferRole::SecondElement).unwrap().len(), 0);
        let groups = s.element_groups("test");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].vertex_length, 1);
        assert_eq!(s.add_vertex("test", &[3.0, 3.0]).unwrap(), 1);
    }

    #[test]
    fn reset_empties_everything() {
        let mut s = sink();
        s.make_room_for("test", 1).unwrap();
        s.add_vertex("test", &[1.0, 5.0]).unwrap();
        s.add_element("test", &[0, 0, 0]).unwrap();
        s.reset();
        for role in BufferRole::ALL {
            assert_eq!(s.buffer("test", role).unwrap().len(), 0);
        }
        assert!(s.element_groups("test").is_empty());
    }
}
