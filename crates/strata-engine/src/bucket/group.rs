use std::ops::Range;

/// Counters for one generation of an interface's buffers.
///
/// A group addresses the vertex records `vertex_start..vertex_start + vertex_length`.
/// Element records written while the group is active hold indices relative to
/// `vertex_start`, so the renderer draws each group with that base vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementGroup {
    pub vertex_start: usize,
    pub element_start: usize,
    pub second_element_start: usize,
    pub vertex_length: usize,
    pub element_length: usize,
    pub second_element_length: usize,
}

impl ElementGroup {
    /// Empty group beginning at the given buffer lengths.
    pub fn starting_at(vertex_start: usize, element_start: usize, second_element_start: usize) -> Self {
        Self {
            vertex_start,
            element_start,
            second_element_start,
            ..Self::default()
        }
    }

    #[inline]
    pub fn vertex_range(&self) -> Range<usize> {
        self.vertex_start..self.vertex_start + self.vertex_length
    }

    #[inline]
    pub fn element_range(&self) -> Range<usize> {
        self.element_start..self.element_start + self.element_length
    }

    #[inline]
    pub fn second_element_range(&self) -> Range<usize> {
        self.second_element_start..self.second_element_start + self.second_element_length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertex_length == 0 && self.element_length == 0 && self.second_element_length == 0
    }
}

/// Ordered group sequence of one interface.
///
/// Only the last group is active; every earlier group is sealed and never
/// mutated again. An empty sequence means no group has been opened since the
/// last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementGroups {
    groups: Vec<ElementGroup>,
}

impl ElementGroups {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_slice(&self) -> &[ElementGroup] {
        &self.groups
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[inline]
    pub fn active(&self) -> Option<&ElementGroup> {
        self.groups.last()
    }

    #[inline]
    pub(crate) fn active_mut(&mut self) -> Option<&mut ElementGroup> {
        self.groups.last_mut()
    }

    /// Whether `additional` vertices require sealing the active group.
    pub fn needs_new_group(&self, additional: usize, ceiling: u64) -> bool {
        match self.active() {
            None => true,
            Some(g) => g.vertex_length as u64 + additional as u64 > ceiling,
        }
    }

    /// Seals the active group (if any) and opens a new one.
    pub(crate) fn start_group(&mut self, group: ElementGroup) -> &ElementGroup {
        self.groups.push(group);
        &self.groups[self.groups.len() - 1]
    }

    /// Snapshot of the sequence length and the active group's counters.
    pub(crate) fn checkpoint(&self) -> (usize, Option<ElementGroup>) {
        (self.groups.len(), self.active().copied())
    }

    /// Restores a [`checkpoint`](Self::checkpoint): groups opened since are
    /// dropped and the then-active group gets its counters back.
    pub(crate) fn rollback(&mut self, (len, active): (usize, Option<ElementGroup>)) {
        self.groups.truncate(len);
        if let (Some(slot), Some(saved)) = (self.groups.last_mut(), active) {
            *slot = saved;
        }
    }

    /// Drops every group, returning to the no-group state.
    #[inline]
    pub(crate) fn clear(&mut self) {
        self.groups.clear();
    }
}
