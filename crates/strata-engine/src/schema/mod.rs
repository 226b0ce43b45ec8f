//! Declarative shader interfaces.
//!
//! A [`ShaderInterface`] names the positional arguments of its add-vertex
//! operation and describes every vertex attribute as a list of value
//! expressions over those arguments. Element buffers are described only by
//! their tuple size; their values are vertex indices passed in directly.
//!
//! ```
//! use strata_engine::buffer::AttributeType;
//! use strata_engine::schema::{AttributeDecl, ShaderInterface};
//!
//! let test = ShaderInterface::new("test")
//!     .args(["x", "y"])
//!     .attribute(AttributeDecl::new("map").value(["x"]))
//!     .attribute(
//!         AttributeDecl::new("box")
//!             .components(2)
//!             .ty(AttributeType::Short)
//!             .value(["x * 2", "y * 2"]),
//!     )
//!     .element(3)
//!     .second_element(2);
//! assert_eq!(test.attributes.len(), 2);
//! ```
//!
//! Declarations are compiled once into a [`CompiledSchema`], which is shared
//! between every bucket of the same emitter type.

mod compile;

pub use compile::{CompiledInterface, CompiledSchema};

use crate::buffer::AttributeType;

/// Integer type used by element records, which bounds vertices per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexWidth {
    #[default]
    U16,
    U32,
}

impl IndexWidth {
    /// Maximum vertices one element group can address (largest index + 1).
    #[inline]
    pub const fn max_vertices(self) -> u64 {
        match self {
            IndexWidth::U16 => u16::MAX as u64 + 1,
            IndexWidth::U32 => u32::MAX as u64 + 1,
        }
    }

    #[inline]
    pub const fn attribute_type(self) -> AttributeType {
        match self {
            IndexWidth::U16 => AttributeType::UnsignedShort,
            IndexWidth::U32 => AttributeType::UnsignedInt,
        }
    }
}

/// Which of an interface's buffers a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    Vertex,
    Element,
    SecondElement,
}

impl BufferRole {
    pub const ALL: [BufferRole; 3] = [BufferRole::Vertex, BufferRole::Element, BufferRole::SecondElement];

    /// Suffix appended to the interface name to label the buffer (`testVertex`).
    pub const fn suffix(self) -> &'static str {
        match self {
            BufferRole::Vertex => "Vertex",
            BufferRole::Element => "Element",
            BufferRole::SecondElement => "SecondElement",
        }
    }
}

/// One vertex attribute declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    /// Defaults to the number of value expressions.
    pub components: Option<usize>,
    pub ty: AttributeType,
    /// One expression per component, over the interface's argument names.
    pub value: Vec<String>,
}

impl AttributeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: None,
            ty: AttributeType::default(),
            value: Vec::new(),
        }
    }

    pub fn components(mut self, components: usize) -> Self {
        self.components = Some(components);
        self
    }

    pub fn ty(mut self, ty: AttributeType) -> Self {
        self.ty = ty;
        self
    }

    pub fn value<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value = exprs.into_iter().map(Into::into).collect();
        self
    }
}

/// Declaration of one interface: a vertex buffer plus up to two element buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderInterface {
    pub name: String,
    pub attribute_args: Vec<String>,
    pub attributes: Vec<AttributeDecl>,
    /// Tuple size of the primary element buffer (3 for triangles).
    pub element_components: Option<usize>,
    /// Tuple size of the secondary element buffer (2 for outline segments).
    pub second_element_components: Option<usize>,
    pub index_width: IndexWidth,
}

impl ShaderInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_args: Vec::new(),
            attributes: Vec::new(),
            element_components: None,
            second_element_components: None,
            index_width: IndexWidth::default(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attribute_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn attribute(mut self, attribute: AttributeDecl) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn element(mut self, components: usize) -> Self {
        self.element_components = Some(components);
        self
    }

    pub fn second_element(mut self, components: usize) -> Self {
        self.second_element_components = Some(components);
        self
    }

    pub fn index_width(mut self, index_width: IndexWidth) -> Self {
        self.index_width = index_width;
        self
    }
}
