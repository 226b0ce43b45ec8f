use std::sync::Arc;

use strata_expr::CompiledExpr;

use crate::buffer::{BufferLayout, BufferType};
use crate::error::BucketError;

use super::{BufferRole, IndexWidth, ShaderInterface};

/// A shader interface lowered to buffer layouts and per-component closures.
#[derive(Debug)]
pub struct CompiledInterface {
    name: String,
    args: Vec<String>,
    index_width: IndexWidth,
    vertex: Arc<BufferLayout>,
    /// One closure per vertex component, flattened in layout order.
    exprs: Vec<CompiledExpr>,
    element: Option<Arc<BufferLayout>>,
    second_element: Option<Arc<BufferLayout>>,
}

impl CompiledInterface {
    /// Validates `decl` and compiles its value expressions.
    pub fn compile(decl: &ShaderInterface) -> Result<Self, BucketError> {
        let name = decl.name.as_str();

        if decl.attributes.is_empty() {
            return Err(BucketError::mismatch(name, "interface declares no vertex attributes"));
        }
        if let Some(dup) = first_duplicate(decl.attribute_args.iter().map(String::as_str)) {
            return Err(BucketError::mismatch(name, format!("argument `{dup}` declared twice")));
        }
        if let Some(dup) = first_duplicate(decl.attributes.iter().map(|a| a.name.as_str())) {
            return Err(BucketError::mismatch(name, format!("attribute `{dup}` declared twice")));
        }

        let args: Vec<&str> = decl.attribute_args.iter().map(String::as_str).collect();
        let mut exprs = Vec::new();
        let mut fields = Vec::with_capacity(decl.attributes.len());

        for attribute in &decl.attributes {
            let components = attribute.components.unwrap_or(attribute.value.len());
            if components == 0 || components != attribute.value.len() {
                return Err(BucketError::mismatch(
                    name,
                    format!(
                        "attribute `{}` declares {} components but {} value expressions",
                        attribute.name,
                        components,
                        attribute.value.len()
                    ),
                ));
            }

            for src in &attribute.value {
                let expr = CompiledExpr::compile(src, &args).map_err(|source| BucketError::Schema {
                    interface: name.to_string(),
                    attribute: attribute.name.clone(),
                    source,
                })?;
                exprs.push(expr);
            }
            fields.push((attribute.name.clone(), components, attribute.ty));
        }

        let element_layout = |components: Option<usize>, role: BufferRole| match components {
            None => Ok(None),
            Some(0) => Err(BucketError::mismatch(
                name,
                format!("{} tuple must have at least one component", role.suffix()),
            )),
            Some(n) => Ok(Some(Arc::new(BufferLayout::element(n, decl.index_width.attribute_type())))),
        };

        Ok(Self {
            name: name.to_string(),
            args: decl.attribute_args.clone(),
            index_width: decl.index_width,
            vertex: Arc::new(BufferLayout::new(BufferType::Vertex, fields)),
            exprs,
            element: element_layout(decl.element_components, BufferRole::Element)?,
            second_element: element_layout(
                decl.second_element_components,
                BufferRole::SecondElement,
            )?,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional argument names of the add-vertex operation.
    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[inline]
    pub fn index_width(&self) -> IndexWidth {
        self.index_width
    }

    /// Layout of the buffer serving `role`, if the interface declares one.
    pub fn layout(&self, role: BufferRole) -> Option<&Arc<BufferLayout>> {
        match role {
            BufferRole::Vertex => Some(&self.vertex),
            BufferRole::Element => self.element.as_ref(),
            BufferRole::SecondElement => self.second_element.as_ref(),
        }
    }

    /// Label of the buffer serving `role`, e.g. `testSecondElement`.
    pub fn buffer_name(&self, role: BufferRole) -> String {
        format!("{}{}", self.name, role.suffix())
    }

    /// Evaluates every vertex component for one add-vertex call into `out`.
    pub fn eval_vertex(&self, args: &[f64], out: &mut Vec<f64>) -> Result<(), BucketError> {
        if args.len() != self.args.len() {
            return Err(BucketError::mismatch(
                &self.name,
                format!(
                    "add-vertex takes {} arguments ({}), got {}",
                    self.args.len(),
                    self.args.join(", "),
                    args.len()
                ),
            ));
        }
        out.clear();
        out.extend(self.exprs.iter().map(|e| e.eval(args)));
        Ok(())
    }
}

/// Every interface of one emitter type, compiled once and shared via `Arc`.
#[derive(Debug, Default)]
pub struct CompiledSchema {
    interfaces: Vec<CompiledInterface>,
}

impl CompiledSchema {
    pub fn compile(decls: &[ShaderInterface]) -> Result<Self, BucketError> {
        if let Some(dup) = first_duplicate(decls.iter().map(|d| d.name.as_str())) {
            return Err(BucketError::mismatch(dup, "interface declared twice"));
        }
        let interfaces = decls
            .iter()
            .map(CompiledInterface::compile)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("compiled schema with {} interface(s)", interfaces.len());
        Ok(Self { interfaces })
    }

    #[inline]
    pub fn interfaces(&self) -> &[CompiledInterface] {
        &self.interfaces
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.interfaces.iter().position(|i| i.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&CompiledInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Some(name);
        }
        seen.push(name);
    }
    None
}
