//! Style-layer boundary.
//!
//! A bucket only needs the layer's type (to pick a geometry emitter) and its
//! resolved layout properties. Paint properties and style evaluation live
//! outside this crate.

use std::collections::BTreeMap;
use std::fmt;

/// Style layer type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Fill,
    Line,
    Circle,
    Symbol,
    Raster,
    Background,
}

impl LayerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            LayerType::Fill => "fill",
            LayerType::Line => "line",
            LayerType::Circle => "circle",
            LayerType::Symbol => "symbol",
            LayerType::Raster => "raster",
            LayerType::Background => "background",
        }
    }

    pub fn parse(s: &str) -> Option<LayerType> {
        Some(match s {
            "fill" => LayerType::Fill,
            "line" => LayerType::Line,
            "circle" => LayerType::Circle,
            "symbol" => LayerType::Symbol,
            "raster" => LayerType::Raster,
            "background" => LayerType::Background,
            _ => return None,
        })
    }
}

/// Layer visibility layout property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Visible,
    None,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }
}

/// A layout property value as declared by the style.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutValue {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl LayoutValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LayoutValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for LayoutValue {
    fn from(s: &str) -> Self {
        LayoutValue::Str(s.to_string())
    }
}

impl From<f64> for LayoutValue {
    fn from(n: f64) -> Self {
        LayoutValue::Number(n)
    }
}

impl From<bool> for LayoutValue {
    fn from(b: bool) -> Self {
        LayoutValue::Bool(b)
    }
}

impl fmt::Display for LayoutValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutValue::Str(s) => write!(f, "{s:?}"),
            LayoutValue::Number(n) => write!(f, "{n}"),
            LayoutValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Resolved layout: declared values merged over per-type defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub visibility: Visibility,
    properties: BTreeMap<String, LayoutValue>,
}

impl Layout {
    /// Resolved value of any layout property other than `visibility`.
    pub fn get(&self, key: &str) -> Option<&LayoutValue> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &LayoutValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The style layer a bucket is built for.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleLayer {
    pub id: String,
    pub ty: LayerType,
    declared: BTreeMap<String, LayoutValue>,
    /// `None` until [`resolve_layout`](Self::resolve_layout) has run.
    pub layout: Option<Layout>,
}

impl StyleLayer {
    pub fn new(id: impl Into<String>, ty: LayerType) -> Self {
        Self {
            id: id.into(),
            ty,
            declared: BTreeMap::new(),
            layout: None,
        }
    }

    /// Declares a layout property, e.g. `("visibility", "none")`.
    pub fn with_layout_property(mut self, key: impl Into<String>, value: impl Into<LayoutValue>) -> Self {
        self.declared.insert(key.into(), value.into());
        self
    }

    /// Resolves declared layout properties over defaults and stores the result.
    ///
    /// Unrecognized `visibility` values fall back to `visible`.
    pub fn resolve_layout(&mut self) -> &Layout {
        let mut properties: BTreeMap<String, LayoutValue> = default_properties(self.ty)
            .iter()
            .map(|(k, v)| (k.to_string(), LayoutValue::from(*v)))
            .collect();

        let mut visibility = Visibility::default();
        for (key, value) in &self.declared {
            if key == "visibility" {
                visibility = match value.as_str() {
                    Some("visible") => Visibility::Visible,
                    Some("none") => Visibility::None,
                    _ => {
                        log::warn!(
                            "layer '{}': invalid visibility {}; using \"visible\"",
                            self.id,
                            value
                        );
                        Visibility::Visible
                    }
                };
            } else {
                properties.insert(key.clone(), value.clone());
            }
        }

        self.layout.insert(Layout { visibility, properties })
    }
}

fn default_properties(ty: LayerType) -> &'static [(&'static str, &'static str)] {
    match ty {
        LayerType::Line => &[("line-cap", "butt"), ("line-join", "miter")],
        LayerType::Symbol => &[("symbol-placement", "point")],
        _ => &[],
    }
}
