use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::normalize_rel_path;
use crate::color::Rgba8;
use crate::error::{ThiepError, ThiepResult};

/// Horizontal anchor policy for the guest name.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "x_policy", content = "x_value", rename_all = "snake_case")]
pub enum XAnchor {
    /// Fixed pixel offset from the left edge of the template.
    Absolute(f64),
    /// Horizontal center of the template, whatever its native width.
    Centered,
}

/// Where the name is anchored on the template.
///
/// `y_fraction` is a fraction of the loaded asset's height, so layout scales
/// correctly regardless of the asset's native resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextAnchor {
    #[serde(flatten)]
    pub x: XAnchor,
    pub y_fraction: f64,
}

impl TextAnchor {
    pub fn absolute(x_value: f64, y_fraction: f64) -> Self {
        Self {
            x: XAnchor::Absolute(x_value),
            y_fraction,
        }
    }

    pub fn centered(y_fraction: f64) -> Self {
        Self {
            x: XAnchor::Centered,
            y_fraction,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBaseline {
    /// Anchor y is the vertical center of the em box (canvas `middle`).
    Middle,
    /// Anchor y is the glyph baseline itself.
    Alphabetic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    Normal,
    Italic,
}

/// Requested face and size for name rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub style: FontStyle,
    pub size_px: f32,
}

/// Everything needed to personalize one template: the art it references and
/// the layout of the name drawn onto it. Immutable once registered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    pub id: String,
    pub asset_ref: String,
    pub text_anchor: TextAnchor,
    pub font: FontSpec,
    pub color: Rgba8,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
}

impl TemplateDescriptor {
    pub fn validate(&self) -> ThiepResult<()> {
        if self.id.trim().is_empty() {
            return Err(ThiepError::validation("template id must be non-empty"));
        }
        normalize_rel_path(&self.asset_ref)?;
        if let XAnchor::Absolute(x) = self.text_anchor.x {
            if !x.is_finite() {
                return Err(ThiepError::validation(format!(
                    "template '{}' has non-finite x_value",
                    self.id
                )));
            }
        }
        let f = self.text_anchor.y_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(ThiepError::validation(format!(
                "template '{}' y_fraction must be in (0,1), got {f}",
                self.id
            )));
        }
        if self.font.family.trim().is_empty() {
            return Err(ThiepError::validation(format!(
                "template '{}' font family must be non-empty",
                self.id
            )));
        }
        if !self.font.size_px.is_finite() || self.font.size_px <= 0.0 {
            return Err(ThiepError::validation(format!(
                "template '{}' font size_px must be finite and > 0",
                self.id
            )));
        }
        Ok(())
    }
}

/// Immutable map from template id to its descriptor, loaded once at startup.
///
/// Adding a template means registering a descriptor, never writing new
/// drawing code.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateDescriptor>,
}

impl TemplateRegistry {
    /// Build a registry from descriptors, validating each and rejecting
    /// duplicate ids.
    pub fn new(descriptors: impl IntoIterator<Item = TemplateDescriptor>) -> ThiepResult<Self> {
        let mut templates = BTreeMap::new();
        for descriptor in descriptors {
            descriptor.validate()?;
            let id = descriptor.id.clone();
            if templates.insert(id.clone(), descriptor).is_some() {
                return Err(ThiepError::validation(format!(
                    "duplicate template id '{id}'"
                )));
            }
        }
        Ok(Self { templates })
    }

    /// The compiled-in production template set.
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        for descriptor in [
            TemplateDescriptor {
                id: "hanoi".to_string(),
                asset_ref: "thiep.png".to_string(),
                text_anchor: TextAnchor::absolute(100.0, 0.417),
                font: FontSpec {
                    family: "DejaVu Serif".to_string(),
                    style: FontStyle::Italic,
                    size_px: 50.0,
                },
                color: Rgba8::rgb(0xc5, 0x91, 0x8a),
                text_align: TextAlign::Left,
                text_baseline: TextBaseline::Middle,
            },
            TemplateDescriptor {
                id: "dongnai".to_string(),
                asset_ref: "thiepdongnai.png".to_string(),
                text_anchor: TextAnchor::centered(0.335),
                font: FontSpec {
                    family: "DejaVu Serif".to_string(),
                    style: FontStyle::Italic,
                    size_px: 50.0,
                },
                color: Rgba8::rgb(0x69, 0x62, 0x2c),
                text_align: TextAlign::Center,
                text_baseline: TextBaseline::Middle,
            },
        ] {
            templates.insert(descriptor.id.clone(), descriptor);
        }
        Self { templates }
    }

    /// Deserialize a registry from a JSON array of descriptors.
    pub fn from_json_str(s: &str) -> ThiepResult<Self> {
        let descriptors: Vec<TemplateDescriptor> = serde_json::from_str(s)
            .map_err(|e| ThiepError::validation(format!("parse template registry JSON: {e}")))?;
        Self::new(descriptors)
    }

    /// Pure lookup. Unknown ids are an error, never a silent default: a
    /// defaulted template would draw the name at the wrong coordinates.
    pub fn resolve(&self, template_id: &str) -> ThiepResult<&TemplateDescriptor> {
        self.templates
            .get(template_id)
            .ok_or_else(|| ThiepError::template_not_found(template_id))
    }

    /// Registered template ids in stable order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
