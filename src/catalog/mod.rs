//! Template catalog: the set of target shapes a run can draw from.

pub mod audit;
pub mod loader;

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::engine::template::Template;

/// What a drawn card tells us about the shape it shows.
#[derive(Debug, Clone, Default)]
pub struct CardRef {
    /// Card art identifier, compared exactly against `Template::reference_image`.
    pub reference_image: Option<String>,
    /// Free-form card id, compared case-insensitively.
    pub id: String,
}

impl CardRef {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            reference_image: None,
            id: id.into(),
        }
    }

    pub fn by_image(image: impl Into<String>) -> Self {
        Self {
            reference_image: Some(image.into()),
            id: String::new(),
        }
    }
}

/// Registry of available templates, in registration order.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Arc<Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template. A template with the same id is replaced in place.
    pub fn register(&mut self, template: Template) {
        let template = Arc::new(template);
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => {
                tracing::warn!(template = %template.id, "duplicate template id, replacing");
                *slot = template;
            }
            None => self.templates.push(template),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Template>> {
        self.templates.iter().find(|t| t.id == id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Template>> + '_ {
        self.templates.iter()
    }

    pub fn choose_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Template>> {
        self.templates.choose(rng).cloned()
    }

    /// Find the template for a card.
    ///
    /// Tries, in order: exact reference image; exact trimmed case-insensitive
    /// id against the template id or reference image; substring of either.
    pub fn resolve_card(&self, card: &CardRef) -> Option<Arc<Template>> {
        if let Some(image) = card.reference_image.as_deref() {
            if let Some(t) = self
                .templates
                .iter()
                .find(|t| t.reference_image.as_deref() == Some(image))
            {
                return Some(t.clone());
            }
        }

        let id = card.id.trim().to_lowercase();
        if id.is_empty() {
            return None;
        }

        let exact = self
            .templates
            .iter()
            .find(|t| lookup_keys(t).any(|k| k == id));
        if let Some(t) = exact {
            return Some(t.clone());
        }

        self.templates
            .iter()
            .find(|t| lookup_keys(t).any(|k| k.contains(&id)))
            .cloned()
    }
}

/// Lower-cased names a card id may refer to a template by.
fn lookup_keys(template: &Template) -> impl Iterator<Item = String> + '_ {
    std::iter::once(template.id.as_str())
        .chain(template.reference_image.as_deref())
        .map(|s| s.trim().to_lowercase())
}

impl FromIterator<Template> for TemplateRegistry {
    fn from_iter<I: IntoIterator<Item = Template>>(iter: I) -> Self {
        let mut registry = TemplateRegistry::new();
        for t in iter {
            registry.register(t);
        }
        registry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOrder {
    #[default]
    Sequential,
    Random,
}

/// Hands out templates one draw at a time.
#[derive(Debug, Clone)]
pub struct TemplateDeck {
    registry: TemplateRegistry,
    order: DrawOrder,
    next_index: usize,
}

impl TemplateDeck {
    pub fn new(registry: TemplateRegistry, order: DrawOrder) -> Self {
        Self {
            registry,
            order,
            next_index: 0,
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Next template: cycling through the registry, or uniformly at random.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Arc<Template>> {
        if self.registry.is_empty() {
            return None;
        }
        match self.order {
            DrawOrder::Random => self.registry.choose_random(rng),
            DrawOrder::Sequential => {
                let idx = self.next_index % self.registry.len();
                self.next_index = (idx + 1) % self.registry.len();
                self.registry.templates.get(idx).cloned()
            }
        }
    }
}
