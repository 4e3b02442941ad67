//! Keyboard layouts a learner can choose from, and the learner's last choice.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::settings::SettingsStore;

/// Key of the keyboard layout catalog inside the block settings
pub const KEYBOARD_LAYOUTS_KEY: &str = "keyboard_layouts";

/// Layout preferred by a learner that never launched an environment
pub const DEFAULT_PREFERRED_KEYBOARD_LAYOUT: &str = "us";

/// Catalog used when the host settings do not provide one
pub const DEFAULT_KEYBOARD_LAYOUTS: [(&str, &str); 15] = [
    ("da", "Danish"),
    ("de", "German"),
    ("de-ch", "German-Switzerland"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("fr-be", "French-Belgium"),
    ("fr-ch", "French-Switzerland"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("nl", "Dutch"),
    ("nl-be", "Dutch-Belgium"),
    ("no", "Norwegian"),
    ("uk", "English (UK)"),
    ("us", "English (US)"),
];

/// Mapping from layout code to display name
pub type KeyboardLayouts = BTreeMap<String, String>;

pub fn default_keyboard_layouts() -> KeyboardLayouts {
    DEFAULT_KEYBOARD_LAYOUTS
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

/// Keyboard layouts configured for the block.
///
/// Falls back to [`DEFAULT_KEYBOARD_LAYOUTS`] when there are no block settings or they carry
/// no catalog. Entries whose display name is not a string are skipped.
pub fn get_keyboard_layouts(settings: &dyn SettingsStore) -> KeyboardLayouts {
    let configured = settings
        .block_settings()
        .and_then(|block_settings| block_settings.get(KEYBOARD_LAYOUTS_KEY).cloned());

    match configured {
        Some(Value::Object(layouts)) => layouts
            .into_iter()
            .filter_map(|(code, name)| match name {
                Value::String(name) => Some((code, name)),
                _ => None,
            })
            .collect(),
        _ => {
            debug!("No keyboard layouts configured, using the default catalog");
            default_keyboard_layouts()
        }
    }
}

/// Layouts ordered by display name, ties broken by code
pub fn sorted_keyboard_layouts<I>(layouts: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut layouts = layouts.into_iter().collect::<Vec<_>>();
    layouts.sort_by(|(code_a, name_a), (code_b, name_b)| {
        name_a.cmp(name_b).then_with(|| code_a.cmp(code_b))
    });
    layouts
}

/// The learner's persisted keyboard layout, already scoped to one learner by the host
pub trait UserState: Send + Sync {
    fn preferred_keyboard_layout(&self) -> String;
    fn set_preferred_keyboard_layout(&self, layout: &str);
}

/// In-memory preferred layouts of all learners
#[derive(Debug, Default)]
pub struct PreferenceStore {
    layouts: RwLock<HashMap<String, String>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// State handle for a single learner
    pub fn for_learner(self: &Arc<Self>, learner_id: impl Into<String>) -> LearnerState {
        LearnerState {
            store: Arc::clone(self),
            learner_id: learner_id.into(),
        }
    }
}

/// [`UserState`] of one learner backed by a [`PreferenceStore`]
#[derive(Debug, Clone)]
pub struct LearnerState {
    store: Arc<PreferenceStore>,
    learner_id: String,
}

impl LearnerState {
    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }
}

impl UserState for LearnerState {
    fn preferred_keyboard_layout(&self) -> String {
        self.store
            .layouts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.learner_id)
            .cloned()
            .unwrap_or_else(|| DEFAULT_PREFERRED_KEYBOARD_LAYOUT.to_string())
    }

    fn set_preferred_keyboard_layout(&self, layout: &str) {
        self.store
            .layouts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.learner_id.clone(), layout.to_string());
    }
}
