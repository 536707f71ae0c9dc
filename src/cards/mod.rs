use eframe::egui;
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub mod builtin;

/// Context handed to every card instance by the embedding application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardContext {
    pub username: Option<String>,
    pub values: Map<String, Value>,
}

impl CardContext {
    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            values: Map::new(),
        }
    }
}

/// Result of editing card settings.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct CardSettingsUiResult {
    pub changed: bool,
    pub error: Option<String>,
}

/// Handler used to render a card's settings form.
pub type SettingsUiFn = fn(&mut egui::Ui, &mut Value) -> CardSettingsUiResult;

/// Grid sizing hints merged into the layout record of a freshly dropped card.
///
/// Keys other than `w`/`h` (for example `minW`) are carried into the layout
/// record untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<i32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GridSettings {
    pub fn new(w: i32, h: i32) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
            extra: Map::new(),
        }
    }

    pub fn width(w: i32) -> Self {
        Self {
            w: Some(w),
            ..Default::default()
        }
    }

    pub fn with_hint(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Display metadata of a registered card type.
#[derive(Debug, Clone, PartialEq)]
pub struct CardTypeInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub color: String,
    pub default_interval: Option<Duration>,
    pub grid: Option<GridSettings>,
}

impl CardTypeInfo {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            description: String::new(),
            icon: "mdi:card-outline".into(),
            color: "#336699".into(),
            default_interval: None,
            grid: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.default_interval = Some(interval);
        self
    }

    pub fn grid(mut self, grid: GridSettings) -> Self {
        self.grid = Some(grid);
        self
    }
}

/// Capability set shared by all card types.
///
/// `render` is required. A card that wants periodic updates either overrides
/// `interval` or relies on the default interval of its type; `refresh` is
/// called each time that interval elapses.
pub trait Card: Send {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &CardContext);

    fn refresh(&mut self) {}

    fn interval(&self) -> Option<Duration> {
        None
    }
}

/// Descriptor for building cards from JSON settings.
#[derive(Clone)]
pub struct CardDescriptor {
    info: CardTypeInfo,
    ctor: Arc<dyn Fn(&Value) -> Box<dyn Card> + Send + Sync>,
    default_settings: Arc<dyn Fn() -> Value + Send + Sync>,
    settings_ui: Option<SettingsUiFn>,
}

impl CardDescriptor {
    pub fn new<T: Card + 'static, C: DeserializeOwned + Serialize + Default + 'static>(
        info: CardTypeInfo,
        build: fn(C) -> T,
    ) -> Self {
        let name = info.name.clone();
        Self {
            info,
            ctor: Arc::new(move |v| {
                let cfg = match serde_json::from_value::<C>(v.clone()) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        tracing::warn!(card = %name, error = %e, "card settings invalid; using defaults");
                        C::default()
                    }
                };
                Box::new(build(cfg))
            }),
            default_settings: Arc::new(|| {
                serde_json::to_value(C::default()).unwrap_or_else(|_| json!({}))
            }),
            settings_ui: None,
        }
    }

    pub fn with_settings_ui(mut self, settings_ui: SettingsUiFn) -> Self {
        self.settings_ui = Some(settings_ui);
        self
    }

    pub fn info(&self) -> &CardTypeInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn default_settings(&self) -> Value {
        (self.default_settings)()
    }

    pub fn settings_ui(&self) -> Option<SettingsUiFn> {
        self.settings_ui
    }

    pub fn create(&self, settings: &Value) -> Box<dyn Card> {
        (self.ctor)(settings)
    }
}

/// A card instance built for one render pass.
pub struct LiveCard {
    id: String,
    card_class: String,
    card: Box<dyn Card>,
    context: CardContext,
    settings_ui: Option<SettingsUiFn>,
    default_settings: Value,
    interval: Option<Duration>,
}

impl LiveCard {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn card_class(&self) -> &str {
        &self.card_class
    }

    pub fn render(&mut self, ui: &mut egui::Ui) {
        self.card.render(ui, &self.context);
    }

    pub fn refresh(&mut self) {
        self.card.refresh();
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn has_settings(&self) -> bool {
        self.settings_ui.is_some()
    }

    /// Settings form seed: the type's defaults overlaid with the stored values.
    pub fn settings_draft(&self, settings: &Map<String, Value>) -> Value {
        merge_json(&self.default_settings, &Value::Object(settings.clone()))
    }

    /// Render the settings form. Returns `None` when the card is not configurable.
    pub fn render_settings(
        &self,
        ui: &mut egui::Ui,
        draft: &mut Value,
    ) -> Option<CardSettingsUiResult> {
        let render = self.settings_ui?;
        if draft.is_null() {
            *draft = self.default_settings.clone();
        }
        Some(render(ui, draft))
    }
}

#[derive(Clone, Default)]
pub struct CardRegistry {
    map: HashMap<String, CardDescriptor>,
}

impl CardRegistry {
    /// Register a card type. A second registration under the same name wins.
    pub fn register(&mut self, descriptor: CardDescriptor) {
        let name = descriptor.name().to_string();
        if self.map.insert(name.clone(), descriptor).is_some() {
            tracing::debug!(card = %name, "card type re-registered");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&CardDescriptor> {
        self.map.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn infos(&self) -> Vec<&CardTypeInfo> {
        let mut infos: Vec<&CardTypeInfo> = self.map.values().map(|d| d.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Build a live card. `None` means the type name is not registered.
    pub fn instantiate(
        &self,
        card_id: &str,
        type_name: &str,
        settings: &Map<String, Value>,
        ctx: &CardContext,
    ) -> Option<LiveCard> {
        let descriptor = self.map.get(type_name)?;
        let card = descriptor.create(&Value::Object(settings.clone()));
        let interval = card.interval().or(descriptor.info.default_interval);
        Some(LiveCard {
            id: card_id.to_string(),
            card_class: type_name.to_string(),
            card,
            context: ctx.clone(),
            settings_ui: descriptor.settings_ui,
            default_settings: descriptor.default_settings(),
            interval,
        })
    }
}

static GLOBAL_REGISTRY: OnceCell<CardRegistry> = OnceCell::new();

/// Install the process-wide registry. Only the first call succeeds.
pub fn install_global(registry: CardRegistry) -> anyhow::Result<&'static CardRegistry> {
    let mut installed = false;
    let registry = GLOBAL_REGISTRY.get_or_init(|| {
        installed = true;
        registry
    });
    if !installed {
        anyhow::bail!("card registry already installed");
    }
    tracing::debug!(types = registry.map.len(), "card registry installed");
    Ok(registry)
}

pub(crate) fn merge_json(base: &Value, updates: &Value) -> Value {
    match (base, updates) {
        (Value::Object(a), Value::Object(b)) => {
            let mut merged = a.clone();
            for (k, v) in b {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        _ => updates.clone(),
    }
}

pub(crate) fn edit_typed_settings<C: DeserializeOwned + Serialize + Default>(
    ui: &mut egui::Ui,
    value: &mut Value,
    render: impl FnOnce(&mut egui::Ui, &mut C) -> bool,
) -> CardSettingsUiResult {
    let mut changed = false;
    let mut error = None;
    if value.is_null() {
        *value = serde_json::to_value(C::default()).unwrap_or_else(|_| json!({}));
        changed = true;
    }

    let original = value.clone();
    let mut cfg: C = match serde_json::from_value(original.clone()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error = Some(format!("Failed to parse settings: {e}"));
            C::default()
        }
    };

    let ui_changed = render(ui, &mut cfg);
    let serialized = serde_json::to_value(&cfg).unwrap_or_else(|_| json!({}));

    // Keys the form does not know about survive the edit.
    let merged = merge_json(&original, &serialized);
    if merged != *value {
        *value = merged;
        changed = true;
    }
    changed |= ui_changed;

    CardSettingsUiResult { changed, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default, Serialize, Deserialize)]
    struct LabelConfig {
        #[serde(default)]
        label: String,
    }

    struct LabelCard {
        label: String,
    }

    impl Card for LabelCard {
        fn render(&mut self, ui: &mut egui::Ui, _ctx: &CardContext) {
            ui.label(&self.label);
        }
    }

    struct TickingCard;

    impl Card for TickingCard {
        fn render(&mut self, _ui: &mut egui::Ui, _ctx: &CardContext) {}

        fn interval(&self) -> Option<Duration> {
            Some(Duration::from_secs(5))
        }
    }

    fn label_settings_ui(ui: &mut egui::Ui, value: &mut Value) -> CardSettingsUiResult {
        edit_typed_settings(ui, value, |ui, cfg: &mut LabelConfig| {
            ui.text_edit_singleline(&mut cfg.label).changed()
        })
    }

    fn label_descriptor(title: &str) -> CardDescriptor {
        CardDescriptor::new(CardTypeInfo::new("Label", title), |cfg: LabelConfig| {
            LabelCard { label: cfg.label }
        })
    }

    #[test]
    fn lookup_returns_latest_registration() {
        let mut reg = CardRegistry::default();
        reg.register(label_descriptor("first"));
        reg.register(label_descriptor("second"));
        assert_eq!(reg.names(), vec!["Label".to_string()]);
        assert_eq!(reg.lookup("Label").unwrap().info().title, "second");
    }

    #[test]
    fn lookup_miss_is_none() {
        let reg = CardRegistry::default();
        assert!(reg.lookup("Missing").is_none());
        assert!(reg
            .instantiate("id", "Missing", &Map::new(), &CardContext::default())
            .is_none());
    }

    #[test]
    fn instantiate_uses_type_interval_when_card_has_none() {
        let mut reg = CardRegistry::default();
        reg.register(CardDescriptor::new(
            CardTypeInfo::new("Label", "Label").interval(Duration::from_secs(60)),
            |cfg: LabelConfig| LabelCard { label: cfg.label },
        ));
        reg.register(CardDescriptor::new(
            CardTypeInfo::new("Ticking", "Ticking").interval(Duration::from_secs(60)),
            |_: LabelConfig| TickingCard,
        ));
        let ctx = CardContext::default();
        let label = reg.instantiate("a", "Label", &Map::new(), &ctx).unwrap();
        let ticking = reg.instantiate("b", "Ticking", &Map::new(), &ctx).unwrap();
        assert_eq!(label.interval(), Some(Duration::from_secs(60)));
        assert_eq!(ticking.interval(), Some(Duration::from_secs(5)));
        assert_eq!(label.id(), "a");
        assert_eq!(ticking.card_class(), "Ticking");
    }

    #[test]
    fn settings_capability_is_optional() {
        let mut reg = CardRegistry::default();
        reg.register(label_descriptor("plain"));
        let plain = reg
            .instantiate("a", "Label", &Map::new(), &CardContext::default())
            .unwrap();
        assert!(!plain.has_settings());

        reg.register(label_descriptor("editable").with_settings_ui(label_settings_ui));
        let editable = reg
            .instantiate("a", "Label", &Map::new(), &CardContext::default())
            .unwrap();
        assert!(editable.has_settings());
    }

    #[test]
    fn invalid_settings_fall_back_to_defaults() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        let mut reg = CardRegistry::default();
        reg.register(CardDescriptor::new(
            CardTypeInfo::new("Label", "Label"),
            |cfg: LabelConfig| {
                BUILT.fetch_add(1, Ordering::SeqCst);
                LabelCard { label: cfg.label }
            },
        ));
        let mut settings = Map::new();
        settings.insert("label".into(), json!(42));
        assert!(reg
            .instantiate("a", "Label", &settings, &CardContext::default())
            .is_some());
        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn settings_draft_overlays_stored_values() {
        let mut reg = CardRegistry::default();
        reg.register(label_descriptor("plain"));
        let card = reg
            .instantiate("a", "Label", &Map::new(), &CardContext::default())
            .unwrap();
        let mut stored = Map::new();
        stored.insert("label".into(), json!("hello"));
        stored.insert("extra".into(), json!(true));
        let draft = card.settings_draft(&stored);
        assert_eq!(draft, json!({"label": "hello", "extra": true}));
    }

    #[test]
    fn merge_json_preserves_unknown_fields() {
        let base = json!({"known": 1, "extra": {"keep": true}});
        let updates = json!({"known": 2});
        let merged = merge_json(&base, &updates);
        assert_eq!(merged["known"], json!(2));
        assert_eq!(merged["extra"], json!({"keep": true}));
    }

    #[test]
    fn grid_settings_serialize_hints_flat() {
        let grid = GridSettings::width(6).with_hint("minW", 6);
        assert_eq!(serde_json::to_value(&grid).unwrap(), json!({"w": 6, "minW": 6}));
    }
}
