//! Component declarations and view descriptors
//!
//! A declaration is the immutable, configuration-time description of one
//! component: its name, optional explicit reference, field/scope path
//! expressions, defaults, options and custom events. The kind-specific part
//! lives in [`ComponentKind`]; the resolver only looks at the kind-independent
//! fields.
//!
//! Descriptors are the YAML form of a whole view:
//!
//! ```yaml
//! plugin: materialFlowResources
//! name: documentDetails
//! model: document
//! components:
//!   - name: window
//!     type: window
//!     children:
//!       - name: form
//!         type: form
//!         reference: form
//!         children:
//!           - name: number
//!             type: input
//!             field: number
//!           - name: positions
//!             type: grid
//!             field: "#{form}.positions"
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::interner::intern;

/// Ordered option attached to a component (`<option type=... />`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComponentOption {
    #[serde(rename = "type")]
    pub option_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Extra attributes in declaration order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

impl ComponentOption {
    pub fn new(option_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            option_type: option_type.into(),
            value: Some(value.into()),
            attributes: IndexMap::new(),
        }
    }
}

/// Server-side handler bound to a client event (`<listener event=... />`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomEventBinding {
    pub event: String,
    pub object: String,
    pub method: String,
}

impl CustomEventBinding {
    pub fn new(
        event: impl Into<String>,
        object: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            event: event.into(),
            object: object.into(),
            method: method.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GridColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default)]
    pub link: bool,
}

fn one() -> u32 {
    1
}

/// Kind of component and its kind-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ComponentKind {
    Window,
    Form {
        #[serde(default)]
        expression: Option<String>,
    },
    Grid {
        #[serde(default)]
        columns: Vec<GridColumn>,
        #[serde(default, rename = "correspondingView")]
        corresponding_view: Option<String>,
    },
    Input,
    TextArea,
    CheckBox,
    Calendar,
    Select,
    Lookup {
        #[serde(default)]
        expression: Option<String>,
    },
    Button {
        #[serde(default)]
        url: Option<String>,
    },
    GridLayout {
        #[serde(default = "one")]
        columns: u32,
        #[serde(default = "one")]
        rows: u32,
    },
    FlowLayout,
    BorderLayout,
}

impl ComponentKind {
    /// Descriptor name of the kind (`type:` in YAML)
    pub fn type_name(&self) -> &'static str {
        match self {
            ComponentKind::Window => "window",
            ComponentKind::Form { .. } => "form",
            ComponentKind::Grid { .. } => "grid",
            ComponentKind::Input => "input",
            ComponentKind::TextArea => "textArea",
            ComponentKind::CheckBox => "checkBox",
            ComponentKind::Calendar => "calendar",
            ComponentKind::Select => "select",
            ComponentKind::Lookup { .. } => "lookup",
            ComponentKind::Button { .. } => "button",
            ComponentKind::GridLayout { .. } => "gridLayout",
            ComponentKind::FlowLayout => "flowLayout",
            ComponentKind::BorderLayout => "borderLayout",
        }
    }

    /// Layouts only arrange children: no session state, skipped in functional paths
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            ComponentKind::GridLayout { .. } | ComponentKind::FlowLayout | ComponentKind::BorderLayout
        )
    }

    fn group(&self) -> &'static str {
        match self {
            ComponentKind::Window => "containers/window",
            ComponentKind::Form { .. } => "containers/form",
            ComponentKind::Grid { .. } => "elements/grid",
            ComponentKind::Input => "elements/input",
            ComponentKind::TextArea => "elements/textarea",
            ComponentKind::CheckBox => "elements/checkbox",
            ComponentKind::Calendar => "elements/calendar",
            ComponentKind::Select => "elements/select",
            ComponentKind::Lookup { .. } => "elements/lookup",
            ComponentKind::Button { .. } => "elements/button",
            ComponentKind::GridLayout { .. } => "layout/gridLayout",
            ComponentKind::FlowLayout => "layout/flowLayout",
            ComponentKind::BorderLayout => "layout/borderLayout",
        }
    }

    pub fn jsp_file_path(&self) -> String {
        format!("{}.jsp", self.group())
    }

    pub fn js_file_path(&self) -> String {
        format!("/js/crud/qcd/components/{}.js", self.group())
    }

    pub fn js_object_name(&self) -> &'static str {
        match self {
            ComponentKind::Window => "QCD.components.containers.Window",
            ComponentKind::Form { .. } => "QCD.components.containers.Form",
            ComponentKind::Grid { .. } => "QCD.components.elements.Grid",
            ComponentKind::Input => "QCD.components.elements.TextInput",
            ComponentKind::TextArea => "QCD.components.elements.TextArea",
            ComponentKind::CheckBox => "QCD.components.elements.CheckBox",
            ComponentKind::Calendar => "QCD.components.elements.Calendar",
            ComponentKind::Select => "QCD.components.elements.DynamicComboBox",
            ComponentKind::Lookup { .. } => "QCD.components.elements.Lookup",
            ComponentKind::Button { .. } => "QCD.components.elements.LinkButton",
            ComponentKind::GridLayout { .. } => "QCD.components.containers.layout.GridLayout",
            ComponentKind::FlowLayout => "QCD.components.containers.layout.FlowLayout",
            ComponentKind::BorderLayout => "QCD.components.containers.layout.BorderLayout",
        }
    }

    /// Kind-specific entries for the client-side options object
    pub fn js_options(&self) -> Map<String, Value> {
        let mut options = Map::new();
        match self {
            ComponentKind::Form { expression } | ComponentKind::Lookup { expression } => {
                if let Some(expression) = expression {
                    options.insert("expression".into(), json!(expression));
                }
            }
            ComponentKind::Grid {
                columns,
                corresponding_view,
            } => {
                options.insert("columns".into(), json!(columns));
                if let Some(view) = corresponding_view {
                    options.insert("correspondingView".into(), json!(view));
                }
            }
            ComponentKind::Button { url: Some(url) } => {
                options.insert("url".into(), json!(url));
            }
            ComponentKind::GridLayout { columns, rows } => {
                options.insert("columns".into(), json!(columns));
                options.insert("rows".into(), json!(rows));
            }
            _ => {}
        }
        options
    }
}

/// Immutable configuration of one component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDeclaration {
    pub name: Arc<str>,
    /// Explicit reference; the dotted path is used when absent
    pub reference: Option<Arc<str>>,
    pub field_path: Option<String>,
    pub scope_field_path: Option<String>,
    pub default_enabled: bool,
    pub default_visible: bool,
    pub has_description: bool,
    pub options: Vec<ComponentOption>,
    pub custom_events: Vec<CustomEventBinding>,
    pub kind: ComponentKind,
}

impl ComponentDeclaration {
    pub fn new(name: &str, kind: ComponentKind) -> Self {
        Self {
            name: intern(name),
            reference: None,
            field_path: None,
            scope_field_path: None,
            default_enabled: true,
            default_visible: true,
            has_description: false,
            options: Vec::new(),
            custom_events: Vec::new(),
            kind,
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(intern(reference));
        self
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_scope_field_path(mut self, path: impl Into<String>) -> Self {
        self.scope_field_path = Some(path.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.default_visible = visible;
        self
    }

    pub fn with_description(mut self) -> Self {
        self.has_description = true;
        self
    }

    pub fn with_option(mut self, option: ComponentOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_custom_event(mut self, event: CustomEventBinding) -> Self {
        self.custom_events.push(event);
        self
    }
}

fn yes() -> bool {
    true
}

/// YAML descriptor of a whole view
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDescriptor {
    pub plugin: String,
    pub name: String,
    /// Root data scope (`entity` or `plugin.entity`)
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "yes")]
    pub menu_accessible: bool,
    #[serde(default)]
    pub components: Vec<ComponentDescriptor>,
}

impl ViewDescriptor {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// YAML descriptor of one component and its children
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, alias = "source")]
    pub scope: Option<String>,
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub has_description: bool,
    #[serde(default)]
    pub options: Vec<ComponentOption>,
    #[serde(default)]
    pub listeners: Vec<CustomEventBinding>,
    #[serde(default)]
    pub children: Vec<ComponentDescriptor>,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

impl ComponentDescriptor {
    /// Split into the declaration and its child descriptors
    pub fn into_parts(self) -> (ComponentDeclaration, Vec<ComponentDescriptor>) {
        let declaration = ComponentDeclaration {
            name: intern(&self.name),
            reference: self.reference.as_deref().map(intern),
            field_path: self.field,
            scope_field_path: self.scope,
            default_enabled: self.enabled,
            default_visible: self.visible,
            has_description: self.has_description,
            options: self.options,
            custom_events: self.listeners,
            kind: self.kind,
        };
        (declaration, self.children)
    }
}
