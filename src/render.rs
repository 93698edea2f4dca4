//! View model handed to the rendering layer
//!
//! `prepare_view` turns a resolved view into a serializable tree: template
//! and script locations, translation paths, options for the server-side
//! template and for the client-side component object (including the paths
//! of the components listening to it).

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::resolver::ResolvedView;
use crate::view::ComponentId;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub plugin: String,
    pub name: String,
    pub menu_accessible: bool,
    pub js_file_paths: Vec<String>,
    pub components: Vec<ComponentView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentView {
    pub name: String,
    pub path: String,
    pub reference: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub jsp_file_path: String,
    pub js_file_path: String,
    pub js_object_name: String,
    pub has_description: bool,
    pub translation_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_scope: Option<String>,
    pub jsp_options: Map<String, Value>,
    pub js_options: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ComponentView>,
}

pub fn prepare_view(resolved: &ResolvedView) -> ViewModel {
    let view = resolved.view();
    ViewModel {
        plugin: view.plugin().to_string(),
        name: view.name().to_string(),
        menu_accessible: view.menu_accessible(),
        js_file_paths: resolved.js_file_paths().to_vec(),
        components: view
            .roots()
            .iter()
            .map(|&id| prepare_component(resolved, id))
            .collect(),
    }
}

fn prepare_component(resolved: &ResolvedView, id: ComponentId) -> ComponentView {
    let view = resolved.view();
    let component = view.component(id);
    let declaration = &component.declaration;
    let kind = &declaration.kind;

    let mut jsp_options = Map::new();
    jsp_options.insert("defaultEnabled".into(), json!(declaration.default_enabled));
    jsp_options.insert("defaultVisible".into(), json!(declaration.default_visible));
    if !declaration.options.is_empty() {
        jsp_options.insert("options".into(), json!(declaration.options));
    }

    let mut js_options = kind.js_options();
    js_options.insert("listeners".into(), json!(listener_paths(resolved, id)));
    js_options.insert("defaultEnabled".into(), json!(declaration.default_enabled));
    js_options.insert("defaultVisible".into(), json!(declaration.default_visible));

    ComponentView {
        name: component.name().to_string(),
        path: component.path.to_string(),
        reference: component.reference.to_string(),
        component_type: kind.type_name().to_string(),
        jsp_file_path: kind.jsp_file_path(),
        js_file_path: kind.js_file_path(),
        js_object_name: kind.js_object_name().to_string(),
        has_description: declaration.has_description,
        translation_path: format!(
            "{}.{}.{}",
            view.plugin(),
            view.name(),
            component.functional_path
        ),
        data_scope: resolved
            .node(id)
            .data_scope
            .as_ref()
            .map(ToString::to_string),
        jsp_options,
        js_options,
        children: component
            .children()
            .iter()
            .map(|&child| prepare_component(resolved, child))
            .collect(),
    }
}

/// Field listeners, then scope listeners; the component itself last when it
/// has listeners and custom events (its events must reach the server)
fn listener_paths(resolved: &ResolvedView, id: ComponentId) -> Vec<String> {
    let view = resolved.view();
    let registry = resolved.listeners();

    let mut paths: Vec<String> = registry
        .field_listeners(id)
        .chain(registry.scope_listeners(id))
        .map(|edge| view.component(edge.listener).path.to_string())
        .collect();

    if !paths.is_empty() && !view.component(id).declaration.custom_events.is_empty() {
        paths.push(view.component(id).path.to_string());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataModel;
    use crate::resolver::ComponentDependencyResolver;
    use crate::view::ViewDefinition;

    const MODEL: &str = r#"
plugin: basic
entities:
  company:
    fields:
      name: string
      country: { belongsTo: country }
  country:
    fields:
      code: string
"#;

    const VIEW: &str = r##"
plugin: basic
name: companyDetails
model: company
components:
  - name: window
    type: window
    children:
      - name: layout
        type: gridLayout
        columns: 2
        children:
          - name: form
            type: form
            reference: form
            listeners:
              - event: save
                object: companyListeners
                method: validate
            children:
              - name: name
                type: input
                field: name
                hasDescription: true
                options:
                  - type: textRepresentation
                    value: "true"
                    attributes:
                      width: "200"
                      align: right
              - name: country
                type: lookup
                field: country
              - name: code
                type: input
                field: "#{window.layout.form.country}.code"
                enabled: false
"##;

    fn model() -> ViewModel {
        let data = DataModel::from_yaml(MODEL).unwrap();
        let view = ViewDefinition::from_yaml(VIEW).unwrap();
        let resolved = ComponentDependencyResolver::new(&data).initialize(view).unwrap();
        prepare_view(&resolved)
    }

    #[test]
    fn tree_mirrors_declarations() {
        let model = model();
        assert_eq!(model.components.len(), 1);
        let layout = &model.components[0].children[0];
        assert_eq!(layout.component_type, "gridLayout");
        assert_eq!(layout.js_options["columns"], json!(2));
        let form = &layout.children[0];
        assert_eq!(form.children.len(), 3);
        assert!(model.js_file_paths.iter().any(|p| p.ends_with("lookup.js")));
    }

    #[test]
    fn translation_path_skips_layouts() {
        let model = model();
        let name = &model.components[0].children[0].children[0].children[0];
        assert_eq!(name.translation_path, "basic.companyDetails.window.form.name");
        assert_eq!(name.path, "window.layout.form.name");
        assert!(name.has_description);
        assert_eq!(name.jsp_options["options"][0]["type"], json!("textRepresentation"));
        let attributes: Vec<&String> = name.jsp_options["options"][0]["attributes"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(attributes, ["width", "align"]);
    }

    #[test]
    fn listeners_include_self_when_custom_events_exist() {
        let model = model();
        let form = &model.components[0].children[0].children[0];
        assert_eq!(
            form.js_options["listeners"],
            json!([
                "window.layout.form.name",
                "window.layout.form.country",
                "window.layout.form"
            ])
        );

        let country = &form.children[1];
        assert_eq!(country.js_options["listeners"], json!(["window.layout.form.code"]));
        assert_eq!(country.data_scope.as_deref(), Some("basic.country"));

        let code = &form.children[2];
        assert_eq!(code.js_options["listeners"], json!([]));
        assert_eq!(code.jsp_options["defaultEnabled"], json!(false));
        assert_eq!(code.js_options["defaultEnabled"], json!(false));
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(model()).unwrap();
        assert_eq!(value["plugin"], json!("basic"));
        assert_eq!(value["menuAccessible"], json!(true));
        let window = &value["components"][0];
        assert_eq!(window["type"], json!("window"));
        assert_eq!(window["jsObjectName"], json!("QCD.components.containers.Window"));
        assert_eq!(window["dataScope"], json!("basic.company"));
    }
}
