//! Loading view descriptors and data models from disk

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::declaration::ViewDescriptor;
use crate::model::DataModel;
use crate::resolver::{ComponentDependencyResolver, ResolvedView};
use crate::view::ViewDefinition;

/// Suffix of view descriptor files picked up by [`discover_views`]
pub const VIEW_SUFFIX: &str = ".view.yaml";

/// Read and merge model documents; later files win on conflicts
pub fn load_model(paths: &[PathBuf]) -> Result<DataModel> {
    let mut model = DataModel::new();
    for path in paths {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {:?}", path))?;
        let part = DataModel::from_yaml(&yaml)
            .with_context(|| format!("Failed to parse model file {:?}", path))?;
        model.merge(part);
    }
    Ok(model)
}

pub fn load_view(path: &Path) -> Result<ViewDefinition> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read view file {:?}", path))?;
    let descriptor = ViewDescriptor::from_yaml(&yaml)
        .with_context(|| format!("Failed to parse view descriptor {:?}", path))?;
    ViewDefinition::from_descriptor(descriptor)
        .with_context(|| format!("Invalid view declarations in {:?}", path))
}

/// Load and resolve one view file against `model`
pub fn resolve_file(path: &Path, model: &DataModel) -> Result<ResolvedView> {
    let view = load_view(path)?;
    ComponentDependencyResolver::new(model)
        .initialize(view)
        .with_context(|| format!("Failed to initialize view {:?}", path))
}

/// All `*.view.yaml` files under `root`, sorted
pub fn discover_views(root: &Path) -> Result<Vec<PathBuf>> {
    let mut views = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to scan {:?}", root))?;
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(VIEW_SUFFIX))
        {
            views.push(entry.into_path());
        }
    }
    views.sort();
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewError;
    use std::fs;
    use tempfile::TempDir;

    const MODEL: &str = r#"
plugin: basic
entities:
  company:
    fields:
      name: string
"#;

    #[test]
    fn discovers_only_view_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("basic/views")).unwrap();
        fs::write(dir.path().join("basic/views/b.view.yaml"), "").unwrap();
        fs::write(dir.path().join("basic/views/a.view.yaml"), "").unwrap();
        fs::write(dir.path().join("basic/model.yaml"), "").unwrap();

        let views = discover_views(dir.path()).unwrap();
        let names: Vec<_> = views
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.view.yaml", "b.view.yaml"]);
    }

    #[test]
    fn resolve_file_keeps_error_chain() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.yaml");
        fs::write(&model_path, MODEL).unwrap();
        let view_path = dir.path().join("company.view.yaml");
        fs::write(
            &view_path,
            r#"
plugin: basic
name: companyDetails
model: company
components:
  - name: form
    type: form
    children:
      - name: vat
        type: input
        field: vat
"#,
        )
        .unwrap();

        let model = load_model(&[model_path]).unwrap();
        let err = resolve_file(&view_path, &model).unwrap_err();
        let view_err = err.downcast_ref::<ViewError>().unwrap();
        assert_eq!(view_err.code(), "MES-023");
        assert!(format!("{:#}", err).contains("Failed to initialize view"));
    }

    #[test]
    fn missing_model_file() {
        let err = load_model(&[PathBuf::from("/nonexistent/model.yaml")]).unwrap_err();
        assert!(err.to_string().contains("Failed to read model file"));
    }
}
