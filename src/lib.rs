//! mes-view - component dependency resolution for declarative MES views

pub mod cache;
pub mod declaration;
pub mod error;
pub mod interner;
pub mod listeners;
pub mod loader;
pub mod model;
pub mod path_expr;
pub mod render;
pub mod resolver;
pub mod session;
pub mod view;

pub use cache::ViewCache;
pub use declaration::{
    ComponentDeclaration, ComponentKind, ComponentOption, CustomEventBinding, ViewDescriptor,
};
pub use error::{FixSuggestion, StuckComponent, ViewError};
pub use listeners::{ListenerEdge, ListenerKind, ListenerRegistry};
pub use model::{DataDefinition, DataDefinitions, DataModel, DataScope, FieldType};
pub use path_expr::{parse_path_expression, ResolvedBinding};
pub use render::{prepare_view, ComponentView, ViewModel};
pub use resolver::{ComponentDependencyResolver, ComponentNode, FieldScope, ResolvedView};
pub use session::{ChangeNotification, ComponentState, ViewSession};
pub use view::{ComponentId, RegisteredComponent, ViewDefinition, ViewDefinitionBuilder};
