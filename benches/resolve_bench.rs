//! Quick benchmark to verify resolver performance on wide and deep views

use mes_view::{
    prepare_view, ComponentDeclaration, ComponentDependencyResolver, ComponentKind, DataModel,
    ViewDefinition, ViewDefinitionBuilder,
};
use std::time::Instant;

/// `width` forms with `depth` inputs each, every input reading through the next one
fn build_view(width: usize, depth: usize) -> ViewDefinition {
    let mut builder = ViewDefinitionBuilder::new("bench", "wide");
    for f in 0..width {
        let form = builder.add(
            None,
            ComponentDeclaration::new(&format!("form{}", f), ComponentKind::Form { expression: None }),
        );
        for d in 0..depth {
            let mut decl = ComponentDeclaration::new(&format!("input{}", d), ComponentKind::Input)
                .with_reference(&format!("f{}i{}", f, d));
            if d + 1 < depth {
                decl = decl.with_field_path(format!("#{{f{}i{}}}", f, d + 1));
            }
            builder.add(Some(form), decl);
        }
    }
    builder.build().unwrap()
}

fn main() {
    let model = DataModel::new();
    let resolver = ComponentDependencyResolver::new(&model);

    println!("Component Dependency Resolution Performance Test");
    println!("================================================\n");

    for (width, depth) in [(10, 1), (50, 5), (20, 20), (1, 100)] {
        let iterations = 200;
        let views: Vec<ViewDefinition> = (0..iterations).map(|_| build_view(width, depth)).collect();

        let start = Instant::now();
        let mut passes = 0;
        for view in views {
            let resolved = resolver.initialize(view).unwrap();
            passes = resolved.passes();
        }
        let elapsed = start.elapsed();

        println!("View: {} forms x {} chained inputs", width, depth);
        println!("  Passes: {}", passes);
        println!("  Time for {} iterations: {:?}", iterations, elapsed);
        println!("  Per operation: {:?}\n", elapsed / iterations as u32);
    }

    let resolved = resolver.initialize(build_view(50, 5)).unwrap();
    let iterations = 1_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = prepare_view(&resolved);
    }
    let elapsed = start.elapsed();
    println!("prepare_view (250 components)");
    println!("  Per operation: {:?}", elapsed / iterations);
}
