use crate::app::dto::{AnnotationDto, BuildReportDto};
use crate::app::engine::XrefEngine;
use anyhow::{Result, bail};

/// Build the given files (all configurations of `project` when empty) and
/// print the report and the resulting diagnostics.
pub async fn run_build(
    engine: &XrefEngine,
    project: &str,
    files: Vec<String>,
    json: bool,
) -> Result<()> {
    let report: BuildReportDto = engine.build(project, files).await?.into();
    let model = engine.model(project);
    let diagnostics = engine.diagnostics(None);

    if json {
        let output = serde_json::json!({
            "report": report,
            "model": model,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Build #{} ({}): {}", report.id, report.project, report.status);
        println!("  Edges: {}", report.edges);
        println!("  Failures: {}", report.failures);
        println!("  Rebuilt: {}", report.rebuilt.join(", "));
        println!("{}", "=".repeat(60));

        for resource in &model.resources {
            println!("{}", resource.resource);
            for edge in &resource.edges {
                println!(
                    "  [{}] {} -> {} (bean {})",
                    edge.kind, edge.source.label, edge.target.label, edge.bean
                );
            }
        }

        if !diagnostics.annotations.is_empty() {
            println!("\nDiagnostics:");
            for annotation in &diagnostics.annotations {
                print_annotation(annotation);
            }
        }
    }

    if let Some(reason) = &report.reason {
        bail!("Build failed: {}", reason);
    }
    Ok(())
}

fn print_annotation(annotation: &AnnotationDto) {
    println!(
        "  {}:{} [{}] {}",
        annotation.resource, annotation.line, annotation.severity, annotation.message
    );
}

/// Build every configuration of `project` and print the cross-reference graph as DOT.
pub async fn print_graph(engine: &XrefEngine, project: &str) -> Result<()> {
    engine.build(project, Vec::new()).await?;
    print!("{}", engine.graph_dot(project));
    Ok(())
}
