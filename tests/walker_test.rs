//! Configuration graph traversal: imports, components, config sets and the
//! project a class is loaded in.

mod common;

use aspect_xref::app::config::EngineConfig;
use aspect_xref::app::engine::XrefEngine;
use aspect_xref::domain::definitions::AspectDefinitionCache;
use aspect_xref::domain::walker::ConfigGraphWalker;
use common::{fixtures, mock};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[test]
fn test_import_cycle_visits_each_configuration_once() {
    let ws = fixtures::workspace(fixtures::cyclic());
    let walker = ConfigGraphWalker::new(&ws);
    let mut cache = AspectDefinitionCache::new(&ws, &ws);
    let token = CancellationToken::new();

    let set = walker.collect_declarations("app", "root.xml", &mut cache, &token);
    assert!(set.failures.is_empty());
    let aspects: Vec<&str> = set
        .declarations
        .iter()
        .map(|d| d.aspect_name.as_str())
        .collect();
    assert_eq!(aspects, vec!["audit", "timing"]);
    assert_eq!(
        set.visited.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["root.xml", "shared.xml"]
    );
}

#[test]
fn test_candidates_follow_component_cycle_and_skip_infrastructure() {
    let ws = fixtures::workspace(fixtures::cyclic());
    let walker = ConfigGraphWalker::new(&ws);
    let mut cache = AspectDefinitionCache::new(&ws, &ws);
    let token = CancellationToken::new();
    let set = walker.collect_declarations("app", "root.xml", &mut cache, &token);

    let audit = set
        .declarations
        .iter()
        .find(|d| d.aspect_name == "audit")
        .unwrap();
    let names: Vec<String> = walker
        .candidate_beans(audit, &token)
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["orders", "scanned", "deeper"]);

    // shared.xml declares no beans of its own
    let timing = set
        .declarations
        .iter()
        .find(|d| d.aspect_name == "timing")
        .unwrap();
    assert!(walker.candidate_beans(timing, &token).is_empty());
}

#[test]
fn test_cancelled_walk_returns_early() {
    let ws = fixtures::workspace(fixtures::cyclic());
    let walker = ConfigGraphWalker::new(&ws);
    let mut cache = AspectDefinitionCache::new(&ws, &ws);
    let token = CancellationToken::new();
    token.cancel();

    let set = walker.collect_declarations("app", "root.xml", &mut cache, &token);
    assert!(set.declarations.is_empty());
}

#[test]
fn test_config_set_siblings_are_candidates() {
    let ws = fixtures::workspace(json!({
        "projects": [{ "name": "app" }],
        "configs": [
            {
                "resource": "aspects.xml", "project": "app",
                "aspects": [{
                    "name": "audit", "class": "com.example.Audit", "line": 2,
                    "advice": [{ "kind": "before", "method": "log", "pointcut": "bean(*)" }]
                }]
            },
            {
                "resource": "services.xml", "project": "app",
                "beans": [{ "name": "orders", "class": "com.example.Orders", "line": 2 }]
            },
            {
                "resource": "other.xml", "project": "app",
                "beans": [{ "name": "unrelated", "class": "com.example.Orders", "line": 2 }]
            }
        ],
        "config_sets": [{ "name": "main", "project": "app", "configs": ["aspects.xml", "services.xml"] }],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 5 }] }
        ]
    }));
    let walker = ConfigGraphWalker::new(&ws);
    let mut cache = AspectDefinitionCache::new(&ws, &ws);
    let token = CancellationToken::new();
    let set = walker.collect_declarations("app", "aspects.xml", &mut cache, &token);

    let names: Vec<String> = walker
        .candidate_beans(&set.declarations[0], &token)
        .into_iter()
        .map(|b| b.name)
        .collect();
    assert_eq!(names, vec!["orders"]);
}

#[tokio::test]
async fn test_cyclic_workspace_builds() {
    let engine = XrefEngine::with_workspace(
        fixtures::workspace(fixtures::cyclic()),
        None,
        EngineConfig::default(),
    );
    let report = engine
        .build("app", vec!["root.xml".to_string()])
        .await
        .unwrap();
    assert_eq!(report.edges, 3);
    assert_eq!(report.rebuilt, vec!["root.xml", "shared.xml"]);

    // three beans, one target method: the markers collapse
    assert_eq!(engine.diagnostics(None).annotations.len(), 2);
}

#[tokio::test]
async fn test_classes_load_in_the_declaring_project() {
    let (collaborators, extractor) =
        mock::breakable(fixtures::workspace(fixtures::cross_project()));
    let engine = XrefEngine::new(collaborators, EngineConfig::default());
    let report = engine
        .build("web", vec!["web/beans.xml".to_string()])
        .await
        .unwrap();

    // com.web.Controller is invisible from core: benign, no edge
    assert_eq!(report.edges, 1);
    assert_eq!(report.failures, 1);
    let model = engine.model_snapshot("web");
    let edges = model.edges_for("core/aspects.xml");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].target.handle, "com.core.Repo.save()");
    assert!(
        engine
            .diagnostics(None)
            .annotations
            .iter()
            .all(|a| a.category != "problem")
    );
    assert!(!engine.diagnostics(Some("core/Repo.java")).annotations.is_empty());

    // rebuilding the imported file from its own project retracts what the
    // web build attributed to it
    extractor.break_file("core/aspects.xml");
    engine
        .build("core", vec!["core/aspects.xml".to_string()])
        .await
        .unwrap();
    assert!(engine.diagnostics(Some("core/Repo.java")).annotations.is_empty());
    assert_eq!(
        engine
            .diagnostics(Some("core/aspects.xml"))
            .annotations
            .iter()
            .map(|a| a.category.as_str())
            .collect::<Vec<_>>(),
        vec!["problem"]
    );
}
