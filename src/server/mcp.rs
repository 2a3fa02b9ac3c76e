use crate::app::dto::*;
use crate::app::engine::XrefEngine;
use rmcp::{
    Json, ServerHandler, ServiceExt, handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters, model::*, tool, tool_handler, tool_router,
    transport::stdio,
};

#[derive(Clone)]
pub struct XrefMcpServer {
    engine: XrefEngine,
    tool_router: ToolRouter<Self>,
}

impl XrefMcpServer {
    pub fn new(engine: XrefEngine) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        let service = self.serve(stdio()).await?;
        service.waiting().await?;
        Ok(())
    }
}

#[tool_router]
impl XrefMcpServer {
    #[tool(
        description = "Rebuild the aspect cross-reference model for changed files of a project (all configurations when no files are given)."
    )]
    async fn submit_changes(
        &self,
        params: Parameters<SubmitChangesRequest>,
    ) -> Result<Json<SubmitChangesResponse>, String> {
        self.engine
            .submit_changes(params.0)
            .await
            .map(Json)
            .map_err(|e| e.to_string())
    }

    #[tool(description = "Get the reference model (advice edges by declaring file) of a project.")]
    async fn get_model(&self, params: Parameters<ModelRequest>) -> Result<Json<ModelResponse>, String> {
        Ok(Json(self.engine.model(&params.0.project)))
    }

    #[tool(description = "List diagnostic annotations, optionally for one resource.")]
    async fn get_diagnostics(
        &self,
        params: Parameters<DiagnosticsRequest>,
    ) -> Result<Json<DiagnosticsResponse>, String> {
        Ok(Json(self.engine.diagnostics(params.0.resource.as_deref())))
    }

    #[tool(description = "What an element advises and what advises it.")]
    async fn get_xref(&self, params: Parameters<XrefRequest>) -> Result<Json<XrefResponse>, String> {
        self.engine
            .xref(params.0)
            .map(Json)
            .map_err(|e| e.to_string())
    }
}

#[tool_handler]
impl ServerHandler for XrefMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Query which program elements aspect advice declarations apply to, and the diagnostics derived from them."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::workspace::{StaticWorkspace, WorkspaceDescriptor};
    use crate::app::config::EngineConfig;

    #[tokio::test]
    async fn test_mcp_tools_smoke() {
        let descriptor: WorkspaceDescriptor = serde_json::from_value(serde_json::json!({
            "projects": [{ "name": "app" }],
            "configs": [{
                "resource": "beans.xml",
                "project": "app",
                "beans": [{ "name": "orders", "class": "com.example.Orders", "line": 3 }],
                "aspects": [{
                    "name": "audit", "class": "com.example.Audit", "line": 5,
                    "advice": [{ "kind": "around", "method": "time", "pointcut": "execution(com.example.Orders.*(..))" }]
                }]
            }],
            "classes": [
                { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
                  "methods": [{ "name": "time", "line": 4 }] },
                { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
                  "methods": [{ "name": "place", "line": 7 }, { "name": "cancel", "line": 9 }] }
            ]
        }))
        .unwrap();
        let engine = XrefEngine::with_workspace(
            StaticWorkspace::new(descriptor).unwrap(),
            None,
            EngineConfig::default(),
        );
        let server = XrefMcpServer::new(engine);

        let submitted = server
            .submit_changes(Parameters(SubmitChangesRequest {
                project: "app".into(),
                files: vec![],
                wait: true,
            }))
            .await
            .unwrap()
            .0;
        let report = submitted.report.unwrap();
        assert_eq!(report.status, "completed");
        assert_eq!(report.edges, 2);

        let model = server
            .get_model(Parameters(ModelRequest {
                project: "app".into(),
            }))
            .await
            .unwrap()
            .0;
        assert_eq!(model.resources.len(), 1);
        assert_eq!(model.resources[0].resource, "beans.xml");

        let diagnostics = server
            .get_diagnostics(Parameters(DiagnosticsRequest {
                resource: Some("beans.xml".into()),
            }))
            .await
            .unwrap()
            .0;
        // one source marker per advised method, same line
        assert_eq!(diagnostics.annotations.len(), 2);

        let xref = server
            .get_xref(Parameters(XrefRequest {
                project: "app".into(),
                element: "com.example.Orders.cancel()".into(),
            }))
            .await
            .unwrap()
            .0;
        assert_eq!(xref.advised_by[0].kind, "around");

        assert!(
            server
                .get_xref(Parameters(XrefRequest {
                    project: "app".into(),
                    element: "missing".into(),
                }))
                .await
                .is_err()
        );
    }
}
