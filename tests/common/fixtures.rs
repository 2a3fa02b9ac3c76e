//! Workspace descriptors shared by the integration tests.
#![allow(dead_code)]

use aspect_xref::adapters::workspace::{StaticWorkspace, WorkspaceDescriptor};
use serde_json::{Value, json};

pub fn workspace(value: Value) -> StaticWorkspace {
    let descriptor: WorkspaceDescriptor = serde_json::from_value(value).expect("valid descriptor");
    StaticWorkspace::new(descriptor).expect("consistent workspace")
}

/// One configuration `beans.xml` declaring aspect `asp` (before advice
/// `Asp.log()` on `C1.m(..)`) and three beans: `b1` of C1, abstract `b2`,
/// and `b3` of C3 which the pointcut does not select.
pub fn scenario() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [{
            "resource": "beans.xml",
            "project": "app",
            "beans": [
                { "name": "b1", "class": "com.example.C1", "line": 3 },
                { "name": "b2", "class": "com.example.C2", "line": 4, "abstract": true },
                { "name": "b3", "class": "com.example.C3", "line": 5 }
            ],
            "aspects": [{
                "name": "asp", "class": "com.example.Asp", "line": 10,
                "advice": [{ "kind": "before", "method": "log", "pointcut": "execution(com.example.C1.m(..))" }]
            }]
        }],
        "classes": [
            { "name": "com.example.Asp", "project": "app", "resource": "Asp.java",
              "methods": [{ "name": "log", "line": 4 }] },
            { "name": "com.example.C1", "project": "app", "resource": "C1.java",
              "methods": [{ "name": "m", "line": 7 }] },
            { "name": "com.example.C2", "project": "app", "resource": "C2.java",
              "methods": [{ "name": "m", "line": 3 }] },
            { "name": "com.example.C3", "project": "app", "resource": "C3.java",
              "methods": [{ "name": "other", "line": 5 }] }
        ]
    })
}

/// Two independent configurations `a.xml` and `b.xml`, each advising its
/// own service bean.
pub fn two_configs() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [
            {
                "resource": "a.xml",
                "project": "app",
                "beans": [{ "name": "orders", "class": "com.example.Orders", "line": 2 }],
                "aspects": [{
                    "name": "audit", "class": "com.example.Audit", "line": 6,
                    "advice": [{ "kind": "before", "method": "log", "pointcut": "bean(orders)" }]
                }]
            },
            {
                "resource": "b.xml",
                "project": "app",
                "beans": [{ "name": "billing", "class": "com.example.Billing", "line": 2 }],
                "aspects": [{
                    "name": "timing", "class": "com.example.Audit", "line": 6,
                    "advice": [{ "kind": "around", "method": "time", "pointcut": "bean(billing)" }]
                }]
            }
        ],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }, { "name": "time", "line": 8 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 5 }] },
            { "name": "com.example.Billing", "project": "app", "resource": "Billing.java",
              "methods": [{ "name": "charge", "line": 5 }] }
        ]
    })
}

/// Configurations importing each other, components nesting each other and
/// an infrastructure bean with an inner bean.
pub fn cyclic() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [
            {
                "resource": "root.xml",
                "project": "app",
                "imports": ["shared.xml"],
                "beans": [
                    { "name": "orders", "class": "com.example.Orders", "line": 2 },
                    { "name": "proxyCreator", "class": "com.example.Orders", "line": 3, "infrastructure": true,
                      "inner": [{ "name": "hidden", "class": "com.example.Orders", "line": 4 }] }
                ],
                "components": ["c1"],
                "aspects": [{
                    "name": "audit", "class": "com.example.Audit", "line": 8,
                    "advice": [{ "kind": "before", "method": "log", "pointcut": "execution(com.example.Orders.*(..))" }]
                }]
            },
            {
                "resource": "shared.xml",
                "project": "app",
                "imports": ["root.xml"],
                "aspects": [{
                    "name": "timing", "class": "com.example.Audit", "line": 3,
                    "advice": [{ "kind": "after", "method": "time", "pointcut": "execution(com.example.Orders.*(..))" }]
                }]
            }
        ],
        "components": [
            { "id": "c1", "resource": "root.xml", "nested": ["c2"],
              "beans": [{ "name": "scanned", "class": "com.example.Orders", "line": 12 }] },
            { "id": "c2", "resource": "root.xml", "nested": ["c1"],
              "beans": [{ "name": "deeper", "class": "com.example.Orders", "line": 13 }] }
        ],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }, { "name": "time", "line": 8 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 5 }] }
        ]
    })
}

/// `web` depends on `core`; `web/beans.xml` imports the aspect configuration
/// `core/aspects.xml`, whose beans refer to a core class and a web-only class.
pub fn cross_project() -> Value {
    json!({
        "projects": [
            { "name": "core" },
            { "name": "web", "depends_on": ["core"] }
        ],
        "configs": [
            {
                "resource": "core/aspects.xml",
                "project": "core",
                "beans": [
                    { "name": "repo", "class": "com.core.Repo", "line": 2 },
                    { "name": "controller", "class": "com.web.Controller", "line": 3 }
                ],
                "aspects": [{
                    "name": "tx", "class": "com.core.Tx", "line": 6,
                    "advice": [{ "kind": "around", "method": "wrap", "pointcut": "execution(com.**.*(..))" }]
                }]
            },
            {
                "resource": "web/beans.xml",
                "project": "web",
                "imports": ["core/aspects.xml"]
            }
        ],
        "classes": [
            { "name": "com.core.Tx", "project": "core", "resource": "core/Tx.java",
              "methods": [{ "name": "wrap", "line": 4 }] },
            { "name": "com.core.Repo", "project": "core", "resource": "core/Repo.java",
              "methods": [{ "name": "save", "line": 9 }] },
            { "name": "com.web.Controller", "project": "web", "resource": "web/Controller.java",
              "methods": [{ "name": "handle", "line": 11 }] }
        ]
    })
}

/// Two advice of different kinds on the same target method.
pub fn stacked_advice() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [{
            "resource": "beans.xml",
            "project": "app",
            "beans": [{ "name": "orders", "class": "com.example.Orders", "line": 2 }],
            "aspects": [{
                "name": "audit", "class": "com.example.Audit", "line": 6,
                "advice": [
                    { "kind": "before", "method": "log", "pointcut": "bean(orders)", "line": 7 },
                    { "kind": "after", "method": "time", "pointcut": "bean(orders)", "line": 8 }
                ]
            }]
        }],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }, { "name": "time", "line": 8 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 5 }] }
        ]
    })
}

/// A pointcut with an unbalanced parenthesis, applied to two beans.
pub fn malformed_pointcut() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [{
            "resource": "beans.xml",
            "project": "app",
            "beans": [
                { "name": "orders", "class": "com.example.Orders", "line": 2 },
                { "name": "billing", "class": "com.example.Orders", "line": 3 }
            ],
            "aspects": [{
                "name": "audit", "class": "com.example.Audit", "line": 6,
                "advice": [{ "kind": "before", "method": "log", "pointcut": "execution(com.example.Orders.*(..)" }]
            }]
        }],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 5 }] }
        ]
    })
}

/// `a.xml` only imports `o.xml`, which holds bean `orders` and aspect
/// `audit` advising it by bean name.
pub fn imported_aspects() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [
            { "resource": "a.xml", "project": "app", "imports": ["o.xml"] },
            {
                "resource": "o.xml",
                "project": "app",
                "beans": [{ "name": "orders", "class": "com.example.Orders", "line": 2 }],
                "aspects": [{
                    "name": "audit", "class": "com.example.Audit", "line": 6,
                    "advice": [{ "kind": "before", "method": "log", "pointcut": "bean(orders)" }]
                }]
            }
        ],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 7 }] }
        ]
    })
}

/// First bean's class is missing from the workspace; the second one matches.
pub fn missing_class() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [{
            "resource": "beans.xml",
            "project": "app",
            "beans": [
                { "name": "gone", "class": "com.missing.Gone", "line": 2 },
                { "name": "orders", "class": "com.example.Orders", "line": 3 }
            ],
            "aspects": [{
                "name": "audit", "class": "com.example.Audit", "line": 6,
                "advice": [{ "kind": "before", "method": "log", "pointcut": "execution(com.**.*(..))" }]
            }]
        }],
        "classes": [
            { "name": "com.example.Audit", "project": "app", "resource": "Audit.java",
              "methods": [{ "name": "log", "line": 3 }] },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java",
              "methods": [{ "name": "place", "line": 5 }] }
        ]
    })
}

/// XML introduction of `com.example.Auditable` into every `Orders` subtype.
pub fn introduction() -> Value {
    json!({
        "projects": [{ "name": "app" }],
        "configs": [{
            "resource": "beans.xml",
            "project": "app",
            "beans": [
                { "name": "orders", "class": "com.example.BulkOrders", "line": 2 },
                { "name": "billing", "class": "com.example.Billing", "line": 3 }
            ],
            "aspects": [{
                "name": "mixin", "class": "com.example.Mixin", "line": 6,
                "introductions": [{
                    "types": "com.example.Orders+",
                    "interface": "com.example.Auditable",
                    "default_impl": "com.example.DefaultAuditable",
                    "line": 7
                }]
            }]
        }],
        "classes": [
            { "name": "com.example.Mixin", "project": "app", "resource": "Mixin.java" },
            { "name": "com.example.Orders", "project": "app", "resource": "Orders.java" },
            { "name": "com.example.BulkOrders", "project": "app", "resource": "BulkOrders.java", "line": 1,
              "supertypes": ["com.example.Orders"] },
            { "name": "com.example.Billing", "project": "app", "resource": "Billing.java" }
        ]
    })
}
