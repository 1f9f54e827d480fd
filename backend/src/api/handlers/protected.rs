//! Grant-gated actions.
//!
//! Each path is bound to one action slug. A request reaches the handler only
//! after the access token gate and then the grant gate for that slug.

use axum::{
    extract::Path,
    middleware,
    routing::{get, MethodFilter, MethodRouter},
    Router,
};

use crate::api::middleware::grant::{grant_middleware, GrantGate};
use crate::api::SharedState;

struct ProtectedAction {
    path: &'static str,
    slug: &'static str,
    methods: &'static [(MethodFilter, &'static str)],
}

const ACTIONS: &[ProtectedAction] = &[
    ProtectedAction {
        path: "/create-sale",
        slug: "create-sale",
        methods: &[(MethodFilter::POST, "Adding Sale")],
    },
    ProtectedAction {
        path: "/edit-sale",
        slug: "edit-sale",
        methods: &[(MethodFilter::PUT, "Editing Sale")],
    },
    ProtectedAction {
        path: "/refund-transaction",
        slug: "refund-transaction",
        methods: &[(MethodFilter::POST, "Processing Refunds")],
    },
    ProtectedAction {
        path: "/view-inventory",
        slug: "view-inventory",
        methods: &[(MethodFilter::GET, "Viewing Inventory")],
    },
    ProtectedAction {
        path: "/manage-inventory",
        slug: "manage-inventory",
        methods: &[
            (MethodFilter::POST, "Adding items to Inventory"),
            (MethodFilter::PUT, "Updating Inventory"),
            (MethodFilter::DELETE, "Removing items from Inventory"),
        ],
    },
    ProtectedAction {
        path: "/generate-reports",
        slug: "generate-reports",
        methods: &[(MethodFilter::GET, "Generating Reports")],
    },
    ProtectedAction {
        path: "/customer-management",
        slug: "customer-management",
        methods: &[
            (MethodFilter::POST, "Adding Customers"),
            (MethodFilter::PUT, "Editing Customers"),
            (MethodFilter::DELETE, "Deleting Customers"),
        ],
    },
    ProtectedAction {
        path: "/user-management",
        slug: "user-management",
        methods: &[
            (MethodFilter::POST, "Adding Users"),
            (MethodFilter::PUT, "Editing Users"),
            (MethodFilter::DELETE, "Deleting Users"),
        ],
    },
    ProtectedAction {
        path: "/access-settings",
        slug: "access-settings",
        methods: &[(MethodFilter::GET, "Accessing Settings")],
    },
];

const REPORT_BY_ID_SLUG: &str = "generate-reports/{id}";

async fn report_by_id(Path(id): Path<String>) -> String {
    format!("Generating Reports: {id}")
}

fn gated(
    state: &SharedState,
    path: &str,
    slug: &'static str,
    methods: MethodRouter<SharedState>,
) -> Router<SharedState> {
    Router::new()
        .route(path, methods)
        .route_layer(middleware::from_fn_with_state(
            GrantGate {
                state: state.clone(),
                action: slug,
            },
            grant_middleware,
        ))
}

/// Every gated action. The caller adds the access token gate outside.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let mut router = Router::new();

    for action in ACTIONS {
        let mut methods: MethodRouter<SharedState> = MethodRouter::new();
        for &(filter, description) in action.methods {
            methods = methods.on(filter, move || async move { description });
        }
        router = router.merge(gated(state, action.path, action.slug, methods));
    }

    router.merge(gated(
        state,
        "/generate-reports/{id}",
        REPORT_BY_ID_SLUG,
        get(report_by_id),
    ))
}
