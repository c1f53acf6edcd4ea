//! # Domain Clients
//!
//! Type-safe wrappers around [`ResourceClient`](resource_framework::ResourceClient),
//! one per portal resource. Every client implements
//! [`ApiClient`](resource_framework::ApiClient), which supplies `list`,
//! `list_records`, `get_by_id`, `fetch_record`, `delete` and `change_status`;
//! the macro below adds the typed `create_*`/`update_*` helpers.
//!
//! Roles carry extra permission operations ([`role_client`]) and the dashboard
//! is a read-only client of its own ([`dashboard_client`]).

macro_rules! resource_client {
    ($(#[$doc:meta])* $client:ident, $resource:ty, $create:ty, $update:ty, $name:ident) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $client {
            inner: resource_framework::ResourceClient<$resource>,
        }

        impl $client {
            pub fn new(inner: resource_framework::ResourceClient<$resource>) -> Self {
                Self { inner }
            }
        }

        impl resource_framework::ApiClient<$resource> for $client {
            fn inner(&self) -> &resource_framework::ResourceClient<$resource> {
                &self.inner
            }
        }

        paste::paste! {
            impl $client {
                #[tracing::instrument(skip(self))]
                pub async fn [<create_ $name>](
                    &self,
                    params: $create,
                ) -> Result<serde_json::Value, resource_framework::ResourceError> {
                    tracing::debug!("Sending request");
                    self.inner.create(&params).await
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<update_ $name>](
                    &self,
                    id: resource_framework::ResourceId,
                    update: $update,
                ) -> Result<serde_json::Value, resource_framework::ResourceError> {
                    tracing::debug!("Sending request");
                    self.inner.update(Some(&id), &update).await
                }
            }
        }
    };
}

pub mod dashboard_client;
pub mod role_client;

pub use dashboard_client::DashboardClient;

use crate::model::{
    Action, ActionInput, Connector, ConnectorCreate, ConnectorUpdate, DocumentType, DocumentTypeInput, Module,
    ModuleInput, Role, RoleInput,
};

resource_client!(
    /// Client for SMS connectors.
    ConnectorClient, Connector, ConnectorCreate, ConnectorUpdate, connector
);

resource_client!(
    /// Client for billing document types.
    DocumentTypeClient, DocumentType, DocumentTypeInput, DocumentTypeInput, document_type
);

resource_client!(
    /// Client for roles; see [`role_client`] for permissions.
    RoleClient, Role, RoleInput, RoleInput, role
);

resource_client!(
    /// Client for portal modules.
    ModuleClient, Module, ModuleInput, ModuleInput, module
);

resource_client!(
    /// Client for module actions.
    ActionClient, Action, ActionInput, ActionInput, action
);
