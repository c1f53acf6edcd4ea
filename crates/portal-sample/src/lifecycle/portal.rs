use std::sync::Arc;

use futures::FutureExt;
use resource_framework::cache::FetchFuture;
use resource_framework::envelope::normalize_records;
use resource_framework::notify::TracingNotifier;
use resource_framework::{
    query_key, ApiCaller, CacheActor, CacheStats, ClientConfig, ConfigError, CredentialStore, HttpTransport,
    ListParams, Mutation, MutationMessages, Notifier, Operation, Query, QueryCache, QueryClient, QueryKey, Resource,
    ResourceClient, ResourceError, ResourceId, ResourceQueries, SessionCredential, Transport, TransportError,
};
use serde_json::Value;
use tracing::{error, info};

use crate::clients::dashboard_client::{self, parse_summary, parse_traffic};
use crate::clients::role_client::{ASSIGN_PERMISSIONS, PERMISSIONS};
use crate::clients::{ActionClient, ConnectorClient, DashboardClient, DocumentTypeClient, ModuleClient, RoleClient};
use crate::model::{
    Action, Connector, DashboardSummary, DateRange, DocumentType, Module, PermissionAssignment, Role, RoleModule,
    TrafficPoint,
};

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not build the HTTP transport: {0}")]
    Transport(#[from] TransportError),

    #[error("Cache actor failed: {0}")]
    Actor(String),
}

/// The data layer of the portal: one cache actor, one credential, one client
/// per resource family, plus the query and mutation builders screens use.
///
/// # Example
///
/// ```ignore
/// let portal = Portal::new(&ClientConfig::from_env()?)?;
///
/// let connectors = portal.connectors_query(ListParams::default(), true);
/// connectors.fetch().await;
///
/// let create = portal.create_connector();
/// create.mutate(ConnectorCreate::new("Route A", 310, 0));
///
/// // Queries and mutations hold cache handles; drop them before shutting down.
/// drop((connectors, create));
/// portal.shutdown().await?;
/// ```
pub struct Portal {
    pub connector_client: ConnectorClient,
    pub document_type_client: DocumentTypeClient,
    pub role_client: RoleClient,
    pub module_client: ModuleClient,
    pub action_client: ActionClient,
    pub dashboard_client: DashboardClient,

    connectors: ResourceQueries<Connector>,
    document_types: ResourceQueries<DocumentType>,
    roles: ResourceQueries<Role>,
    modules: ResourceQueries<Module>,
    actions: ResourceQueries<Action>,

    queries: QueryClient,
    credentials: Arc<SessionCredential>,

    /// Task handles for the running actors (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl Portal {
    /// Builds the portal against the real backends.
    ///
    /// The API key is taken from `config.credential_env` when set; otherwise the
    /// session starts signed out and every call fails until [`Portal::sign_in`].
    pub fn new(config: &ClientConfig) -> Result<Self, PortalError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        let credentials = Arc::new(SessionCredential::from_env(&config.credential_env));
        let cache = CacheActor::with_limits(config.cache_buffer, config.cache_limits);
        Ok(Self::assemble(transport, credentials, Arc::new(TracingNotifier), cache))
    }

    /// Builds the portal from explicit parts; tests pass a mock transport here.
    pub fn with_parts(
        transport: Arc<dyn Transport>,
        credentials: Arc<SessionCredential>,
        notifier: Arc<dyn Notifier>,
        cache_buffer: usize,
    ) -> Self {
        Self::assemble(transport, credentials, notifier, CacheActor::new(cache_buffer))
    }

    fn assemble(
        transport: Arc<dyn Transport>,
        credentials: Arc<SessionCredential>,
        notifier: Arc<dyn Notifier>,
        (cache_actor, cache): (CacheActor, QueryCache),
    ) -> Self {
        let cache_handle = tokio::spawn(cache_actor.run());

        let store: Arc<dyn CredentialStore> = credentials.clone();
        let caller = ApiCaller::new(transport, store);
        let queries = QueryClient::new(cache, notifier);

        let connectors = ResourceQueries::new(ResourceClient::new(caller.clone()), queries.clone());
        let document_types = ResourceQueries::new(ResourceClient::new(caller.clone()), queries.clone());
        let roles = ResourceQueries::new(ResourceClient::new(caller.clone()), queries.clone());
        let modules = ResourceQueries::new(ResourceClient::new(caller.clone()), queries.clone());
        let actions = ResourceQueries::new(ResourceClient::new(caller.clone()), queries.clone());

        Self {
            connector_client: ConnectorClient::new(ResourceClient::new(caller.clone())),
            document_type_client: DocumentTypeClient::new(ResourceClient::new(caller.clone())),
            role_client: RoleClient::new(ResourceClient::new(caller.clone())),
            module_client: ModuleClient::new(ResourceClient::new(caller.clone())),
            action_client: ActionClient::new(ResourceClient::new(caller.clone())),
            dashboard_client: DashboardClient::new(caller),
            connectors,
            document_types,
            roles,
            modules,
            actions,
            queries,
            credentials,
            handles: vec![cache_handle],
        }
    }

    /// Moves the session credential from absent to present.
    pub fn sign_in(&self, api_key: impl Into<String>) -> Result<(), ResourceError> {
        self.credentials.sign_in(api_key)
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.is_present()
    }

    pub fn cache(&self) -> &QueryCache {
        self.queries.cache()
    }

    pub async fn cache_stats(&self) -> Result<CacheStats, ResourceError> {
        self.queries.cache().stats().await
    }

    /// Modules and actions granted to a role. Disabled for a missing or falsy id,
    /// and while signed out.
    pub fn role_modules_query(&self, role_id: Option<ResourceId>) -> Query<Vec<RoleModule>> {
        let enabled = self.is_signed_in() && role_id.as_ref().is_some_and(|id| !id.is_falsy());
        let key_id = role_id.as_ref().map_or(Value::Null, |id| Value::from(id.to_string()));
        let key = self.roles.key(PERMISSIONS, &key_id);
        let client = self.role_client.clone();

        self.queries
            .query(
                key,
                move || {
                    let client = client.clone();
                    let role_id = role_id.clone();
                    async move { client.role_modules(role_id.as_ref()).await }.boxed()
                },
                |body: &Value| normalize_records(body, Some("modules")),
            )
            .enabled(enabled)
            .error_title("Could not load the role permissions")
    }

    /// Replaces a role's permissions; refreshes every role query on success.
    pub fn assign_role_permissions(&self) -> Mutation<PermissionAssignment> {
        let client = self.role_client.clone();
        Mutation::new(
            &self.queries,
            Role::FAMILY,
            MutationMessages::for_operation(Role::LABEL, ASSIGN_PERMISSIONS),
            move |assignment: PermissionAssignment| {
                let client = client.clone();
                async move { client.assign_permissions(&assignment).await }.boxed()
            },
        )
    }

    /// Totals for a date range. Disabled while signed out.
    pub fn dashboard_summary_query(&self, range: DateRange) -> Query<DashboardSummary> {
        let key = self.dashboard_key(dashboard_client::SUMMARY, &range);
        let client = self.dashboard_client.clone();
        self.dashboard_query(key, parse_summary, "Could not load the dashboard summary", move || {
            let client = client.clone();
            let range = range.clone();
            async move { client.summary(&range).await }.boxed()
        })
    }

    /// Daily traffic for a date range. Disabled while signed out.
    pub fn dashboard_traffic_query(&self, range: DateRange) -> Query<Vec<TrafficPoint>> {
        let key = self.dashboard_key(dashboard_client::TRAFFIC, &range);
        let client = self.dashboard_client.clone();
        self.dashboard_query(key, parse_traffic, "Could not load the dashboard traffic", move || {
            let client = client.clone();
            let range = range.clone();
            async move { client.traffic(&range).await }.boxed()
        })
    }

    fn dashboard_key(&self, operation: Operation, range: &DateRange) -> QueryKey {
        let params = serde_json::to_value(range).unwrap_or(Value::Null);
        query_key(dashboard_client::FAMILY, operation, &params, self.dashboard_client.caller())
    }

    fn dashboard_query<T, F>(&self, key: QueryKey, selector: fn(&Value) -> T, title: &str, fetcher: F) -> Query<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> FetchFuture + Send + Sync + 'static,
    {
        let signed_in = self.dashboard_client.caller().credential().is_some();
        self.queries
            .query(key, fetcher, selector)
            .enabled(signed_in)
            .error_title(title)
    }

    /// Gracefully shuts down the portal.
    ///
    /// Drops every cache handle the portal owns and waits for the cache actor to
    /// exit. Queries and mutations handed out earlier keep the actor alive, so
    /// they must be dropped first.
    pub async fn shutdown(self) -> Result<(), PortalError> {
        info!("Shutting down system...");

        let Portal {
            connector_client,
            document_type_client,
            role_client,
            module_client,
            action_client,
            dashboard_client,
            connectors,
            document_types,
            roles,
            modules,
            actions,
            queries,
            credentials,
            handles,
        } = self;
        drop((connector_client, document_type_client, role_client, module_client, action_client));
        drop((dashboard_client, credentials));
        drop((connectors, document_types, roles, modules, actions));
        drop(queries);

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(PortalError::Actor(format!("{:?}", e)));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

/// Generates the per-family query and mutation builders on [`Portal`].
macro_rules! family_hooks {
    ($field:ident, $resource:ty, $plural:ident, $single:ident) => {
        paste::paste! {
            impl Portal {
                #[doc = "List query for `" $plural "`; disabled while signed out."]
                pub fn [<$plural _query>](&self, params: ListParams, enabled: bool) -> Query<Vec<$resource>> {
                    self.$field.list(params, enabled)
                }

                pub fn [<$single _query>](&self, id: Option<ResourceId>) -> Query<Option<$resource>> {
                    self.$field.detail(id)
                }

                pub fn [<create_ $single>](&self) -> Mutation<<$resource as Resource>::Create> {
                    self.$field.create()
                }

                pub fn [<update_ $single>](&self) -> Mutation<(ResourceId, <$resource as Resource>::Update)> {
                    self.$field.update()
                }

                pub fn [<delete_ $single>](&self) -> Mutation<ResourceId> {
                    self.$field.delete()
                }

                pub fn [<toggle_ $single _status>](&self) -> Mutation<$resource> {
                    self.$field.toggle_status()
                }
            }
        }
    };
}

family_hooks!(connectors, Connector, connectors, connector);
family_hooks!(document_types, DocumentType, document_types, document_type);
family_hooks!(roles, Role, roles, role);
family_hooks!(modules, Module, modules, module);
family_hooks!(actions, Action, actions, action);
