//! Warehouse access token mutations
//!
//! Creating a token is a single non-idempotent write: submitting the same variables
//! twice creates two tokens.

use crate::{
    api::{AnalyticsApi, WarehouseAccessToken},
    errors::{ApiError, ApiResult},
    keys::{CacheKey, analytics_keys},
    mutation::{Mutation, MutationOptions, MutationState, use_mutation},
};
use dioxus::prelude::Signal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseAccessTokenCreateVariables {
    pub project_ref: String,
    pub description: String,
}

impl WarehouseAccessTokenCreateVariables {
    pub fn new(project_ref: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            project_ref: project_ref.into(),
            description: description.into(),
        }
    }
}

/// Creates a warehouse access token and invalidates the project's token list
#[derive(Clone)]
pub struct CreateWarehouseAccessToken<A> {
    api: A,
}

impl<A: AnalyticsApi> CreateWarehouseAccessToken<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: AnalyticsApi> Mutation<WarehouseAccessTokenCreateVariables>
    for CreateWarehouseAccessToken<A>
{
    type Output = WarehouseAccessToken;
    type Error = ApiError;

    async fn mutate(
        &self,
        vars: WarehouseAccessTokenCreateVariables,
    ) -> ApiResult<WarehouseAccessToken> {
        if vars.project_ref.trim().is_empty() {
            return Err(ApiError::invalid_input("Project ref is required"));
        }
        self.api
            .create_warehouse_access_token(&vars.project_ref, &vars.description)
            .await
    }

    fn id(&self) -> String {
        "create_warehouse_access_token".to_string()
    }

    fn invalidates(&self, vars: &WarehouseAccessTokenCreateVariables) -> Vec<CacheKey> {
        vec![analytics_keys::warehouse_access_tokens(&vars.project_ref)]
    }

    fn error_message(&self, error: &ApiError) -> String {
        format!("Failed to create token: {}", error.message())
    }
}

/// Hook wrapping [`CreateWarehouseAccessToken`] in [`use_mutation`]
pub fn use_create_warehouse_access_token<A: AnalyticsApi>(
    api: A,
    options: MutationOptions<WarehouseAccessTokenCreateVariables, WarehouseAccessToken, ApiError>,
) -> (
    Signal<MutationState<WarehouseAccessToken, ApiError>>,
    impl Fn(WarehouseAccessTokenCreateVariables) + Clone,
) {
    use_mutation(CreateWarehouseAccessToken::new(api), options)
}
