//! # Mutation System
//!
//! Mutations are remote writes that keep the query cache coherent by invalidating the
//! reads they affect ("write-then-invalidate"): on success every key returned by
//! [`Mutation::invalidates`] is marked stale, so the next read refetches. Nothing is
//! updated in place and nothing is invalidated when the write fails.
//!
//! Failures go through one path: the caller's `on_error` handler if it supplied one,
//! otherwise an error toast built from [`Mutation::error_message`]. There are no retries.
//!
//! [`run_mutation`] is the framework-free core; [`use_mutation`] binds it to Dioxus.

use dioxus::prelude::*;
use std::{future::Future, rc::Rc};
use tracing::debug;

use crate::{
    cache::CacheInvalidator,
    keys::CacheKey,
    notify::{Notifier, ToastQueue},
    query::QueryClient,
};

/// Represents the state of a mutation operation
#[derive(Clone, PartialEq, Debug)]
pub enum MutationState<T, E> {
    /// The mutation is idle (not running)
    Idle,
    /// The mutation is currently loading
    Loading,
    /// The mutation completed successfully
    Success(T),
    /// The mutation failed with an error
    Error(E),
}

impl<T, E> MutationState<T, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, MutationState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, MutationState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, MutationState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            MutationState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            MutationState::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Trait for defining mutations - operations that modify remote data
///
/// ## Example
///
/// ```rust,no_run
/// use dioxus_studio_reports::prelude::*;
///
/// #[derive(Clone)]
/// struct RevokeToken;
///
/// impl Mutation<String> for RevokeToken {
///     type Output = ();
///     type Error = ApiError;
///
///     async fn mutate(&self, project_ref: String) -> Result<(), ApiError> {
///         Ok(())
///     }
///
///     fn invalidates(&self, project_ref: &String) -> Vec<CacheKey> {
///         vec![analytics_keys::warehouse_access_tokens(project_ref)]
///     }
/// }
/// ```
pub trait Mutation<Input = ()>: Clone + 'static
where
    Input: Clone + 'static,
{
    /// The type of data returned on successful mutation
    type Output: Clone + PartialEq + 'static;
    /// The type of error returned on mutation failure
    type Error: Clone + std::fmt::Display + 'static;

    /// Execute the mutation with the given input. Called exactly once per trigger.
    fn mutate(&self, input: Input) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Get a unique identifier for this mutation type
    fn id(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Cache keys to invalidate after a successful mutation
    fn invalidates(&self, _input: &Input) -> Vec<CacheKey> {
        Vec::new()
    }

    /// Message shown to the user when the mutation fails and no `on_error` handler is set
    fn error_message(&self, error: &Self::Error) -> String {
        error.to_string()
    }
}

type SuccessCallback<Input, Output> = Rc<dyn Fn(&Output, &Input)>;
type ErrorCallback<Input, Error> = Rc<dyn Fn(&Error, &Input)>;

/// Caller hooks run after a mutation settles
pub struct MutationOptions<Input, Output, Error> {
    on_success: Option<SuccessCallback<Input, Output>>,
    on_error: Option<ErrorCallback<Input, Error>>,
}

impl<Input, Output, Error> Default for MutationOptions<Input, Output, Error> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<Input, Output, Error> Clone for MutationOptions<Input, Output, Error> {
    fn clone(&self) -> Self {
        Self {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<Input, Output, Error> MutationOptions<Input, Output, Error> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs after the invalidations of a successful mutation
    pub fn on_success(mut self, f: impl Fn(&Output, &Input) + 'static) -> Self {
        self.on_success = Some(Rc::new(f));
        self
    }

    /// Replaces the default error toast
    pub fn on_error(mut self, f: impl Fn(&Error, &Input) + 'static) -> Self {
        self.on_error = Some(Rc::new(f));
        self
    }
}

/// Runs `mutation` once, then invalidates on success or reports the error on failure.
pub async fn run_mutation<M, Input, I, N>(
    mutation: &M,
    input: Input,
    invalidator: &I,
    notifier: &N,
    options: &MutationOptions<Input, M::Output, M::Error>,
) -> Result<M::Output, M::Error>
where
    M: Mutation<Input>,
    Input: Clone + 'static,
    I: CacheInvalidator + ?Sized,
    N: Notifier + ?Sized,
{
    debug!("🔄 [MUTATION] Starting mutation: {}", mutation.id());

    match mutation.mutate(input.clone()).await {
        Ok(output) => {
            debug!("✅ [MUTATION] Mutation succeeded: {}", mutation.id());
            for cache_key in mutation.invalidates(&input) {
                debug!("🗑️ [MUTATION] Invalidating cache key: {}", cache_key);
                invalidator.invalidate(&cache_key);
            }
            if let Some(on_success) = &options.on_success {
                on_success(&output, &input);
            }
            Ok(output)
        }
        Err(error) => {
            debug!("❌ [MUTATION] Mutation failed: {}: {}", mutation.id(), error);
            match &options.on_error {
                Some(on_error) => on_error(&error, &input),
                None => notifier.error(&mutation.error_message(&error)),
            }
            Err(error)
        }
    }
}

/// Hook to create a mutation that can be triggered manually
///
/// Uses the [`QueryClient`] and [`ToastQueue`] from context (see
/// [`use_reports_root`](crate::hooks::use_reports_root)). Returns the mutation state and
/// a function that triggers one write per call.
///
/// ```rust,ignore
/// use dioxus::prelude::*;
/// use dioxus_studio_reports::prelude::*;
///
/// #[component]
/// fn CreateTokenButton(api: HttpClient, project_ref: String) -> Element {
///     let (state, create) = use_create_warehouse_access_token(api, MutationOptions::new());
///
///     rsx! {
///         button {
///             disabled: state.read().is_loading(),
///             onclick: move |_| create(WarehouseAccessTokenCreateVariables::new(project_ref.clone(), "ci-token")),
///             "Create token"
///         }
///     }
/// }
/// ```
pub fn use_mutation<M, Input>(
    mutation: M,
    options: MutationOptions<Input, M::Output, M::Error>,
) -> (
    Signal<MutationState<M::Output, M::Error>>,
    impl Fn(Input) + Clone,
)
where
    M: Mutation<Input>,
    Input: Clone + 'static,
{
    let state = use_signal(|| MutationState::Idle);
    let client = use_context::<QueryClient>();
    let notifier = use_context::<ToastQueue>();

    let mutate_fn = move |input: Input| {
        let mutation = mutation.clone();
        let client = client.clone();
        let notifier = notifier.clone();
        let options = options.clone();
        let mut state = state;

        spawn(async move {
            state.set(MutationState::Loading);
            let result = run_mutation(&mutation, input, &client, &notifier, &options).await;
            state.set(match result {
                Ok(output) => MutationState::Success(output),
                Err(error) => MutationState::Error(error),
            });
        });
    };

    (state, mutate_fn)
}
