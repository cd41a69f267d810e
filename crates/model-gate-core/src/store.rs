// crates/model-gate-core/src/store.rs
// ============================================================================
// Module: Model Gate Route & Policy Store
// Description: Read-only route and tenant policy tables with route resolution.
// Purpose: Resolve (tenant, model) pairs to routes under policy and budget rules.
// Dependencies: rand, thiserror
// ============================================================================

//! ## Overview
//! [`RouteStore`] holds the route table and tenant policies loaded at startup.
//! It is never mutated after construction and can be shared through `Arc`
//! without locking.
//! Invariants:
//! - Tenant policy is checked before any route is considered.
//! - A route is eligible only when the tenant may use both the requested name
//!   and the route's canonical model.
//! - Among eligible routes, selection is proportional to declared weight and
//!   boundaries resolve to the earlier declared route.
//! - A zero total weight selects the first declared eligible route.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::identifiers::ModelName;
use crate::identifiers::TenantId;
use crate::route::Route;
use crate::route::TenantPolicy;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request-time routing failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// The tenant may not make this request.
    #[error("policy violation for tenant {tenant_id}: {reason}")]
    PolicyViolation {
        /// Tenant that made the request.
        tenant_id: TenantId,
        /// Human-readable reason.
        reason: String,
    },
    /// No route serves the requested model.
    #[error("no route serves model {model}")]
    NoMatchingRoute {
        /// Requested model name.
        model: ModelName,
    },
    /// The estimated cost exceeds the tenant's per-request ceiling.
    #[error("estimated cost {estimated} exceeds budget {limit} for tenant {tenant_id}")]
    BudgetExceeded {
        /// Tenant that made the request.
        tenant_id: TenantId,
        /// Estimated request cost.
        estimated: f64,
        /// Tenant ceiling.
        limit: f64,
    },
}

/// Load-time store construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Two policies share a tenant id.
    #[error("duplicate tenant policy: {0}")]
    DuplicateTenant(TenantId),
    /// A route record is invalid.
    #[error("invalid route {index}: {reason}")]
    InvalidRoute {
        /// Declaration index of the route.
        index: usize,
        /// Failure reason.
        reason: String,
    },
    /// A tenant policy record is invalid.
    #[error("invalid policy for tenant {tenant_id}: {reason}")]
    InvalidPolicy {
        /// Tenant identifier of the policy.
        tenant_id: TenantId,
        /// Failure reason.
        reason: String,
    },
}

// ============================================================================
// SECTION: Route Selection
// ============================================================================

/// Source of selection rolls for weighted route choice.
pub trait RouteSelector: Send + Sync {
    /// Returns a value uniformly distributed in `[0, total)`; `total` is non-zero.
    fn roll(&self, total: u64) -> u64;
}

/// Selector backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSelector;

impl RouteSelector for ThreadRngSelector {
    fn roll(&self, total: u64) -> u64 {
        rand::thread_rng().gen_range(0 .. total)
    }
}

/// Seeded selector with reproducible rolls.
///
/// # Invariants
/// - Two selectors built from the same seed produce the same roll sequence.
#[derive(Debug)]
pub struct WeightedSelector {
    /// Seeded RNG guarded for shared use.
    rng: Mutex<StdRng>,
}

impl WeightedSelector {
    /// Creates a selector from a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RouteSelector for WeightedSelector {
    fn roll(&self, total: u64) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0 .. total)
    }
}

/// Picks a route from `candidates` using a roll in `[0, total_weight)`.
///
/// Candidates are scanned in declaration order; the first route whose
/// cumulative weight exceeds the roll wins. Returns the first candidate when
/// every weight is zero and `None` when there are no candidates.
#[must_use]
pub fn select_weighted<'a>(candidates: &[&'a Route], roll: u64) -> Option<&'a Route> {
    let total: u64 = candidates.iter().map(|route| u64::from(route.weight)).sum();
    if total == 0 {
        return candidates.first().copied();
    }
    let roll = roll % total;
    let mut cumulative = 0_u64;
    for &route in candidates {
        cumulative += u64::from(route.weight);
        if roll < cumulative {
            return Some(route);
        }
    }
    candidates.last().copied()
}

// ============================================================================
// SECTION: Route Store
// ============================================================================

/// Read-only route and tenant policy tables.
///
/// # Invariants
/// - Tenant ids are unique.
/// - Route order is declaration order.
#[derive(Clone)]
pub struct RouteStore {
    /// Routes in declaration order.
    routes: Arc<[Route]>,
    /// Tenant policies keyed by tenant id.
    policies: Arc<BTreeMap<TenantId, TenantPolicy>>,
    /// Roll source for weighted selection.
    selector: Arc<dyn RouteSelector>,
}

impl RouteStore {
    /// Builds a store from route and policy records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a record is invalid or a tenant id repeats.
    pub fn new(routes: Vec<Route>, policies: Vec<TenantPolicy>) -> Result<Self, StoreError> {
        for (index, route) in routes.iter().enumerate() {
            validate_route(route).map_err(|reason| StoreError::InvalidRoute {
                index,
                reason,
            })?;
        }
        let mut table = BTreeMap::new();
        for policy in policies {
            validate_policy(&policy).map_err(|reason| StoreError::InvalidPolicy {
                tenant_id: policy.tenant_id.clone(),
                reason,
            })?;
            if table.contains_key(&policy.tenant_id) {
                return Err(StoreError::DuplicateTenant(policy.tenant_id));
            }
            table.insert(policy.tenant_id.clone(), policy);
        }
        Ok(Self {
            routes: routes.into(),
            policies: Arc::new(table),
            selector: Arc::new(ThreadRngSelector),
        })
    }

    /// Replaces the roll source used for weighted selection.
    #[must_use]
    pub fn with_selector(mut self, selector: impl RouteSelector + 'static) -> Self {
        self.selector = Arc::new(selector);
        self
    }

    /// Returns all routes in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the policy for a tenant.
    #[must_use]
    pub fn policy(&self, tenant_id: &TenantId) -> Option<&TenantPolicy> {
        self.policies.get(tenant_id)
    }

    /// Returns the routes serving `model`, in declaration order.
    #[must_use]
    pub fn eligible_routes(&self, model: &ModelName) -> Vec<&Route> {
        self.routes.iter().filter(|route| route.serves(model)).collect()
    }

    /// Resolves a tenant's model request to a route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::PolicyViolation`] when the tenant is unknown, the
    /// model is not allowed, or every route serving the name points at a model
    /// the tenant may not use. Returns [`RouteError::NoMatchingRoute`] when no
    /// route serves the model.
    pub fn resolve_route(
        &self,
        tenant_id: &TenantId,
        model: &ModelName,
    ) -> Result<&Route, RouteError> {
        self.resolve(tenant_id, model).map(|resolution| resolution.route)
    }

    /// Resolves a route using an explicit roll source.
    ///
    /// # Errors
    ///
    /// Same as [`RouteStore::resolve_route`].
    pub fn resolve_route_with(
        &self,
        tenant_id: &TenantId,
        model: &ModelName,
        selector: &dyn RouteSelector,
    ) -> Result<&Route, RouteError> {
        self.resolve_with(tenant_id, model, selector).map(|resolution| resolution.route)
    }

    /// Resolves a request to its route together with the governing policy.
    ///
    /// # Errors
    ///
    /// Same as [`RouteStore::resolve_route`].
    pub fn resolve(
        &self,
        tenant_id: &TenantId,
        model: &ModelName,
    ) -> Result<Resolution<'_>, RouteError> {
        self.resolve_with(tenant_id, model, self.selector.as_ref())
    }

    /// Resolves a request and its policy using an explicit roll source.
    ///
    /// # Errors
    ///
    /// Same as [`RouteStore::resolve_route`].
    pub fn resolve_with(
        &self,
        tenant_id: &TenantId,
        model: &ModelName,
        selector: &dyn RouteSelector,
    ) -> Result<Resolution<'_>, RouteError> {
        let policy = self.policy(tenant_id).ok_or_else(|| RouteError::PolicyViolation {
            tenant_id: tenant_id.clone(),
            reason: "unknown tenant".to_string(),
        })?;
        if !policy.allows(model) {
            return Err(RouteError::PolicyViolation {
                tenant_id: tenant_id.clone(),
                reason: format!("model {model} is not allowed"),
            });
        }
        let serving = self.eligible_routes(model);
        if serving.is_empty() {
            return Err(RouteError::NoMatchingRoute {
                model: model.clone(),
            });
        }
        let candidates: Vec<&Route> =
            serving.into_iter().filter(|route| policy.allows(&route.model)).collect();
        let total: u64 = candidates.iter().map(|route| u64::from(route.weight)).sum();
        let roll = if total == 0 { 0 } else { selector.roll(total) };
        let route =
            select_weighted(&candidates, roll).ok_or_else(|| RouteError::PolicyViolation {
                tenant_id: tenant_id.clone(),
                reason: format!("model {model} only routes to models outside the allowed set"),
            })?;
        Ok(Resolution {
            route,
            policy,
        })
    }
}

/// Route selected for a request and the tenant policy it was admitted under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'a> {
    /// Selected route.
    pub route: &'a Route,
    /// Tenant policy that admitted the request.
    pub policy: &'a TenantPolicy,
}

// ============================================================================
// SECTION: Cost Accounting
// ============================================================================

/// Estimates request cost from per-1000-token prices.
#[must_use]
pub fn estimate_cost(route: &Route, tokens_in: u32, tokens_out: u32) -> f64 {
    f64::from(tokens_in) / 1000.0 * route.cost_in + f64::from(tokens_out) / 1000.0 * route.cost_out
}

/// Checks an estimated cost against the tenant ceiling; equal is within budget.
///
/// # Errors
///
/// Returns [`RouteError::BudgetExceeded`] when the cost is above the ceiling.
pub fn check_budget(policy: &TenantPolicy, estimated_cost: f64) -> Result<(), RouteError> {
    if estimated_cost > policy.max_request_cost {
        return Err(RouteError::BudgetExceeded {
            tenant_id: policy.tenant_id.clone(),
            estimated: estimated_cost,
            limit: policy.max_request_cost,
        });
    }
    Ok(())
}

/// Checks a requested output-token count against the tenant ceiling.
///
/// # Errors
///
/// Returns [`RouteError::PolicyViolation`] when the request asks for more.
pub fn check_output_tokens(policy: &TenantPolicy, requested: u32) -> Result<(), RouteError> {
    if requested > policy.max_output_tokens {
        return Err(RouteError::PolicyViolation {
            tenant_id: policy.tenant_id.clone(),
            reason: format!(
                "requested {requested} output tokens exceeds limit {}",
                policy.max_output_tokens
            ),
        });
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a single route record.
fn validate_route(route: &Route) -> Result<(), String> {
    if route.model.as_str().trim().is_empty() {
        return Err("model must be non-empty".to_string());
    }
    if route.endpoint.trim().is_empty() {
        return Err("endpoint must be non-empty".to_string());
    }
    if !route.cost_in.is_finite() || route.cost_in < 0.0 {
        return Err("cost_in must be a non-negative number".to_string());
    }
    if !route.cost_out.is_finite() || route.cost_out < 0.0 {
        return Err("cost_out must be a non-negative number".to_string());
    }
    Ok(())
}

/// Validates a single tenant policy record.
fn validate_policy(policy: &TenantPolicy) -> Result<(), String> {
    if policy.tenant_id.as_str().trim().is_empty() {
        return Err("tenant_id must be non-empty".to_string());
    }
    if !policy.max_request_cost.is_finite() || policy.max_request_cost < 0.0 {
        return Err("max_request_cost must be a non-negative number".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
