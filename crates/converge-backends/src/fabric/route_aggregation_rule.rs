//! Route aggregation rule waiters
//!
//! Rules live under a route aggregation, so every read needs both ids.

use crate::observe::{lifecycle_labels, observe, observe_raw};
use converge_core::{ApiError, Cadence, DeletedSentinel, Poller, StateSpec, Timing};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Rule was removed together with (or before) its parent aggregation
pub const ALREADY_DELETED_CODE: &str = "EQ-3044402";

#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteAggregationRuleState {
    Provisioning,
    Provisioned,
    Reprovisioning,
    Deprovisioning,
    Deprovisioned,
    NotProvisioned,
    NotDeprovisioned,
    Failed,
    #[strum(serialize = "tf-marker-for-deleted-route-aggregation-rule")]
    Deleted,
    #[strum(default)]
    Unrecognized(String),
}

lifecycle_labels!(RouteAggregationRuleState);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAggregationRule {
    pub uuid: String,
    pub prefix: String,
    pub state: RouteAggregationRuleState,
}

pub trait RouteAggregationRulesApi: Send + Sync + 'static {
    fn get_route_aggregation_rule(
        &self,
        route_aggregation_id: &str,
        rule_id: &str,
    ) -> impl Future<Output = Result<RouteAggregationRule, ApiError>> + Send;
}

fn state_of(rule: &RouteAggregationRule) -> RouteAggregationRuleState {
    rule.state.clone()
}

fn resource_name(route_aggregation_id: &str, rule_id: &str) -> String {
    format!("route aggregation rule {rule_id} (aggregation {route_aggregation_id})")
}

/// Wait for a created or updated rule to be provisioned.
pub fn create_update_spec<C: RouteAggregationRulesApi>(
    client: Arc<C>,
    route_aggregation_id: &str,
    rule_id: &str,
    timeout: Duration,
) -> StateSpec<impl Poller<Label = RouteAggregationRuleState, Snapshot = RouteAggregationRule>> {
    let (parent, id) = (route_aggregation_id.to_string(), rule_id.to_string());
    let poller = observe(state_of, move || {
        let client = Arc::clone(&client);
        let (parent, id) = (parent.clone(), id.clone());
        async move { client.get_route_aggregation_rule(&parent, &id).await }
    });

    StateSpec::new(resource_name(route_aggregation_id, rule_id), poller)
        .pending([
            RouteAggregationRuleState::Provisioning,
            RouteAggregationRuleState::Reprovisioning,
        ])
        .target([RouteAggregationRuleState::Provisioned])
        .timing(Timing::from_cadence(Cadence::SLOW, timeout))
}

/// Wait for a deleted rule to disappear.
pub fn delete_spec<C: RouteAggregationRulesApi>(
    client: Arc<C>,
    route_aggregation_id: &str,
    rule_id: &str,
    timeout: Duration,
) -> StateSpec<
    impl Poller<Label = RouteAggregationRuleState, Snapshot = Option<RouteAggregationRule>>,
> {
    let (parent, id) = (route_aggregation_id.to_string(), rule_id.to_string());
    let raw = observe_raw(state_of, move || {
        let client = Arc::clone(&client);
        let (parent, id) = (parent.clone(), id.clone());
        async move { client.get_route_aggregation_rule(&parent, &id).await }
    });
    let sentinel = DeletedSentinel::new(RouteAggregationRuleState::Deleted)
        .with_code(ALREADY_DELETED_CODE);

    StateSpec::new(resource_name(route_aggregation_id, rule_id), sentinel.classify(raw))
        .pending([RouteAggregationRuleState::Deprovisioning])
        .target([RouteAggregationRuleState::Deleted])
        .timing(Timing::from_cadence(Cadence::STANDARD, timeout))
}
