//! The access decision.
//!
//! Evaluation short-circuits in a fixed order:
//!
//! 1. restriction disabled: allow
//! 2. role bypass (memoized per path within an [`EvaluationScope`]): allow
//! 3. starting from "denied", the first of these clears the denial:
//!    path whitelist, path blacklist, address allowlist, country whitelist,
//!    country blacklist
//! 4. otherwise block, choosing a [`BlockAction`]
//!
//! Overlapping rules resolve by that order, so it is part of the contract.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::config::{BypassAction, CountryMode, PathMode, RestrictIpConfig};
use super::context::{RequestContext, BYPASS_PERMISSION};
use super::geo::GeoLookup;
use super::ip_range::AddressToken;
use super::path_rule::PathMatcher;

/// Where a blocked visitor is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAction {
    /// The login page.
    RedirectToLogin,
    /// The generic access denied page.
    AccessDeniedPage,
    /// The configured fallback denial page.
    FallbackPage,
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reason {
    Disabled,
    RoleBypass,
    PathWhitelisted,
    PathNotBlacklisted,
    AddressAllowed,
    CountryWhitelisted,
    CountryNotBlacklisted,
    NoRuleCleared,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    blocked: bool,
    action: Option<BlockAction>,
    reason: Reason,
}

impl Decision {
    fn allow(reason: Reason) -> Self {
        Self {
            blocked: false,
            action: None,
            reason,
        }
    }

    fn block(action: BlockAction) -> Self {
        Self {
            blocked: true,
            action: Some(action),
            reason: Reason::NoRuleCleared,
        }
    }

    /// Whether the request must be denied.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Whether the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !self.blocked
    }

    /// Response action, only set when blocked.
    #[must_use]
    pub fn action(&self) -> Option<BlockAction> {
        self.action
    }

    /// Whether access was granted by role bypass.
    #[must_use]
    pub fn is_bypass(&self) -> bool {
        self.reason == Reason::RoleBypass
    }

    pub(crate) fn reason(&self) -> Reason {
        self.reason
    }
}

/// Administrator-authored lists resolved for one evaluation.
///
/// `None` marks a list the host could not load. An unavailable list never
/// clears a denial, while an available empty list behaves as an empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLists {
    /// Stored allowlist entries.
    pub allowed_addresses: Option<Vec<String>>,
    /// Stored whitelist path patterns.
    pub whitelisted_paths: Option<Vec<String>>,
    /// Stored blacklist path patterns.
    pub blacklisted_paths: Option<Vec<String>>,
}

impl Default for AccessLists {
    fn default() -> Self {
        Self {
            allowed_addresses: Some(Vec::new()),
            whitelisted_paths: Some(Vec::new()),
            blacklisted_paths: Some(Vec::new()),
        }
    }
}

impl AccessLists {
    /// Create empty, available lists.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stored allowlist.
    #[must_use]
    pub fn with_allowed_addresses(mut self, entries: Vec<String>) -> Self {
        self.allowed_addresses = Some(entries);
        self
    }

    /// Set the stored path whitelist.
    #[must_use]
    pub fn with_whitelisted_paths(mut self, entries: Vec<String>) -> Self {
        self.whitelisted_paths = Some(entries);
        self
    }

    /// Set the stored path blacklist.
    #[must_use]
    pub fn with_blacklisted_paths(mut self, entries: Vec<String>) -> Self {
        self.blacklisted_paths = Some(entries);
        self
    }
}

/// Memoized role-bypass answers for one request.
///
/// Create one per request and drop it with the request; it must not be
/// shared across requests.
#[derive(Debug, Default)]
pub struct EvaluationScope {
    bypass: HashMap<String, bool>,
}

impl EvaluationScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bypass.len()
    }

    /// Whether nothing has been memoized yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bypass.is_empty()
    }
}

/// Decides whether a request is blocked.
pub struct AccessDecisionEngine {
    path_matcher: Arc<dyn PathMatcher>,
    geo: Option<Arc<dyn GeoLookup>>,
}

impl std::fmt::Debug for AccessDecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessDecisionEngine")
            .field("geo", &self.geo.is_some())
            .finish()
    }
}

impl AccessDecisionEngine {
    /// Create an engine without country support.
    #[must_use]
    pub fn new(path_matcher: Arc<dyn PathMatcher>) -> Self {
        Self {
            path_matcher,
            geo: None,
        }
    }

    /// Replace the path matcher.
    #[must_use]
    pub fn with_path_matcher(mut self, path_matcher: Arc<dyn PathMatcher>) -> Self {
        self.set_path_matcher(path_matcher);
        self
    }

    /// Replace the path matcher in place.
    pub fn set_path_matcher(&mut self, path_matcher: Arc<dyn PathMatcher>) {
        self.path_matcher = path_matcher;
    }

    /// Attach a geo lookup, enabling country rules.
    #[must_use]
    pub fn with_geo(mut self, geo: Arc<dyn GeoLookup>) -> Self {
        self.geo = Some(geo);
        self
    }

    /// Whether country rules can be applied.
    #[must_use]
    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }

    /// Evaluate one request in a fresh scope.
    #[must_use]
    pub fn evaluate(
        &self,
        ctx: &RequestContext,
        config: &RestrictIpConfig,
        lists: &AccessLists,
    ) -> Decision {
        self.evaluate_in(&mut EvaluationScope::new(), ctx, config, lists)
    }

    /// Evaluate one request, reusing the request's scope.
    pub fn evaluate_in(
        &self,
        scope: &mut EvaluationScope,
        ctx: &RequestContext,
        config: &RestrictIpConfig,
        lists: &AccessLists,
    ) -> Decision {
        if !config.enabled {
            return Decision::allow(Reason::Disabled);
        }

        if self.bypass_granted(scope, ctx, config) {
            debug!(path = %ctx.current_path, "role bypass granted");
            return Decision::allow(Reason::RoleBypass);
        }

        if let Some(reason) = self.clearing_rule(ctx, config, lists) {
            debug!(
                path = %ctx.current_path,
                ip = %ctx.client_ip,
                reason = ?reason,
                "denial cleared"
            );
            return Decision::allow(reason);
        }

        let action = if config.allow_role_bypass
            && config.bypass_action == BypassAction::RedirectToLogin
        {
            BlockAction::RedirectToLogin
        } else if config.mode.is_path_based() {
            BlockAction::AccessDeniedPage
        } else {
            BlockAction::FallbackPage
        };

        debug!(
            path = %ctx.current_path,
            ip = %ctx.client_ip,
            action = ?action,
            "no rule cleared denial"
        );
        Decision::block(action)
    }

    /// Whether role bypass lets the request through.
    ///
    /// The first answer for a path is memoized in `scope` and reused for
    /// later calls on the same path.
    pub fn bypass_granted(
        &self,
        scope: &mut EvaluationScope,
        ctx: &RequestContext,
        config: &RestrictIpConfig,
    ) -> bool {
        *scope
            .bypass
            .entry(ctx.current_path.clone())
            .or_insert_with(|| {
                config.allow_role_bypass
                    && (ctx.has_permission(BYPASS_PERMISSION) || ctx.is_account_path())
            })
    }

    fn clearing_rule(
        &self,
        ctx: &RequestContext,
        config: &RestrictIpConfig,
        lists: &AccessLists,
    ) -> Option<Reason> {
        if self.path_whitelisted(ctx, config, lists) {
            return Some(Reason::PathWhitelisted);
        }
        if self.path_not_blacklisted(ctx, config, lists) {
            return Some(Reason::PathNotBlacklisted);
        }
        if Self::address_allowed(ctx, config, lists) {
            return Some(Reason::AddressAllowed);
        }

        let geo = self.geo.as_ref()?;
        if config.country_mode == CountryMode::Disabled {
            return None;
        }
        let country = geo
            .lookup_country(&ctx.client_ip)
            .filter(|code| !code.trim().is_empty())?;

        match config.country_mode {
            CountryMode::Whitelist if config.lists_country(&country) => {
                Some(Reason::CountryWhitelisted)
            },
            CountryMode::Blacklist if !config.lists_country(&country) => {
                Some(Reason::CountryNotBlacklisted)
            },
            _ => None,
        }
    }

    fn path_whitelisted(
        &self,
        ctx: &RequestContext,
        config: &RestrictIpConfig,
        lists: &AccessLists,
    ) -> bool {
        if config.mode != PathMode::Whitelist {
            return false;
        }
        lists
            .whitelisted_paths
            .as_deref()
            .is_some_and(|paths| self.path_matcher.matches_any(&ctx.current_path, paths))
    }

    fn path_not_blacklisted(
        &self,
        ctx: &RequestContext,
        config: &RestrictIpConfig,
        lists: &AccessLists,
    ) -> bool {
        if config.mode != PathMode::Blacklist {
            return false;
        }
        lists
            .blacklisted_paths
            .as_deref()
            .is_some_and(|paths| !self.path_matcher.matches_any(&ctx.current_path, paths))
    }

    fn address_allowed(ctx: &RequestContext, config: &RestrictIpConfig, lists: &AccessLists) -> bool {
        lists
            .allowed_addresses
            .iter()
            .flatten()
            .chain(config.ip_allowlist.iter())
            .any(|entry| AddressToken::parse(entry.as_str()).matches(&ctx.client_ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::geo::StaticGeoLookup;
    use crate::access_control::path_rule::GlobPathMatcher;

    fn engine() -> AccessDecisionEngine {
        AccessDecisionEngine::new(Arc::new(GlobPathMatcher::new()))
    }

    fn geo_engine() -> AccessDecisionEngine {
        let geo = StaticGeoLookup::new()
            .with_entry("1.1.1.1", "US")
            .with_entry("2.2.2.2", "FR")
            .with_entry("3.3.3.3", "");
        engine().with_geo(Arc::new(geo))
    }

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn lists(white: &[&str], black: &[&str], addresses: &[&str]) -> AccessLists {
        AccessLists::new()
            .with_whitelisted_paths(owned(white))
            .with_blacklisted_paths(owned(black))
            .with_allowed_addresses(owned(addresses))
    }

    #[test]
    fn test_disabled_always_allows() {
        let config = RestrictIpConfig::new().with_mode(PathMode::Whitelist);
        let ctx = RequestContext::new("9.9.9.9", "/anything");
        let decision = engine().evaluate(&ctx, &config, &AccessLists::new());
        assert!(decision.is_allowed());
        assert_eq!(decision.action(), None);
        assert_eq!(decision.reason(), Reason::Disabled);
    }

    #[test]
    fn test_bypass_permission_beats_blacklist() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_mode(PathMode::Blacklist)
            .with_role_bypass(BypassAction::GenericDeny);
        let ctx = RequestContext::new("9.9.9.9", "/node/1").with_permission(BYPASS_PERMISSION);

        let decision = engine().evaluate(&ctx, &config, &lists(&[], &["/node/1"], &[]));
        assert!(decision.is_allowed());
        assert!(decision.is_bypass());
    }

    #[test]
    fn test_bypass_permission_ignored_without_role_bypass() {
        let config = RestrictIpConfig::new().enabled();
        let ctx = RequestContext::new("9.9.9.9", "/node/1").with_permission(BYPASS_PERMISSION);
        assert!(engine()
            .evaluate(&ctx, &config, &AccessLists::new())
            .is_blocked());
    }

    #[test]
    fn test_account_paths_bypass() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_role_bypass(BypassAction::GenericDeny);
        for path in [
            "/user",
            "/user/login",
            "/user/password",
            "/user/logout",
            "/user/register",
            "/user/reset/1/abc/login",
        ] {
            let ctx = RequestContext::new("9.9.9.9", path);
            assert!(
                engine().evaluate(&ctx, &config, &AccessLists::new()).is_allowed(),
                "{path} should bypass"
            );
        }

        let ctx = RequestContext::new("9.9.9.9", "/invalid/path");
        assert!(engine()
            .evaluate(&ctx, &config, &AccessLists::new())
            .is_blocked());
    }

    #[test]
    fn test_bypass_memoized_per_path() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_role_bypass(BypassAction::GenericDeny);
        let engine = engine();
        let mut scope = EvaluationScope::new();

        let privileged =
            RequestContext::new("9.9.9.9", "/node/1").with_permission(BYPASS_PERMISSION);
        assert!(engine.bypass_granted(&mut scope, &privileged, &config));

        // Same path in the same scope reuses the stored answer.
        let anonymous = RequestContext::new("9.9.9.9", "/node/1");
        assert!(engine.bypass_granted(&mut scope, &anonymous, &config));
        assert_eq!(scope.len(), 1);

        // A fresh scope re-derives it.
        assert!(!engine.bypass_granted(&mut EvaluationScope::new(), &anonymous, &config));
    }

    #[test]
    fn test_path_whitelist() {
        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Whitelist);
        let lists = lists(&["/node/1"], &[], &[]);

        let allowed = engine().evaluate(&RequestContext::new("::1", "/node/1"), &config, &lists);
        assert!(allowed.is_allowed());
        assert_eq!(allowed.reason(), Reason::PathWhitelisted);

        let blocked = engine().evaluate(&RequestContext::new("::1", "/node/2"), &config, &lists);
        assert!(blocked.is_blocked());
        assert_eq!(blocked.action(), Some(BlockAction::AccessDeniedPage));
    }

    #[test]
    fn test_path_blacklist() {
        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Blacklist);
        let lists = lists(&[], &["/node/1"], &[]);

        let blocked = engine().evaluate(&RequestContext::new("::1", "/node/1"), &config, &lists);
        assert!(blocked.is_blocked());
        assert_eq!(blocked.action(), Some(BlockAction::AccessDeniedPage));

        let allowed = engine().evaluate(&RequestContext::new("::1", "/node/2"), &config, &lists);
        assert!(allowed.is_allowed());
        assert_eq!(allowed.reason(), Reason::PathNotBlacklisted);
    }

    #[test]
    fn test_empty_path_lists() {
        let ctx = RequestContext::new("::1", "/node/1");

        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Blacklist);
        assert!(engine().evaluate(&ctx, &config, &AccessLists::new()).is_allowed());

        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Whitelist);
        assert!(engine().evaluate(&ctx, &config, &AccessLists::new()).is_blocked());
    }

    #[test]
    fn test_unavailable_blacklist_never_clears() {
        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Blacklist);
        let lists = AccessLists {
            blacklisted_paths: None,
            ..AccessLists::new()
        };
        let ctx = RequestContext::new("::1", "/node/2");
        assert!(engine().evaluate(&ctx, &config, &lists).is_blocked());
    }

    #[test]
    fn test_whitelist_mode_ignores_blacklist() {
        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Whitelist);
        let ctx = RequestContext::new("::1", "/node/2");
        let decision = engine().evaluate(&ctx, &config, &lists(&["/node/1"], &["/other"], &[]));
        assert!(decision.is_blocked());
    }

    #[test]
    fn test_address_allowlist() {
        let config = RestrictIpConfig::new().enabled();
        let lists = lists(&[], &[], &["10.0.0.1", "192.168.1.10-20"]);

        for ip in ["10.0.0.1", "192.168.1.15"] {
            let decision = engine().evaluate(&RequestContext::new(ip, "/"), &config, &lists);
            assert!(decision.is_allowed(), "{ip} should be allowed");
            assert_eq!(decision.reason(), Reason::AddressAllowed);
        }

        let decision = engine().evaluate(&RequestContext::new("10.0.0.2", "/"), &config, &lists);
        assert!(decision.is_blocked());
        assert_eq!(decision.action(), Some(BlockAction::FallbackPage));
    }

    #[test]
    fn test_static_allowlist_is_merged() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_static_address("::1");
        let lists = lists(&[], &[], &["10.0.0.1"]);

        assert!(engine()
            .evaluate(&RequestContext::new("::1", "/"), &config, &lists)
            .is_allowed());
        assert!(engine()
            .evaluate(&RequestContext::new("10.0.0.1", "/"), &config, &lists)
            .is_allowed());
        assert!(engine()
            .evaluate(&RequestContext::new("::2", "/"), &config, &lists)
            .is_blocked());
    }

    #[test]
    fn test_static_allowlist_used_when_store_unavailable() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_static_address("10.0.0.9");
        let lists = AccessLists {
            allowed_addresses: None,
            ..AccessLists::new()
        };
        assert!(engine()
            .evaluate(&RequestContext::new("10.0.0.9", "/"), &config, &lists)
            .is_allowed());
    }

    #[test]
    fn test_allowlisted_address_reaches_blacklisted_path() {
        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Blacklist);
        let lists = lists(&[], &["/admin/*"], &["10.0.0.1"]);
        let ctx = RequestContext::new("10.0.0.1", "/admin/config");
        let decision = engine().evaluate(&ctx, &config, &lists);
        assert_eq!(decision.reason(), Reason::AddressAllowed);
    }

    #[test]
    fn test_country_whitelist() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_countries(CountryMode::Whitelist, ["US", "CA"]);
        let engine = geo_engine();

        let ctx = RequestContext::new("1.1.1.1", "/");
        let decision = engine.evaluate(&ctx, &config, &AccessLists::new());
        assert_eq!(decision.reason(), Reason::CountryWhitelisted);

        assert!(engine
            .evaluate(&RequestContext::new("2.2.2.2", "/"), &config, &AccessLists::new())
            .is_blocked());
        // Unknown address: lookup yields nothing, no country rule applies.
        assert!(engine
            .evaluate(&RequestContext::new("4.4.4.4", "/"), &config, &AccessLists::new())
            .is_blocked());
        // Empty code is treated as no answer.
        assert!(engine
            .evaluate(&RequestContext::new("3.3.3.3", "/"), &config, &AccessLists::new())
            .is_blocked());
    }

    #[test]
    fn test_country_blacklist() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_countries(CountryMode::Blacklist, ["FR"]);
        let engine = geo_engine();

        let ctx = RequestContext::new("1.1.1.1", "/");
        let decision = engine.evaluate(&ctx, &config, &AccessLists::new());
        assert_eq!(decision.reason(), Reason::CountryNotBlacklisted);

        assert!(engine
            .evaluate(&RequestContext::new("2.2.2.2", "/"), &config, &AccessLists::new())
            .is_blocked());
        assert!(engine
            .evaluate(&RequestContext::new("4.4.4.4", "/"), &config, &AccessLists::new())
            .is_blocked());
    }

    /// Answers every lookup with a lower-case code.
    struct LowerCaseGeo;

    impl GeoLookup for LowerCaseGeo {
        fn lookup_country(&self, _ip: &str) -> Option<String> {
            Some("us".to_string())
        }
    }

    #[test]
    fn test_country_code_case_insensitive() {
        let engine = engine().with_geo(Arc::new(LowerCaseGeo));
        let ctx = RequestContext::new("5.5.5.5", "/");

        let whitelist = RestrictIpConfig::new()
            .enabled()
            .with_countries(CountryMode::Whitelist, ["US"]);
        let decision = engine.evaluate(&ctx, &whitelist, &AccessLists::new());
        assert_eq!(decision.reason(), Reason::CountryWhitelisted);

        let blacklist = RestrictIpConfig::new()
            .enabled()
            .with_countries(CountryMode::Blacklist, ["US"]);
        assert!(engine
            .evaluate(&ctx, &blacklist, &AccessLists::new())
            .is_blocked());
    }

    #[test]
    fn test_country_rules_need_geo() {
        let config = RestrictIpConfig::new()
            .enabled()
            .with_countries(CountryMode::Blacklist, ["FR"]);
        let engine = engine();
        assert!(!engine.has_geo());
        assert!(engine
            .evaluate(&RequestContext::new("1.1.1.1", "/"), &config, &AccessLists::new())
            .is_blocked());
    }

    #[test]
    fn test_block_action_priority() {
        let ctx = RequestContext::new("9.9.9.9", "/node/2");
        let lists = lists(&["/node/1"], &[], &[]);

        let config = RestrictIpConfig::new()
            .enabled()
            .with_mode(PathMode::Whitelist)
            .with_role_bypass(BypassAction::RedirectToLogin);
        assert_eq!(
            engine().evaluate(&ctx, &config, &lists).action(),
            Some(BlockAction::RedirectToLogin)
        );

        let config = RestrictIpConfig::new()
            .enabled()
            .with_mode(PathMode::Whitelist)
            .with_role_bypass(BypassAction::ShowLoginLink);
        assert_eq!(
            engine().evaluate(&ctx, &config, &lists).action(),
            Some(BlockAction::AccessDeniedPage)
        );

        let config = RestrictIpConfig::new()
            .enabled()
            .with_role_bypass(BypassAction::ShowLoginLink);
        assert_eq!(
            engine().evaluate(&ctx, &config, &lists).action(),
            Some(BlockAction::FallbackPage)
        );
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let config = RestrictIpConfig::new().enabled().with_mode(PathMode::Whitelist);
        let lists = lists(&["/node/1"], &[], &[]);
        let engine = engine();
        let ctx = RequestContext::new("::1", "/node/2");

        assert_eq!(
            engine.evaluate(&ctx, &config, &lists),
            engine.evaluate(&ctx, &config, &lists)
        );
    }
}
