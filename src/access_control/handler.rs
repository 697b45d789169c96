//! Request-facing wrapper around the decision engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::{BypassAction, PathMode, RestrictIpConfig};
use super::context::{normalize_path, RequestContext};
use super::engine::{AccessDecisionEngine, AccessLists, BlockAction, Decision, EvaluationScope};
use super::geo::GeoLookup;
use super::path_rule::{GlobPathMatcher, PathMatcher};
use super::store::{ListKind, ListStore, SharedListStore};

/// Logout page linked from the denial page.
const LOGOUT_PATH: &str = "/user/logout";

/// Message shown on the denial page.
pub const ACCESS_DENIED_MESSAGE: &str =
    "The page you are trying to access cannot be accessed from your IP address.";

/// Statistics for the handler.
#[derive(Debug, Default)]
pub struct RestrictIpStats {
    /// Total requests checked.
    pub requests_checked: AtomicU64,
    /// Requests allowed.
    pub requests_allowed: AtomicU64,
    /// Requests blocked.
    pub requests_blocked: AtomicU64,
    /// Requests let through by role bypass.
    pub bypass_grants: AtomicU64,
    /// List loads that failed and were skipped.
    pub degraded_loads: AtomicU64,
}

impl RestrictIpStats {
    /// Create new stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision.
    pub fn record(&self, decision: &Decision) {
        self.requests_checked.fetch_add(1, Ordering::Relaxed);
        if decision.is_blocked() {
            self.requests_blocked.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_allowed.fetch_add(1, Ordering::Relaxed);
            if decision.is_bypass() {
                self.bypass_grants.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// What the host should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Continue handling the request.
    Pass,
    /// Redirect the visitor.
    Redirect {
        /// Target path.
        location: String,
        /// Why this target was chosen.
        action: BlockAction,
    },
}

impl RequestOutcome {
    /// Whether the request continues.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Content of the access denied page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeniedPageContent {
    /// Denial message.
    pub message: String,
    /// Contact address with `@` written as `[at]`.
    pub contact_mail: Option<String>,
    /// Logout link target, for signed-in visitors.
    pub logout_link: Option<String>,
    /// Sign-in link target, for anonymous visitors.
    pub login_link: Option<String>,
}

/// What the access denied page should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeniedPage {
    /// The visitor is not blocked; send them to the front page.
    RedirectFront {
        /// Front page path.
        location: String,
    },
    /// Render the denial.
    Render(DeniedPageContent),
}

/// Checks requests against the restriction settings and stored lists.
pub struct RestrictIpHandler {
    config: RestrictIpConfig,
    store: SharedListStore,
    engine: AccessDecisionEngine,
    /// Whether the host replaced the built-in glob matcher.
    custom_matcher: bool,
    stats: Arc<RestrictIpStats>,
}

impl std::fmt::Debug for RestrictIpHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestrictIpHandler")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .field("engine", &self.engine)
            .field("custom_matcher", &self.custom_matcher)
            .field("stats", &self.stats)
            .finish()
    }
}

impl RestrictIpHandler {
    /// Create a handler using the glob path matcher and no geo lookup.
    #[must_use]
    pub fn new(config: RestrictIpConfig, store: SharedListStore) -> Self {
        let matcher = GlobPathMatcher::with_front_path(&config.front_path);
        Self {
            config,
            store,
            engine: AccessDecisionEngine::new(Arc::new(matcher)),
            custom_matcher: false,
            stats: Arc::new(RestrictIpStats::new()),
        }
    }

    /// Use a host-supplied path matcher.
    #[must_use]
    pub fn with_path_matcher(mut self, matcher: Arc<dyn PathMatcher>) -> Self {
        self.engine = self.engine.with_path_matcher(matcher);
        self.custom_matcher = true;
        self
    }

    /// Enable country rules with the given lookup.
    #[must_use]
    pub fn with_geo(mut self, geo: Arc<dyn GeoLookup>) -> Self {
        self.engine = self.engine.with_geo(geo);
        self
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> &RestrictIpConfig {
        &self.config
    }

    /// Replace the settings, e.g. after an administrator edit.
    ///
    /// The built-in glob matcher follows a changed front page; a host-supplied
    /// matcher is kept as is.
    pub fn set_config(&mut self, config: RestrictIpConfig) {
        info!(enabled = config.enabled, mode = ?config.mode, "restriction settings replaced");
        if !self.custom_matcher && config.front_path != self.config.front_path {
            self.engine
                .set_path_matcher(Arc::new(GlobPathMatcher::with_front_path(&config.front_path)));
        }
        self.config = config;
    }

    /// The list store.
    #[must_use]
    pub fn store(&self) -> &SharedListStore {
        &self.store
    }

    /// Get statistics.
    #[must_use]
    pub fn stats(&self) -> &RestrictIpStats {
        &self.stats
    }

    /// Decide a request and map the decision to a response.
    pub fn check(&self, ctx: &RequestContext) -> RequestOutcome {
        let mut scope = EvaluationScope::new();
        let decision = self.decide(&mut scope, ctx);
        self.outcome(ctx, &decision)
    }

    /// Decide a request within the request's scope.
    pub fn decide(&self, scope: &mut EvaluationScope, ctx: &RequestContext) -> Decision {
        let lists = if self.config.enabled {
            self.load_lists()
        } else {
            AccessLists::new()
        };

        let decision = self.engine.evaluate_in(scope, ctx, &self.config, &lists);
        self.stats.record(&decision);
        debug!(
            path = %ctx.current_path,
            blocked = decision.is_blocked(),
            reason = ?decision.reason(),
            "request decided"
        );
        decision
    }

    /// Map a decision to what the host should do.
    ///
    /// Blocked requests for the denial page or for their own redirect target
    /// pass through so the page can render.
    pub fn outcome(&self, ctx: &RequestContext, decision: &Decision) -> RequestOutcome {
        let Some(action) = decision.action() else {
            return RequestOutcome::Pass;
        };

        let location = match action {
            BlockAction::RedirectToLogin => &self.config.login_path,
            BlockAction::AccessDeniedPage => &self.config.access_denied_path,
            BlockAction::FallbackPage => &self.config.fallback_path,
        };

        if ctx.current_path == normalize_path(&self.config.access_denied_path)
            || ctx.current_path == normalize_path(location)
        {
            return RequestOutcome::Pass;
        }

        if self.config.log_blocked {
            warn!(
                path = %ctx.current_path,
                ip = %ctx.client_ip,
                "access to path blocked for address"
            );
        }

        RequestOutcome::Redirect {
            location: location.clone(),
            action,
        }
    }

    /// Build the access denied page for a visitor.
    #[must_use]
    pub fn denied_page(&self, decision: &Decision, authenticated: bool) -> DeniedPage {
        if decision.is_allowed() {
            return DeniedPage::RedirectFront {
                location: self.config.front_path.clone(),
            };
        }

        let contact_mail = self
            .config
            .contact_mail
            .as_deref()
            .filter(|mail| !mail.is_empty())
            .map(|mail| mail.replace('@', "[at]"));

        let (logout_link, login_link) = if !self.config.allow_role_bypass {
            (None, None)
        } else if authenticated {
            (Some(LOGOUT_PATH.to_string()), None)
        } else if self.config.bypass_action == BypassAction::ShowLoginLink {
            (None, Some(self.config.login_path.clone()))
        } else {
            (None, None)
        };

        DeniedPage::Render(DeniedPageContent {
            message: ACCESS_DENIED_MESSAGE.to_string(),
            contact_mail,
            logout_link,
            login_link,
        })
    }

    /// Load the lists the current settings use. Failed loads are logged and
    /// marked unavailable.
    fn load_lists(&self) -> AccessLists {
        AccessLists {
            allowed_addresses: self.load_list(ListKind::AllowedAddresses),
            whitelisted_paths: if self.config.mode == PathMode::Whitelist {
                self.load_list(ListKind::WhitelistedPaths)
            } else {
                Some(Vec::new())
            },
            blacklisted_paths: if self.config.mode == PathMode::Blacklist {
                self.load_list(ListKind::BlacklistedPaths)
            } else {
                Some(Vec::new())
            },
        }
    }

    fn load_list(&self, kind: ListKind) -> Option<Vec<String>> {
        match self.store.load(kind) {
            Ok(entries) => {
                debug!(list = %kind, entries = entries.len(), "list loaded");
                Some(entries)
            },
            Err(e) => {
                self.stats.degraded_loads.fetch_add(1, Ordering::Relaxed);
                warn!(
                    store = self.store.name(),
                    list = %kind,
                    error = %e,
                    "list unavailable, skipping its rule"
                );
                None
            },
        }
    }
}
