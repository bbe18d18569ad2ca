//! Route authorization table.
//!
//! This is the only place that says which role may reach which route prefix.
//! The edge interceptor, the client redirect policy, and anything that renders
//! navigation all ask these functions, or load [`policy_document`], instead of
//! keeping their own role lists.

use serde::Serialize;

use crate::types::Role;

/// A protected route prefix and the roles allowed under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    pub prefix: &'static str,
    pub allowed: &'static [Role],
}

impl RouteRule {
    #[must_use]
    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Landing route for a role after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleHome {
    pub role: Role,
    pub path: &'static str,
}

pub static ROUTE_POLICY: &[RouteRule] = &[
    RouteRule {
        prefix: "/admin",
        allowed: &[Role::SuperAdmin],
    },
    RouteRule {
        prefix: "/platform",
        allowed: &[Role::SuperAdmin, Role::PlatformManager, Role::PlatformSupport],
    },
    RouteRule {
        prefix: "/dashboard/billing",
        allowed: &[Role::SuperAdmin, Role::Merchant],
    },
    RouteRule {
        prefix: "/dashboard",
        allowed: &[
            Role::SuperAdmin,
            Role::PlatformManager,
            Role::PlatformSupport,
            Role::Merchant,
            Role::Agent,
        ],
    },
    RouteRule {
        prefix: "/agent",
        allowed: &[Role::SuperAdmin, Role::Agent],
    },
    RouteRule {
        prefix: "/account",
        allowed: Role::ALL,
    },
];

pub static ROLE_HOMES: &[RoleHome] = &[
    RoleHome {
        role: Role::SuperAdmin,
        path: "/admin",
    },
    RoleHome {
        role: Role::PlatformManager,
        path: "/platform",
    },
    RoleHome {
        role: Role::PlatformSupport,
        path: "/platform",
    },
    RoleHome {
        role: Role::Merchant,
        path: "/dashboard",
    },
    RoleHome {
        role: Role::Agent,
        path: "/agent",
    },
    RoleHome {
        role: Role::User,
        path: "/account",
    },
];

/// Serializable view of the whole policy, for enforcement points that cannot
/// link this crate.
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDocument {
    pub routes: &'static [RouteRule],
    pub homes: &'static [RoleHome],
}

#[must_use]
pub fn policy_document() -> PolicyDocument {
    PolicyDocument {
        routes: ROUTE_POLICY,
        homes: ROLE_HOMES,
    }
}

/// Segment-aware prefix match: `/admin` covers `/admin` and `/admin/users`,
/// not `/administer`.
pub(crate) fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// The most specific rule covering `path`, if the path is protected at all.
#[must_use]
pub fn rule_for(path: &str) -> Option<&'static RouteRule> {
    ROUTE_POLICY
        .iter()
        .filter(|rule| matches_prefix(path, rule.prefix))
        .max_by_key(|rule| rule.prefix.len())
}

#[must_use]
pub fn is_protected(path: &str) -> bool {
    rule_for(path).is_some()
}

/// Whether `role` may reach `path`. Paths outside every protected prefix are
/// open to everyone.
#[must_use]
pub fn is_authorized(role: Role, path: &str) -> bool {
    rule_for(path).is_none_or(|rule| rule.allows(role))
}

#[must_use]
pub fn home_route(role: Role) -> &'static str {
    ROLE_HOMES
        .iter()
        .find(|home| home.role == role)
        .map_or("/account", |home| home.path)
}
