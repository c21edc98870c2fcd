//! Actors, roles and capability sets.
//!
//! Access to toolbox features is a union of two grants: what the actor's role
//! allows and what was granted to the actor's id directly (used for developer
//! tooling that should not come with a role).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::id::ActorId;

/// A toolbox feature that can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// See the dashboard and order lists.
    ViewOrders,
    /// Request order, payment and delivery transitions.
    ChangeOrderState,
    /// Create, list and revoke single-order deep links.
    ManageLinks,
    /// Create, list and revoke global deep links.
    ManageGlobalLinks,
    /// Developer-only affordances such as the raw transition graph.
    Developer,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ViewOrders => write!(f, "view_orders"),
            Self::ChangeOrderState => write!(f, "change_order_state"),
            Self::ManageLinks => write!(f, "manage_links"),
            Self::ManageGlobalLinks => write!(f, "manage_global_links"),
            Self::Developer => write!(f, "developer"),
        }
    }
}

/// Role of a toolbox user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Everything a role can grant.
    Admin,
    /// Day-to-day order handling.
    Editor,
    /// Read-only.
    Viewer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Editor => write!(f, "editor"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The authenticated user on whose behalf the toolbox acts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    #[serde(default)]
    pub email: Option<String>,
    /// `None` when the backend reported no role or one this build does not know.
    #[serde(default)]
    pub role: Option<Role>,
}

impl Actor {
    /// Identity shown in audit fields such as `created_by`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// Role and per-actor capability grants.
#[derive(Debug, Clone, Default)]
pub struct CapabilityMap {
    by_role: HashMap<Role, HashSet<Capability>>,
    by_actor: HashMap<ActorId, HashSet<Capability>>,
}

impl CapabilityMap {
    /// An empty map: nobody can do anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The toolbox's standard role grants.
    #[must_use]
    pub fn standard() -> Self {
        use Capability::{ChangeOrderState, ManageGlobalLinks, ManageLinks, ViewOrders};

        Self::new()
            .grant_role(Role::Viewer, [ViewOrders])
            .grant_role(Role::Editor, [ViewOrders, ChangeOrderState, ManageLinks])
            .grant_role(
                Role::Admin,
                [ViewOrders, ChangeOrderState, ManageLinks, ManageGlobalLinks],
            )
    }

    /// Add capabilities to a role.
    #[must_use]
    pub fn grant_role(mut self, role: Role, caps: impl IntoIterator<Item = Capability>) -> Self {
        self.by_role.entry(role).or_default().extend(caps);
        self
    }

    /// Add capabilities to a single actor id.
    #[must_use]
    pub fn grant_actor(
        mut self,
        actor: ActorId,
        caps: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.by_actor.entry(actor).or_default().extend(caps);
        self
    }

    /// Whether `actor` holds `capability` through its role or its id.
    #[must_use]
    pub fn has_capability(&self, actor: &Actor, capability: Capability) -> bool {
        let via_role = actor
            .role
            .and_then(|role| self.by_role.get(&role))
            .is_some_and(|caps| caps.contains(&capability));

        via_role
            || self
                .by_actor
                .get(&actor.id)
                .is_some_and(|caps| caps.contains(&capability))
    }

    /// Every capability `actor` holds.
    #[must_use]
    pub fn capabilities_of(&self, actor: &Actor) -> HashSet<Capability> {
        let mut caps = actor
            .role
            .and_then(|role| self.by_role.get(&role))
            .cloned()
            .unwrap_or_default();
        if let Some(direct) = self.by_actor.get(&actor.id) {
            caps.extend(direct.iter().copied());
        }
        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str, role: Option<Role>) -> Actor {
        Actor {
            id: ActorId::new(id),
            email: None,
            role,
        }
    }

    #[test]
    fn test_role_grants() {
        let map = CapabilityMap::standard();
        let viewer = actor("v", Some(Role::Viewer));
        assert!(map.has_capability(&viewer, Capability::ViewOrders));
        assert!(!map.has_capability(&viewer, Capability::ChangeOrderState));

        let admin = actor("a", Some(Role::Admin));
        assert!(map.has_capability(&admin, Capability::ManageGlobalLinks));
        assert!(!map.has_capability(&admin, Capability::Developer));
    }

    #[test]
    fn test_actor_grants_merge_with_role() {
        let map = CapabilityMap::standard()
            .grant_actor(ActorId::new("dev-1"), [Capability::Developer]);
        let dev = actor("dev-1", Some(Role::Viewer));

        let caps = map.capabilities_of(&dev);
        assert!(caps.contains(&Capability::Developer));
        assert!(caps.contains(&Capability::ViewOrders));
        assert_eq!(caps.len(), 2);
    }

    #[test]
    fn test_actor_without_role_only_gets_direct_grants() {
        let map = CapabilityMap::standard()
            .grant_actor(ActorId::new("dev-1"), [Capability::Developer]);
        let dev = actor("dev-1", None);
        assert!(map.has_capability(&dev, Capability::Developer));
        assert!(!map.has_capability(&dev, Capability::ViewOrders));

        let stranger = actor("nobody", None);
        assert!(map.capabilities_of(&stranger).is_empty());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("editor".parse::<Role>(), Ok(Role::Editor));
        assert!("owner".parse::<Role>().is_err());
    }
}
