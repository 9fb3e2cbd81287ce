use mixerp_auth::{Actor, Permission, Role};

/// Acting user for a request, as resolved by the upstream session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// `None` when the session carries a role string outside the known set.
    pub fn role(&self) -> Option<Role> {
        self.actor.role()
    }

    pub fn permissions(&self) -> Vec<Permission> {
        self.actor.permissions()
    }
}
