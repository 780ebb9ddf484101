//! Access control registry: the authorization gate.
//!
//! Holds the single owner, the single appraiser, and the set of authorized
//! agents. Every privileged operation asks this registry first and fails
//! closed with `Unauthorized` before anything is mutated.

use std::collections::HashSet;

use estatemesh_types::{Identity, MarketError, Result};

/// Role membership for the marketplace.
#[derive(Debug, Clone)]
pub struct AccessControl {
    owner: Identity,
    appraiser: Option<Identity>,
    agents: HashSet<Identity>,
}

impl AccessControl {
    /// A registry with `owner` and no appraiser or agents yet.
    #[must_use]
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            appraiser: None,
            agents: HashSet::new(),
        }
    }

    // =================================================================
    // Mutations (owner-only, idempotent)
    // =================================================================

    /// Replace the appraiser.
    pub fn set_appraiser(&mut self, caller: Identity, appraiser: Identity) -> Result<()> {
        self.require_owner(caller)?;
        self.appraiser = Some(appraiser);
        Ok(())
    }

    /// Grant or revoke agent authorization.
    pub fn set_agent_authorization(
        &mut self,
        caller: Identity,
        agent: Identity,
        authorized: bool,
    ) -> Result<()> {
        self.require_owner(caller)?;
        if authorized {
            self.agents.insert(agent);
        } else {
            self.agents.remove(&agent);
        }
        Ok(())
    }

    // =================================================================
    // Guards
    // =================================================================

    pub fn require_owner(&self, caller: Identity) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(MarketError::unauthorized(format!("{caller} is not the owner")))
        }
    }

    pub fn require_appraiser(&self, caller: Identity) -> Result<()> {
        if self.is_appraiser(caller) {
            Ok(())
        } else {
            Err(MarketError::unauthorized(format!(
                "{caller} is not the appraiser"
            )))
        }
    }

    pub fn require_authorized_agent(&self, agent: Identity) -> Result<()> {
        if self.is_authorized_agent(agent) {
            Ok(())
        } else {
            Err(MarketError::unauthorized(format!(
                "{agent} is not an authorized agent"
            )))
        }
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn is_owner(&self, identity: Identity) -> bool {
        self.owner == identity
    }

    #[must_use]
    pub fn is_appraiser(&self, identity: Identity) -> bool {
        self.appraiser == Some(identity)
    }

    #[must_use]
    pub fn is_authorized_agent(&self, identity: Identity) -> bool {
        self.agents.contains(&identity)
    }

    #[must_use]
    pub fn owner(&self) -> Identity {
        self.owner
    }

    #[must_use]
    pub fn appraiser(&self) -> Option<Identity> {
        self.appraiser
    }

    /// Number of authorized agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use estatemesh_types::ErrorKind;

    use super::*;

    #[test]
    fn owner_sets_appraiser() {
        let owner = Identity::new();
        let appraiser = Identity::new();
        let mut acl = AccessControl::new(owner);
        assert!(acl.appraiser().is_none());

        acl.set_appraiser(owner, appraiser).unwrap();
        assert!(acl.is_appraiser(appraiser));
        assert!(acl.require_appraiser(appraiser).is_ok());
        assert!(acl.require_appraiser(owner).is_err());
    }

    #[test]
    fn non_owner_cannot_mutate() {
        let owner = Identity::new();
        let mallory = Identity::new();
        let mut acl = AccessControl::new(owner);

        let err = acl.set_appraiser(mallory, mallory).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(acl.appraiser().is_none());

        let err = acl.set_agent_authorization(mallory, mallory, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!acl.is_authorized_agent(mallory));
    }

    #[test]
    fn agent_authorization_is_idempotent() {
        let owner = Identity::new();
        let agent = Identity::new();
        let mut acl = AccessControl::new(owner);

        acl.set_agent_authorization(owner, agent, true).unwrap();
        acl.set_agent_authorization(owner, agent, true).unwrap();
        assert!(acl.is_authorized_agent(agent));
        assert_eq!(acl.agent_count(), 1);

        acl.set_agent_authorization(owner, agent, false).unwrap();
        acl.set_agent_authorization(owner, agent, false).unwrap();
        assert!(!acl.is_authorized_agent(agent));
        assert!(acl.require_authorized_agent(agent).is_err());
    }

    #[test]
    fn owner_predicate() {
        let owner = Identity::new();
        let acl = AccessControl::new(owner);
        assert!(acl.is_owner(owner));
        assert!(!acl.is_owner(Identity::new()));
        assert_eq!(acl.owner(), owner);
    }
}
