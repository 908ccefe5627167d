//! Administrative identities and pre-enrolled sessions

/// An authenticated administrative credential, resolved from the network
/// profile by the SDK factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub msp_id: String,
    pub org_id: String,
}

/// A session for a pre-enrolled user. Sessions are only handed out by
/// [`crate::sdk::Sdk::pre_enrolled_session`].
#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
}

impl Session {
    pub(crate) fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_exposes_identity() {
        let session = Session::new(Identity {
            name: "Admin".to_string(),
            msp_id: "Org1MSP".to_string(),
            org_id: "Org1".to_string(),
        });
        assert_eq!(session.identity().name, "Admin");
        assert_eq!(session.identity().org_id, "Org1");
    }
}
