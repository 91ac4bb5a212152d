use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! branded_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7()))
            }

            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Lead ids are minted locally and never reused. Session and agent ids
// normally arrive from the remote service via `from_raw`.
branded_id!(LeadId, "lead");
branded_id!(SessionId, "sess");
branded_id!(AgentId, "agent");
branded_id!(InvocationId, "inv");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_id_has_prefix() {
        let id = LeadId::new();
        assert!(id.as_str().starts_with("lead_"), "got: {id}");
    }

    #[test]
    fn invocation_id_has_prefix() {
        let id = InvocationId::new();
        assert!(id.as_str().starts_with("inv_"), "got: {id}");
    }

    #[test]
    fn lead_ids_are_never_reused() {
        let ids: Vec<LeadId> = (0..200).map(|_| LeadId::new()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn from_raw_preserves_remote_value() {
        let id = SessionId::from_raw("a1b2c3-remote");
        assert_eq!(id.as_str(), "a1b2c3-remote");
        assert_eq!(id.to_string(), "a1b2c3-remote");
    }

    #[test]
    fn serializes_transparently() {
        let id = AgentId::from_raw("email-sender");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"email-sender\"");
    }

    #[test]
    fn monotonic_ordering() {
        let ids: Vec<LeadId> = (0..100).map(|_| LeadId::new()).collect();
        for w in ids.windows(2) {
            assert!(w[0].as_str() < w[1].as_str(), "not monotonic: {} >= {}", w[0], w[1]);
        }
    }
}
