//! Events carried over the bus

use serde::{Deserialize, Serialize};

/// What happened to the entity, as seen by subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

/// One unit of delivery: the mutation kind tagged onto the entity snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mutation", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationEvent<T> {
    Created(T),
    Updated(T),
    Deleted(T),
}

impl<T> MutationEvent<T> {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Created(_) => MutationKind::Created,
            Self::Updated(_) => MutationKind::Updated,
            Self::Deleted(_) => MutationKind::Deleted,
        }
    }

    pub fn data(&self) -> &T {
        match self {
            Self::Created(data) | Self::Updated(data) | Self::Deleted(data) => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Self::Created(data) | Self::Updated(data) | Self::Deleted(data) => data,
        }
    }

    pub fn into_parts(self) -> (MutationKind, T) {
        (self.kind(), self.into_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let event = MutationEvent::Deleted("p1".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({ "mutation": "DELETED", "data": "p1" }));
    }

    #[test]
    fn test_into_parts() {
        let (kind, data) = MutationEvent::Updated(7).into_parts();
        assert_eq!(kind, MutationKind::Updated);
        assert_eq!(data, 7);
    }
}
