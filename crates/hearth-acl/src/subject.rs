//! Subject descriptors and request paths
//!
//! The subject descriptor is assembled by the message-dispatch layer from
//! the authenticated session (node ID, CATs, fabric) before any
//! interaction-model processing; the request path names the resource being
//! acted on.

use crate::entry::AuthMode;
use hearth_core::{CatId, FabricIndex};
use serde::{Deserialize, Serialize};

/// The authenticated initiator of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectDescriptor {
    /// Fabric the session is bound to; [`FabricIndex::NONE`] for
    /// commissioning-time PASE.
    pub fabric_index: FabricIndex,
    /// How the subject authenticated.
    pub auth_mode: AuthMode,
    /// The subject's raw node ID (operational, PASE, or group).
    pub subject_node_id: u64,
    /// CATs asserted by the subject's operational certificate (≤ 3).
    pub cats: Vec<CatId>,
    /// True while the subject holds the commissioning window open.
    pub is_commissioning: bool,
}

/// What kind of interaction the request performs.
///
/// Not consulted by the decision algorithm, but carried so the dispatch
/// layer can log and audit uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestType {
    /// Attribute read.
    #[default]
    AttributeRead,
    /// Attribute write.
    AttributeWrite,
    /// Command invocation.
    CommandInvoke,
    /// Event read.
    EventRead,
}

/// The resource a request acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPath {
    /// Target cluster.
    pub cluster: u32,
    /// Target endpoint.
    pub endpoint: u16,
    /// Interaction kind.
    pub request_type: RequestType,
    /// Attribute/command/event within the cluster, when relevant.
    pub entity_id: Option<u64>,
}

impl RequestPath {
    /// A path with just the fields the decision algorithm consumes.
    pub fn new(cluster: u32, endpoint: u16) -> Self {
        Self {
            cluster,
            endpoint,
            request_type: RequestType::default(),
            entity_id: None,
        }
    }
}
