//! Core data model shared by the offer pipeline, the reconciler and the plan
//! hierarchy: offers, resources, recommendations, task statuses and pod
//! instance requirements.

use std::collections::BTreeMap;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Unique identifier assigned by the cluster manager to one offer.
pub type OfferId = String;

/// Unique identifier of a worker node (agent) in the cluster.
pub type AgentId = String;

/// Unique identifier of a task as tracked by the cluster manager.
pub type TaskId = String;

/// An immutable snapshot of resources advertised by the cluster manager on
/// one agent, valid for a short time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub agent_id: AgentId,
    pub resources: Vec<Resource>,
}

impl Offer {
    pub fn new(id: impl Into<OfferId>, agent_id: impl Into<AgentId>, resources: Vec<Resource>) -> Self {
        Self {
            id: id.into(),
            agent_id: agent_id.into(),
            resources,
        }
    }
}

/// A reservation label tying a resource to a `resource_id`, the unit the
/// cluster manager uses to correlate reserve/unreserve operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLabel {
    pub resource_id: String,
    pub principal: Option<String>,
}

/// A persistent-volume marker carried by a disk resource. Its presence is
/// what forces a `Destroy` recommendation ahead of `Unreserve`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persistence {
    pub volume_id: String,
}

/// The kind of resource, mirroring what a cluster manager typically
/// advertises: scalar cpu/mem/disk and ranged ports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResourceKind {
    Cpus(f64),
    Mem(f64),
    Disk(f64),
    Ports(Vec<(u32, u32)>),
}

/// One resource entry within an offer. Disk resources may carry a
/// `persistence` marker and a `reservation` label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub reservation: Option<ReservationLabel>,
    pub persistence: Option<Persistence>,
}

impl Resource {
    pub fn cpus(value: f64) -> Self {
        Self {
            kind: ResourceKind::Cpus(value),
            reservation: None,
            persistence: None,
        }
    }

    pub fn reserved_volume(volume_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Disk(0.0),
            reservation: Some(ReservationLabel {
                resource_id: resource_id.into(),
                principal: None,
            }),
            persistence: Some(Persistence {
                volume_id: volume_id.into(),
            }),
        }
    }

    pub fn reserved(resource_id: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Cpus(0.0),
            reservation: Some(ReservationLabel {
                resource_id: resource_id.into(),
                principal: None,
            }),
            persistence: None,
        }
    }

    pub fn is_persistent_volume(&self) -> bool {
        self.persistence.is_some()
    }
}

/// Opaque placeholder for whatever a `Launch` recommendation needs to start
/// a task; the concrete shape is produced by the client and is not
/// interpreted by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: TaskId,
    pub name: String,
}

/// An intent to apply one operation against one offer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OfferRecommendation {
    Launch { offer_id: OfferId, task: TaskSpec },
    Reserve { offer_id: OfferId, resource: Resource },
    Create { offer_id: OfferId, resource: Resource },
    Destroy { offer_id: OfferId, resource: Resource },
    Unreserve { offer_id: OfferId, resource: Resource },
    Store { offer_id: OfferId, key: String, value: Vec<u8> },
}

impl OfferRecommendation {
    /// The single offer this recommendation applies against.
    pub fn offer_id(&self) -> &OfferId {
        match self {
            OfferRecommendation::Launch { offer_id, .. }
            | OfferRecommendation::Reserve { offer_id, .. }
            | OfferRecommendation::Create { offer_id, .. }
            | OfferRecommendation::Destroy { offer_id, .. }
            | OfferRecommendation::Unreserve { offer_id, .. }
            | OfferRecommendation::Store { offer_id, .. } => offer_id,
        }
    }
}

/// Groups an offer with the subset of its resources flagged as
/// "unexpected" — candidates the cleanup planner may destroy/unreserve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferResources {
    pub offer: Offer,
    pub unexpected: Vec<Resource>,
}

/// A cluster-manager-reported task state. The last five variants are
/// terminal; the reconciler never tracks a terminal status in
/// `unreconciled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Staging,
    Starting,
    Running,
    Finished,
    Failed,
    Killed,
    Lost,
    Error,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Finished | TaskState::Failed | TaskState::Killed | TaskState::Lost | TaskState::Error
        )
    }
}

/// A status update for one task as reported by the cluster manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub state: TaskState,
    pub agent_id: Option<AgentId>,
    #[serde(with = "system_time_millis")]
    pub timestamp: SystemTime,
    pub message: Option<String>,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

mod system_time_millis {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &SystemTime, ser: S) -> Result<S::Ok, S::Error> {
        let millis = value
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64;
        ser.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<SystemTime, D::Error> {
        let millis = u64::deserialize(de)?;
        Ok(UNIX_EPOCH + Duration::from_millis(millis))
    }
}

/// Names a `pod_instance` (a type + index pair) and the set of task names to
/// launch within it. Two requirements conflict iff they name the same
/// pod_instance, regardless of task set overlap.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodInstanceRequirement {
    pub pod_type: String,
    pub pod_index: u32,
    pub task_names: Vec<String>,
}

impl PodInstanceRequirement {
    pub fn new(pod_type: impl Into<String>, pod_index: u32, task_names: Vec<String>) -> Self {
        Self {
            pod_type: pod_type.into(),
            pod_index,
            task_names,
        }
    }

    /// Two requirements conflict iff they refer to the same pod_instance,
    /// i.e. the same (pod_type, pod_index) pair. Task name overlap is
    /// irrelevant.
    pub fn conflicts_with(&self, other: &PodInstanceRequirement) -> bool {
        self.pod_type == other.pod_type && self.pod_index == other.pod_index
    }
}

/// Result reported by the client for one evaluation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientResult {
    Processed,
    NotReady,
    Uninstalled,
}

/// Response from `MesosEventClient::offers`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferResponse {
    pub result: ClientResult,
    pub unused_offers: Vec<Offer>,
    pub recommendations: Vec<OfferRecommendation>,
}

/// Response from `MesosEventClient::get_unexpected_resources`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnexpectedResourcesResponse {
    pub result: ClientResult,
    pub offer_resources: Vec<OfferResources>,
}

/// Per-offer decline filters handed to the driver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclineFilters {
    pub refuse_seconds: f64,
}

/// A convenience map from offer id to offer, used when computing the set of
/// offers referenced by a batch of recommendations.
pub fn index_by_offer_id(offers: &[Offer]) -> BTreeMap<OfferId, &Offer> {
    offers.iter().map(|o| (o.id.clone(), o)).collect()
}
