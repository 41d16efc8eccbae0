pub mod requests;
pub mod topology;
pub mod workers;

pub use requests::{
    CancelReason, CancelRequest, DeliveryOutcome, DeliveryReport, InsertRequest, OfferMaterial,
    ReprioritizeRequest, RequestCancelled, RequestInserted, RequestRejected, RequestSatisfied,
    RequesterRemoved, WithdrawOffer,
};
pub use topology::{MergePartitions, PartitionSplit, PartitionsMerged, ReleaseTerritory, SplitPartition};
pub use workers::{
    JobAssigned, ReportJobless, UnitConverted, WorkerDisplaced, WorkerKilled, WorkerRemoved,
};
