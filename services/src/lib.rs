pub mod checkin;
pub mod device_binding;
pub mod feedback;
pub mod geofence;
pub mod history;
pub mod ledger;
pub mod report;
