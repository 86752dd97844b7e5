//! Storage key layout: `oilChangeApp_<entity>[_<vehicleId>]`.
//!
//! The layout is shared with backups exported from earlier versions of the
//! tracker, so these strings must not change.

use crate::VehicleId;

/// Prefix shared by every tracker key.
pub const PREFIX: &str = "oilChangeApp_";

/// List of all vehicles.
pub const VEHICLES: &str = "oilChangeApp_vehicles";

/// Workshop details shown on service reports.
pub const WORKSHOP_INFO: &str = "oilChangeApp_workshopInfo";

/// Per-vehicle bucket names, one per kind of service record.
pub const OIL_CHANGES: &str = "oilChanges";
pub const BRAKE_SERVICES: &str = "brakeServices";
pub const MECHANIC_SERVICES: &str = "mechanicServices";

/// Every per-vehicle bucket; deleting a vehicle clears all of them.
pub const RECORD_BUCKETS: [&str; 3] = [OIL_CHANGES, BRAKE_SERVICES, MECHANIC_SERVICES];

/// Key holding one kind of record for one vehicle.
#[must_use]
pub fn bucket(kind: &str, vehicle_id: &VehicleId) -> String {
    format!("{PREFIX}{kind}_{vehicle_id}")
}

/// Whether `key` belongs to the tracker.
#[must_use]
pub fn is_namespaced(key: &str) -> bool {
    key.starts_with(PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_keys_follow_layout() {
        let id = VehicleId::new("abc");
        assert_eq!(bucket(OIL_CHANGES, &id), "oilChangeApp_oilChanges_abc");
        assert_eq!(bucket(BRAKE_SERVICES, &id), "oilChangeApp_brakeServices_abc");
        assert_eq!(
            bucket(MECHANIC_SERVICES, &id),
            "oilChangeApp_mechanicServices_abc"
        );
        assert!(is_namespaced(VEHICLES));
        assert!(is_namespaced(WORKSHOP_INFO));
        assert!(!is_namespaced("theme"));
    }
}
