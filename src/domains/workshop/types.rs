use serde::{Deserialize, Serialize};

/// Aggregated readiness snapshot for one workshop date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkshopStatus {
    /// Active (non-abandoned) trainer slots
    pub total_trainers: usize,
    /// Active slots with a matching registration
    pub registered_trainers: usize,
    /// Every active slot is claimed; vacuously true with no active slots
    pub all_claimed: bool,
    /// Registered trainers still owed payment
    pub unpaid_count: usize,
    /// No trainer is owed payment and the client has paid (when a client
    /// contract exists)
    pub all_paid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let status = WorkshopStatus {
            total_trainers: 3,
            registered_trainers: 2,
            all_claimed: false,
            unpaid_count: 1,
            all_paid: false,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["total_trainers"], 3);
        assert_eq!(json["all_paid"], false);

        let back: WorkshopStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }
}
