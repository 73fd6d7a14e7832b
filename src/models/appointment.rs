use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Appointment joined with patient and doctor names for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl AppointmentStatus {
    /// Valid transitions: scheduled → completed | cancelled.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed | AppointmentStatus::Cancelled
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_can_complete_or_cancel() {
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Completed));
        assert!(AppointmentStatus::Scheduled.can_transition_to(AppointmentStatus::Cancelled));
    }

    #[test]
    fn terminal_states_cannot_transition() {
        assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::Cancelled));
        assert!(!AppointmentStatus::Cancelled.can_transition_to(AppointmentStatus::Completed));
        assert!(!AppointmentStatus::Completed.can_transition_to(AppointmentStatus::Scheduled));
    }
}
