use chrono::{DateTime, Utc};
use crate::models::{Package, PackageState};
use crate::ShipmentError;

impl PackageState {
    /// Edges of the package state graph
    pub fn can_transition_to(&self, target: PackageState) -> bool {
        use PackageState::*;

        matches!(
            (self, target),
            (Pending, InTransit)
                | (Pending, Cancelled)
                | (InTransit, Arrived)
                | (InTransit, Lost)
                | (Arrived, Recovered)
                | (Arrived, Lost)
                | (Recovered, Archived)
                | (Lost, Archived)
        )
    }
}

impl Package {
    fn transition(&mut self, target: PackageState, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        if !self.state.can_transition_to(target) {
            return Err(ShipmentError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }

        self.state = target;
        self.updated_at = now;
        Ok(())
    }

    /// PENDING → IN_TRANSIT
    pub fn depart(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        self.transition(PackageState::InTransit, now)?;
        self.departed_at = Some(now);
        Ok(())
    }

    /// IN_TRANSIT → ARRIVED
    pub fn arrive(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        self.transition(PackageState::Arrived, now)?;
        self.arrived_at = Some(now);
        Ok(())
    }

    /// ARRIVED → RECOVERED. The recipient proves identity with the code
    /// handed out at registration.
    pub fn recover(&mut self, recipient_code: &str, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        if !self.state.can_transition_to(PackageState::Recovered) {
            return Err(ShipmentError::InvalidTransition {
                from: self.state,
                to: PackageState::Recovered,
            });
        }
        if !self.recipient_code.eq_ignore_ascii_case(recipient_code.trim()) {
            return Err(ShipmentError::Validation(format!(
                "recipient code does not match package {}",
                self.id
            )));
        }

        self.transition(PackageState::Recovered, now)?;
        self.resolved_at = Some(now);
        Ok(())
    }

    /// IN_TRANSIT or ARRIVED → LOST
    pub fn mark_lost(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        self.transition(PackageState::Lost, now)?;
        self.resolved_at = Some(now);
        Ok(())
    }

    /// RECOVERED or LOST → ARCHIVED
    pub fn archive(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        self.transition(PackageState::Archived, now)?;
        self.archived_at = Some(now);
        Ok(())
    }

    /// PENDING → CANCELLED
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), ShipmentError> {
        self.transition(PackageState::Cancelled, now)
    }
}
