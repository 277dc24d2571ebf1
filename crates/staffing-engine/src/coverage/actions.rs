//! Suggested actions for coverage gaps
//!
//! Actions come from a fixed table keyed by severity and by whether the gap
//! belongs to one skill or is an aggregate across a scope.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Severity, SkillId};

/// A remediation step attached to a coverage gap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SuggestedAction {
    RequestOvertime { skill_id: SkillId },
    ReassignCrossSkilled { skill_id: SkillId },
    EscalateToSupervisor,
    ActivateOverflowRouting,
    OfferVoluntaryOvertime { skill_id: SkillId },
    DeferOffPhoneWork { skill_id: Option<SkillId> },
    NotifySupervisor,
    MonitorClosely { skill_id: Option<SkillId> },
    ReleaseSurplus { skill_id: Option<SkillId> },
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestedAction::RequestOvertime { skill_id } => {
                write!(f, "request overtime for certified workers in skill {}", skill_id)
            }
            SuggestedAction::ReassignCrossSkilled { skill_id } => {
                write!(f, "reassign cross-skilled workers to skill {}", skill_id)
            }
            SuggestedAction::EscalateToSupervisor => f.write_str("escalate to supervisor"),
            SuggestedAction::ActivateOverflowRouting => f.write_str("activate overflow routing"),
            SuggestedAction::OfferVoluntaryOvertime { skill_id } => {
                write!(f, "offer voluntary overtime to workers in skill {}", skill_id)
            }
            SuggestedAction::DeferOffPhoneWork { skill_id: Some(skill_id) } => {
                write!(f, "defer breaks and off-phone work in skill {}", skill_id)
            }
            SuggestedAction::DeferOffPhoneWork { skill_id: None } => {
                f.write_str("defer breaks and off-phone work")
            }
            SuggestedAction::NotifySupervisor => f.write_str("notify supervisor"),
            SuggestedAction::MonitorClosely { skill_id: Some(skill_id) } => {
                write!(f, "monitor skill {} closely", skill_id)
            }
            SuggestedAction::MonitorClosely { skill_id: None } => f.write_str("monitor queue closely"),
            SuggestedAction::ReleaseSurplus { skill_id: Some(skill_id) } => {
                write!(f, "release surplus capacity in skill {} to offline work", skill_id)
            }
            SuggestedAction::ReleaseSurplus { skill_id: None } => {
                f.write_str("release surplus capacity to offline work")
            }
        }
    }
}

/// Actions for a gap of the given severity and sign
pub fn suggest(severity: Severity, skill_id: Option<&SkillId>, gap_count: i64) -> Vec<SuggestedAction> {
    if gap_count < 0 {
        return vec![SuggestedAction::ReleaseSurplus {
            skill_id: skill_id.cloned(),
        }];
    }
    if gap_count == 0 {
        return Vec::new();
    }

    match (severity, skill_id) {
        (Severity::Critical, Some(skill)) => vec![
            SuggestedAction::RequestOvertime {
                skill_id: skill.clone(),
            },
            SuggestedAction::ReassignCrossSkilled {
                skill_id: skill.clone(),
            },
        ],
        (Severity::Critical, None) => vec![
            SuggestedAction::EscalateToSupervisor,
            SuggestedAction::ActivateOverflowRouting,
        ],
        (Severity::High, Some(skill)) => vec![
            SuggestedAction::OfferVoluntaryOvertime {
                skill_id: skill.clone(),
            },
            SuggestedAction::DeferOffPhoneWork {
                skill_id: Some(skill.clone()),
            },
        ],
        (Severity::High, None) => vec![
            SuggestedAction::DeferOffPhoneWork { skill_id: None },
            SuggestedAction::NotifySupervisor,
        ],
        (Severity::Medium, skill) => vec![SuggestedAction::MonitorClosely {
            skill_id: skill.cloned(),
        }],
        (Severity::Low, _) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_skill_specific() {
        let skill = SkillId::new("billing");
        let actions = suggest(Severity::Critical, Some(&skill), 4);
        assert_eq!(
            actions[0].to_string(),
            "request overtime for certified workers in skill billing"
        );
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_critical_aggregate_escalates() {
        let actions = suggest(Severity::Critical, None, 4);
        assert_eq!(actions[0], SuggestedAction::EscalateToSupervisor);
        assert_eq!(actions[0].to_string(), "escalate to supervisor");
    }

    #[test]
    fn test_low_and_balanced_have_no_actions() {
        assert!(suggest(Severity::Low, None, 1).is_empty());
        assert!(suggest(Severity::Low, None, 0).is_empty());
    }

    #[test]
    fn test_surplus_release() {
        let actions = suggest(Severity::Low, None, -3);
        assert_eq!(actions, vec![SuggestedAction::ReleaseSurplus { skill_id: None }]);
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let json = serde_json::to_string(&SuggestedAction::NotifySupervisor).unwrap();
        assert_eq!(json, r#"{"action":"notify_supervisor"}"#);
    }
}
