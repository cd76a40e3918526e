use serde::Serialize;

use crate::domain::{Coordinator, SurveyRecord};

pub const POINT_OF_CONTACT: &str = "pointOfContact";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualName {
    pub given_name: String,
    pub sur_name: String,
}

/// EML responsible party used for creator, contact and personnel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibleParty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub individual_name: Option<IndividualName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electronic_mail_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Creator and contact party for a project coordinator.
///
/// Name and email are only present when the coordinator agreed to share
/// contact details; otherwise the agency stands alone.
pub fn build_contact(coordinator: &Coordinator) -> ResponsibleParty {
    if !coordinator.share_contact_details {
        return ResponsibleParty {
            individual_name: None,
            organization_name: Some(coordinator.coordinator_agency.clone()),
            electronic_mail_address: None,
            role: None,
        };
    }
    ResponsibleParty {
        individual_name: Some(IndividualName {
            given_name: coordinator.first_name.clone(),
            sur_name: coordinator.last_name.clone(),
        }),
        organization_name: Some(coordinator.coordinator_agency.clone()),
        electronic_mail_address: Some(coordinator.email_address.clone()),
        role: None,
    }
}

pub fn build_personnel(coordinator: &Coordinator) -> ResponsibleParty {
    ResponsibleParty {
        role: Some(POINT_OF_CONTACT.to_string()),
        ..build_contact(coordinator)
    }
}

pub fn build_survey_personnel(survey: &SurveyRecord) -> ResponsibleParty {
    ResponsibleParty {
        individual_name: Some(IndividualName {
            given_name: survey.biologist_first_name.clone(),
            sur_name: survey.biologist_last_name.clone(),
        }),
        organization_name: None,
        electronic_mail_address: None,
        role: Some(POINT_OF_CONTACT.to_string()),
    }
}
