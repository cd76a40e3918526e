use serde::Serialize;

use crate::codes::{CodeSet, CodeTableResolver};
use crate::domain::PurposeAndMethodology;
use crate::sections::{TextBody, TextSection};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignDescription {
    pub description: TextBody,
}

/// Survey design: field method, ecological season and vantage codes.
///
/// Labels that do not resolve are dropped; `None` if nothing resolves.
pub fn build_design_description<C: CodeTableResolver + ?Sized>(
    methodology: &PurposeAndMethodology,
    codes: &C,
) -> Option<DesignDescription> {
    let field_method = methodology
        .field_method_id
        .and_then(|id| codes.resolve(CodeSet::FieldMethod, id))
        .map(|label| TextSection::new("Field Method", label));
    let ecological_season = methodology
        .ecological_season_id
        .and_then(|id| codes.resolve(CodeSet::EcologicalSeason, id))
        .map(|label| TextSection::new("Ecological Season", label));
    let vantage_codes = methodology
        .vantage_code_ids
        .iter()
        .filter_map(|id| codes.resolve(CodeSet::VantageCode, *id))
        .collect::<Vec<_>>();
    let vantage_codes =
        (!vantage_codes.is_empty()).then(|| TextSection::list("Vantage Codes", vantage_codes));

    let section = [field_method, ecological_season, vantage_codes]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    if section.is_empty() {
        return None;
    }
    Some(DesignDescription {
        description: TextBody { section },
    })
}
