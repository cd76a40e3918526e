use serde::Serialize;

use crate::domain::FundingSource;
use crate::sections::TextSection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingSection {
    pub section: Vec<TextSection>,
}

/// One `Agency Name` section per funding source; `None` when there are none.
pub fn build_funding(sources: &[FundingSource]) -> Option<FundingSection> {
    if sources.is_empty() {
        return None;
    }
    let section = sources
        .iter()
        .map(|source| {
            let details = [
                TextSection::optional(
                    "Funding Agency Project ID",
                    source.agency_project_id.as_deref(),
                ),
                TextSection::optional(
                    "Investment Action/Category",
                    source.investment_action_category_name.as_deref(),
                ),
                source
                    .funding_amount
                    .map(|amount| TextSection::new("Funding Amount", amount.to_string())),
                Some(TextSection::new(
                    "Funding Start Date",
                    source.start_date.format("%Y-%m-%d").to_string(),
                )),
                Some(TextSection::new(
                    "Funding End Date",
                    source.end_date.format("%Y-%m-%d").to_string(),
                )),
            ];
            TextSection {
                section: details.into_iter().flatten().collect(),
                ..TextSection::new("Agency Name", source.agency_name.clone())
            }
        })
        .collect();
    Some(FundingSection { section })
}
