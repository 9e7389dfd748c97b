use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    directory::{IdentityDirectory, OpportunityDirectory},
    models::{OpportunityRecord, UserId, VolunteerProfile},
    AppError, AppResult,
};

use super::scorer::{self, MatchScore};

#[derive(Debug, Clone, Serialize)]
pub struct OpportunityMatch {
    pub opportunity: OpportunityRecord,
    pub score: u32,
    #[serde(flatten)]
    pub components: MatchScore,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolunteerMatch {
    pub volunteer: VolunteerProfile,
    pub score: u32,
    #[serde(flatten)]
    pub components: MatchScore,
}

#[derive(Clone)]
pub struct MatchQueryService {
    identities: Arc<dyn IdentityDirectory>,
    opportunities: Arc<dyn OpportunityDirectory>,
}

impl MatchQueryService {
    pub fn new(
        identities: Arc<dyn IdentityDirectory>,
        opportunities: Arc<dyn OpportunityDirectory>,
    ) -> Self {
        Self { identities, opportunities }
    }

    /// Open opportunities worth showing to a volunteer: zero scores are dropped.
    pub async fn matches_for_volunteer(&self, volunteer_id: UserId) -> AppResult<Vec<OpportunityMatch>> {
        let Some(volunteer) = self.identities.profile(volunteer_id).await? else {
            return Err(AppError::NotFound(format!("volunteer {volunteer_id}")));
        };

        let mut matches: Vec<OpportunityMatch> = self
            .opportunities
            .open_opportunities()
            .await?
            .into_iter()
            .map(|opportunity| {
                let components = scorer::score(&volunteer, &opportunity);
                OpportunityMatch { score: components.total(), components, opportunity }
            })
            .filter(|candidate| candidate.score > 0)
            .collect();

        // stable, so equal scores keep directory order
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(matches)
    }

    /// Every volunteer ranked against an opportunity. Owners see the full pool, zero scores included.
    pub async fn matches_for_opportunity(
        &self,
        opportunity_id: Uuid,
        requester_id: UserId,
    ) -> AppResult<Vec<VolunteerMatch>> {
        let Some(opportunity) = self.opportunities.opportunity(opportunity_id).await? else {
            return Err(AppError::NotFound(format!("opportunity {opportunity_id}")));
        };

        if opportunity.owner_id != requester_id {
            return Err(AppError::Authorization(
                "only the owner can list candidates for an opportunity".into(),
            ));
        }

        let mut matches: Vec<VolunteerMatch> = self
            .identities
            .volunteers()
            .await?
            .into_iter()
            .map(|volunteer| {
                let components = scorer::score(&opportunity, &volunteer);
                VolunteerMatch { score: components.total(), components, volunteer }
            })
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(matches)
    }
}
