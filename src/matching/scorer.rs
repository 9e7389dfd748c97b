use std::collections::HashSet;

use serde::Serialize;

use crate::models::{OpportunityRecord, VolunteerProfile};

/// Anything that can sit on either side of a match.
pub trait Scorable {
    fn skills(&self) -> &[String];
    fn location(&self) -> Option<&str>;
}

impl Scorable for VolunteerProfile {
    fn skills(&self) -> &[String] {
        &self.skills
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl Scorable for OpportunityRecord {
    fn skills(&self) -> &[String] {
        &self.required_skills
    }

    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchScore {
    pub skill_overlap: u32,
    pub location_bonus: u32,
}

impl MatchScore {
    /// Downstream consumers threshold on this value; it stays a plain sum.
    pub fn total(&self) -> u32 {
        self.skill_overlap + self.location_bonus
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn normalized_skills(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .map(|skill| normalize(skill))
        .filter(|skill| !skill.is_empty())
        .collect()
}

pub fn score(subject: &impl Scorable, candidate: &impl Scorable) -> MatchScore {
    let subject_skills = normalized_skills(subject.skills());
    let candidate_skills = normalized_skills(candidate.skills());
    let skill_overlap = subject_skills.intersection(&candidate_skills).count() as u32;

    let subject_location = normalize(subject.location().unwrap_or_default());
    let candidate_location = normalize(candidate.location().unwrap_or_default());
    let location_bonus = u32::from(!subject_location.is_empty() && subject_location == candidate_location);

    MatchScore { skill_overlap, location_bonus }
}
