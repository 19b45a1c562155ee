//! Resolution results and group member distributions

use serde::{Deserialize, Serialize};

use super::artist::{ArtistIdentity, GenderLabel};
use crate::services::pronoun_classifier::Classification;

/// How a resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Served from the persistent store (or this session's memo)
    Cached,
    /// Freshly resolved from a source page
    Resolved,
    /// No source yielded a usable page
    Unresolved,
    /// Stale record could not be deleted; nothing was attempted
    Aborted,
}

impl ResolutionStatus {
    /// Cached or freshly resolved
    pub fn is_complete(self) -> bool {
        matches!(self, ResolutionStatus::Cached | ResolutionStatus::Resolved)
    }
}

/// Per-gender tally of a group's members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDistribution {
    pub nonbinary: u32,
    pub female: u32,
    pub male: u32,
    pub unknown: u32,
    /// Member names in page-list order
    pub member_names: Vec<String>,
}

impl MemberDistribution {
    /// Count one processed member
    pub fn tally(&mut self, gender: Option<GenderLabel>) {
        match gender {
            Some(GenderLabel::Nonbinary) => self.nonbinary += 1,
            Some(GenderLabel::Female) => self.female += 1,
            Some(GenderLabel::Male) => self.male += 1,
            None => self.unknown += 1,
        }
    }

    /// Number of members counted
    pub fn total(&self) -> u32 {
        self.nonbinary + self.female + self.male + self.unknown
    }

    /// Split summary, e.g. "(0 non-binary, 2 female, 1 male, 0 unknown)"
    pub fn split_string(&self) -> String {
        format!(
            "({} non-binary, {} female, {} male, {} unknown)",
            self.nonbinary, self.female, self.male, self.unknown
        )
    }
}

/// Outcome of resolving one artist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub identity: ArtistIdentity,
    pub gender: Option<GenderLabel>,
    /// Words surrounding the pronoun that decided `gender`
    pub context: Option<String>,
    pub is_group: bool,
    pub lead_gender: Option<GenderLabel>,
    /// Present only for groups
    pub members: Option<MemberDistribution>,
    pub status: ResolutionStatus,
}

impl ResolutionResult {
    /// A person, classified from biography prose
    pub fn person(identity: ArtistIdentity, classification: Option<Classification>) -> Self {
        let (gender, context) = match classification {
            Some(c) => (Some(c.gender), Some(c.context)),
            None => (None, None),
        };
        Self {
            identity,
            gender,
            context,
            is_group: false,
            lead_gender: None,
            members: None,
            status: ResolutionStatus::Resolved,
        }
    }

    /// A group, resolved by member expansion
    pub fn group(
        identity: ArtistIdentity,
        lead_gender: Option<GenderLabel>,
        members: MemberDistribution,
    ) -> Self {
        Self {
            identity,
            gender: None,
            context: None,
            is_group: true,
            lead_gender,
            members: Some(members),
            status: ResolutionStatus::Resolved,
        }
    }

    /// No source yielded anything; reported but never stored
    pub fn unresolved(identity: ArtistIdentity) -> Self {
        Self {
            identity,
            gender: None,
            context: None,
            is_group: false,
            lead_gender: None,
            members: None,
            status: ResolutionStatus::Unresolved,
        }
    }

    pub fn aborted(identity: ArtistIdentity) -> Self {
        Self {
            status: ResolutionStatus::Aborted,
            ..Self::unresolved(identity)
        }
    }

    /// A stored record that needs no re-fetch: known gender, or a group
    pub fn is_terminal(&self) -> bool {
        self.is_group || self.gender.is_some()
    }

    /// One-line human readable summary
    pub fn describe(&self) -> String {
        let name = &self.identity.name;
        if self.is_group {
            let lead = self.lead_gender.map(GenderLabel::as_str).unwrap_or("unknown");
            let members = self.members.clone().unwrap_or_default();
            let mut line = format!("{} is a {}-led group {}", name, lead, members.split_string());
            if !members.member_names.is_empty() {
                line.push(' ');
                line.push_str(&members.member_names.join(", "));
            }
            return line;
        }

        match (self.gender, &self.context) {
            (Some(gender), Some(context)) => {
                format!("{} is a {} person (from \"{}\")", name, gender, context)
            }
            (Some(gender), None) => format!("{} is a {} person", name, gender),
            _ => format!("{} is a gender-unknown person", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_tally_and_total() {
        let mut dist = MemberDistribution::default();
        dist.tally(Some(GenderLabel::Female));
        dist.tally(Some(GenderLabel::Male));
        dist.tally(Some(GenderLabel::Female));
        dist.tally(None);

        assert_eq!(dist.female, 2);
        assert_eq!(dist.male, 1);
        assert_eq!(dist.unknown, 1);
        assert_eq!(dist.total(), 4);
    }

    #[test]
    fn test_describe_person_and_group() {
        let person = ResolutionResult::person(
            ArtistIdentity::new("Dolly Parton"),
            Some(Classification {
                gender: GenderLabel::Female,
                context: "Parton is known for her".to_string(),
            }),
        );
        assert_eq!(
            person.describe(),
            "Dolly Parton is a female person (from \"Parton is known for her\")"
        );

        let unknown = ResolutionResult::person(ArtistIdentity::new("Burial"), None);
        assert_eq!(unknown.describe(), "Burial is a gender-unknown person");

        let group = ResolutionResult::group(
            ArtistIdentity::new("Trio"),
            Some(GenderLabel::Female),
            MemberDistribution {
                female: 2,
                male: 1,
                member_names: vec!["A".into(), "B".into(), "C".into()],
                ..Default::default()
            },
        );
        assert_eq!(
            group.describe(),
            "Trio is a female-led group (0 non-binary, 2 female, 1 male, 0 unknown) A, B, C"
        );
    }

    #[test]
    fn test_terminal_records() {
        assert!(!ResolutionResult::person(ArtistIdentity::new("x"), None).is_terminal());
        assert!(ResolutionResult::group(ArtistIdentity::new("g"), None, Default::default())
            .is_terminal());
        assert!(!ResolutionResult::aborted(ArtistIdentity::new("x")).status.is_complete());
    }
}
