//! Section requirement rules
//!
//! Access requirements are data, not branching code: an ordered table of
//! prefix rules classifies every [`SectionId`].

use lbs_model::{GroupRequirement, SectionId};

/// How a rule matches section ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleMatch {
    /// Only the rule id itself
    Exact,
    /// The rule id and every descendant
    Prefix,
}

/// One row of the requirement table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRule {
    /// Id the rule is anchored at
    pub id: SectionId,
    /// Match mode
    pub matching: RuleMatch,
    /// Requirement applied on match
    pub requirement: GroupRequirement,
}

impl RequirementRule {
    /// Rule covering `id` and its descendants
    #[inline]
    #[must_use]
    pub fn prefix(id: SectionId, requirement: GroupRequirement) -> Self {
        Self {
            id,
            matching: RuleMatch::Prefix,
            requirement,
        }
    }

    /// Rule covering `id` only
    #[inline]
    #[must_use]
    pub fn exact(id: SectionId, requirement: GroupRequirement) -> Self {
        Self {
            id,
            matching: RuleMatch::Exact,
            requirement,
        }
    }

    /// Check a section against this rule
    #[must_use]
    pub fn matches(&self, section: &SectionId) -> bool {
        match self.matching {
            RuleMatch::Exact => &self.id == section,
            RuleMatch::Prefix => self.id.is_prefix_of(section),
        }
    }
}

/// Ordered rule table
///
/// The longest matching rule wins. On equal length an exact rule beats a
/// prefix rule, then the earlier rule wins. Ids no rule matches are
/// [`GroupRequirement::None`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementTable {
    rules: Vec<RequirementRule>,
}

impl RequirementTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule
    pub fn push(&mut self, rule: RequirementRule) {
        self.rules.push(rule);
    }

    /// With an extra rule
    #[must_use]
    pub fn with(mut self, rule: RequirementRule) -> Self {
        self.push(rule);
        self
    }

    /// Rules in declaration order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[RequirementRule] {
        &self.rules
    }

    /// Get number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if table has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify a section
    #[must_use]
    pub fn classify(&self, section: &SectionId) -> GroupRequirement {
        let mut best: Option<&RequirementRule> = None;
        for rule in self.rules.iter().filter(|r| r.matches(section)) {
            let better = match best {
                None => true,
                Some(current) => {
                    rule.id.len() > current.id.len()
                        || (rule.id.len() == current.id.len()
                            && rule.matching == RuleMatch::Exact
                            && current.matching == RuleMatch::Prefix)
                }
            };
            if better {
                best = Some(rule);
            }
        }
        best.map_or(GroupRequirement::None, |rule| rule.requirement)
    }
}

impl FromIterator<RequirementRule> for RequirementTable {
    fn from_iter<T: IntoIterator<Item = RequirementRule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
