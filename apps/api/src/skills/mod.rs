// Skill model and extraction.
// taxonomy: the closed canonical dictionary. extractor: free text -> SkillSet.
// gap: resume vs requirement classification.

pub mod extractor;
pub mod gap;
pub mod taxonomy;

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Proficiency tiers. Declaration order gives the comparison order used
/// everywhere: `None < Beginner < Intermediate < Proficient < Expert`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    None,
    Beginner,
    Intermediate,
    Proficient,
    Expert,
}

impl SkillLevel {
    /// One tier down, saturating at `None`.
    pub fn one_below(self) -> SkillLevel {
        match self {
            SkillLevel::None | SkillLevel::Beginner => SkillLevel::None,
            SkillLevel::Intermediate => SkillLevel::Beginner,
            SkillLevel::Proficient => SkillLevel::Intermediate,
            SkillLevel::Expert => SkillLevel::Proficient,
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkillLevel::None => "none",
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Proficient => "proficient",
            SkillLevel::Expert => "expert",
        };
        f.write_str(s)
    }
}

/// Fixed skill taxonomy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Programming,
    Frameworks,
    Databases,
    Cloud,
    Tools,
    Other,
}

/// A single extracted skill with its canonical name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: SkillLevel,
    /// 0.0 when unknown.
    pub years_experience: f32,
    pub category: SkillCategory,
}

/// Canonical skill name -> `Skill`. Keys are unique by construction; the
/// BTreeMap keeps iteration deterministic so scoring is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSet {
    skills: BTreeMap<String, Skill>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a skill, merging with any existing entry under the same
    /// canonical name: the higher level wins, and on a level tie the larger
    /// years value is kept.
    pub fn insert(&mut self, skill: Skill) {
        match self.skills.entry(skill.name.clone()) {
            btree_map::Entry::Vacant(e) => {
                e.insert(skill);
            }
            btree_map::Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                if skill.level > existing.level {
                    existing.level = skill.level;
                }
                if skill.years_experience > existing.years_experience {
                    existing.years_experience = skill.years_experience;
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.skills.keys().map(|k| k.as_str())
    }
}

impl FromIterator<Skill> for SkillSet {
    fn from_iter<T: IntoIterator<Item = Skill>>(iter: T) -> Self {
        let mut set = SkillSet::new();
        for skill in iter {
            set.insert(skill);
        }
        set
    }
}
