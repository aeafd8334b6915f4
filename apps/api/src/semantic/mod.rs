//! Semantic retrieval: text embeddings and an exact in-memory cosine index.

pub mod embeddings;
pub mod index;

use crate::jobs::Posting;
use crate::skills::SkillSet;

/// Assembles the text that represents a posting in embedding space.
/// Field labels keep short descriptions from collapsing into noise.
pub fn posting_document(posting: &Posting, skills: &SkillSet) -> String {
    let skill_names: Vec<&str> = skills.names().collect();
    format!(
        "Job Title: {}\nCompany: {}\nLocation: {}\nEmployment Type: {}\nRequired Skills: {}\nDescription: {}",
        posting.title,
        posting.company,
        posting.location,
        posting.employment_type,
        skill_names.join(", "),
        posting.description,
    )
}
