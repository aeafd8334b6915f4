//! Closed skill taxonomy: canonical name -> category + synonym list.
//!
//! The dictionary is data, not code branching — extending coverage means
//! adding rows to `DEFS`. Matching is case-insensitive (input is lowercased
//! before scanning) with boundary guards that tolerate names like `c++`,
//! `c#`, `node.js` and `ci/cd`, which defeat plain `\b` anchors.

use once_cell::sync::Lazy;
use regex::Regex;

use super::SkillCategory;

/// Bumped whenever `DEFS` changes shape or coverage.
pub const TAXONOMY_VERSION: &str = "2025-08";

struct SkillDef {
    canonical: &'static str,
    category: SkillCategory,
    synonyms: &'static [&'static str],
}

/// A taxonomy row with its compiled matcher.
pub struct CompiledSkill {
    pub canonical: &'static str,
    pub category: SkillCategory,
    pattern: Regex,
}

impl CompiledSkill {
    /// Byte ranges of every mention of this skill in `text_lower`.
    /// `text_lower` must already be lowercased.
    pub fn mentions<'a>(&'a self, text_lower: &'a str) -> impl Iterator<Item = (usize, usize)> + 'a {
        self.pattern
            .captures_iter(text_lower)
            .filter_map(|c| c.get(1).map(|m| (m.start(), m.end())))
    }
}

use SkillCategory::{Cloud, Databases, Frameworks, Other, Programming, Tools};

const DEFS: &[SkillDef] = &[
    // Programming languages
    SkillDef { canonical: "python", category: Programming, synonyms: &["python", "python3", "py"] },
    SkillDef { canonical: "javascript", category: Programming, synonyms: &["javascript", "js"] },
    SkillDef { canonical: "typescript", category: Programming, synonyms: &["typescript", "ts"] },
    SkillDef { canonical: "java", category: Programming, synonyms: &["java"] },
    SkillDef { canonical: "c++", category: Programming, synonyms: &["c++", "cpp"] },
    SkillDef { canonical: "c#", category: Programming, synonyms: &["c#", "csharp"] },
    SkillDef { canonical: "go", category: Programming, synonyms: &["golang"] },
    SkillDef { canonical: "rust", category: Programming, synonyms: &["rust"] },
    SkillDef { canonical: "ruby", category: Programming, synonyms: &["ruby"] },
    SkillDef { canonical: "php", category: Programming, synonyms: &["php"] },
    SkillDef { canonical: "swift", category: Programming, synonyms: &["swift"] },
    SkillDef { canonical: "kotlin", category: Programming, synonyms: &["kotlin"] },
    SkillDef { canonical: "scala", category: Programming, synonyms: &["scala"] },
    SkillDef { canonical: "r", category: Programming, synonyms: &["r"] },
    // Frameworks and libraries
    SkillDef { canonical: "react", category: Frameworks, synonyms: &["react", "reactjs", "react.js"] },
    SkillDef { canonical: "angular", category: Frameworks, synonyms: &["angular", "angularjs"] },
    SkillDef { canonical: "vue", category: Frameworks, synonyms: &["vue", "vuejs", "vue.js"] },
    SkillDef { canonical: "svelte", category: Frameworks, synonyms: &["svelte"] },
    SkillDef { canonical: "nextjs", category: Frameworks, synonyms: &["next.js", "nextjs"] },
    SkillDef { canonical: "nodejs", category: Frameworks, synonyms: &["node.js", "nodejs"] },
    SkillDef { canonical: "django", category: Frameworks, synonyms: &["django"] },
    SkillDef { canonical: "flask", category: Frameworks, synonyms: &["flask"] },
    SkillDef { canonical: "fastapi", category: Frameworks, synonyms: &["fastapi"] },
    SkillDef { canonical: "spring boot", category: Frameworks, synonyms: &["spring boot", "springboot"] },
    SkillDef { canonical: "rails", category: Frameworks, synonyms: &["rails", "ruby on rails"] },
    SkillDef { canonical: "laravel", category: Frameworks, synonyms: &["laravel"] },
    SkillDef { canonical: "express", category: Frameworks, synonyms: &["express", "expressjs", "express.js"] },
    SkillDef { canonical: "tensorflow", category: Frameworks, synonyms: &["tensorflow"] },
    SkillDef { canonical: "pytorch", category: Frameworks, synonyms: &["pytorch"] },
    SkillDef { canonical: "scikit-learn", category: Frameworks, synonyms: &["scikit-learn", "sklearn"] },
    SkillDef { canonical: "pandas", category: Frameworks, synonyms: &["pandas"] },
    SkillDef { canonical: "numpy", category: Frameworks, synonyms: &["numpy"] },
    // Databases
    SkillDef { canonical: "sql", category: Databases, synonyms: &["sql"] },
    SkillDef { canonical: "mysql", category: Databases, synonyms: &["mysql"] },
    SkillDef { canonical: "postgresql", category: Databases, synonyms: &["postgresql", "postgres"] },
    SkillDef { canonical: "mongodb", category: Databases, synonyms: &["mongodb", "mongo"] },
    SkillDef { canonical: "redis", category: Databases, synonyms: &["redis"] },
    SkillDef { canonical: "elasticsearch", category: Databases, synonyms: &["elasticsearch"] },
    SkillDef { canonical: "cassandra", category: Databases, synonyms: &["cassandra"] },
    SkillDef { canonical: "dynamodb", category: Databases, synonyms: &["dynamodb"] },
    SkillDef { canonical: "firebase", category: Databases, synonyms: &["firebase"] },
    // Cloud platforms
    SkillDef { canonical: "aws", category: Cloud, synonyms: &["aws", "amazon web services", "ec2", "s3"] },
    SkillDef { canonical: "azure", category: Cloud, synonyms: &["azure"] },
    SkillDef { canonical: "gcp", category: Cloud, synonyms: &["gcp", "google cloud"] },
    // Tools
    SkillDef { canonical: "docker", category: Tools, synonyms: &["docker"] },
    SkillDef { canonical: "kubernetes", category: Tools, synonyms: &["kubernetes", "k8s"] },
    SkillDef { canonical: "terraform", category: Tools, synonyms: &["terraform"] },
    SkillDef { canonical: "jenkins", category: Tools, synonyms: &["jenkins"] },
    SkillDef { canonical: "git", category: Tools, synonyms: &["git"] },
    SkillDef { canonical: "ci/cd", category: Tools, synonyms: &["ci/cd", "cicd"] },
    SkillDef { canonical: "linux", category: Tools, synonyms: &["linux"] },
    SkillDef { canonical: "bash", category: Tools, synonyms: &["bash"] },
    SkillDef { canonical: "graphql", category: Tools, synonyms: &["graphql"] },
    SkillDef { canonical: "kafka", category: Tools, synonyms: &["kafka", "apache kafka"] },
    // Cross-cutting
    SkillDef { canonical: "machine learning", category: Other, synonyms: &["machine learning", "ml", "deep learning", "neural networks"] },
    SkillDef { canonical: "nlp", category: Other, synonyms: &["nlp", "natural language processing"] },
    SkillDef { canonical: "computer vision", category: Other, synonyms: &["computer vision"] },
    SkillDef { canonical: "data analysis", category: Other, synonyms: &["data analysis", "data analytics"] },
    SkillDef { canonical: "statistics", category: Other, synonyms: &["statistics"] },
    SkillDef { canonical: "microservices", category: Other, synonyms: &["microservices"] },
    SkillDef { canonical: "system design", category: Other, synonyms: &["system design"] },
    SkillDef { canonical: "rest api", category: Other, synonyms: &["rest api", "rest apis", "restful api", "restful"] },
    SkillDef { canonical: "agile", category: Other, synonyms: &["agile", "scrum"] },
];

/// The compiled taxonomy, built once at first use.
pub static TAXONOMY: Lazy<Vec<CompiledSkill>> = Lazy::new(|| {
    DEFS.iter()
        .map(|def| CompiledSkill {
            canonical: def.canonical,
            category: def.category,
            pattern: compile_synonyms(def.synonyms),
        })
        .collect()
});

/// Characters that can be part of a skill token. Anything outside this set
/// (or the string edge) terminates a mention, so `c++` and `node.js` match
/// whole while `go` never matches inside `golang`.
fn compile_synonyms(synonyms: &[&str]) -> Regex {
    let alternation = synonyms
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?:^|[^a-z0-9+#])({alternation})(?:[^a-z0-9+#]|$)");
    Regex::new(&pattern).expect("taxonomy pattern must compile")
}
