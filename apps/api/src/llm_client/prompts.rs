// Prompt constants for the explanation/career-advice call.
// The matching engine issues exactly one LLM call per computed query; both
// the per-posting explanations and the career advice come back together.

/// System prompt that enforces JSON-only output.
pub const EXPLAIN_SYSTEM: &str = "You are an expert career advisor analyzing job fit \
    based on retrieved job posting data. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// User prompt template. `{context}` is replaced with the structured match
/// context (resume skills, per-posting results, skill comparison) as JSON.
pub const EXPLAIN_PROMPT_TEMPLATE: &str = r#"Below is the structured result of matching a candidate's resume against live job postings.

MATCH CONTEXT:
{context}

INSTRUCTIONS:
1. For each posting, explain why it matches or doesn't match based ONLY on the data above.
2. Cite specific matched and missing skills. Be honest about gaps.
3. Keep each explanation under 100 words, concise and actionable.
4. Then give overall career advice: a 2-3 sentence assessment, the 3-5 most
   important skill gaps, market insights, and 4-6 specific action steps.

Respond with exactly this JSON shape:
{
  "explanations": {"<posting_id>": "<explanation text>", ...},
  "career_advice": {
    "current_assessment": "...",
    "skill_gaps": [{"skill": "...", "importance": "Critical|Important", "current_level": "...", "target_level": "..."}],
    "learning_path": [{"title": "...", "type": "Course", "url": null, "duration": "...", "difficulty": "..."}],
    "career_progression": [{"role": "...", "timeline": "...", "key_skills_needed": [], "typical_responsibilities": []}],
    "market_insights": "...",
    "action_plan": ["..."]
  }
}"#;
