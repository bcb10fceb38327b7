// Shared prompt fragments.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps screening questions away from protected topics.
pub const FAIRNESS_INSTRUCTION: &str = "\
    Never ask about age, marital status, family plans, health, religion, \
    political views, or any other protected characteristic. \
    Judge the candidate only on job-relevant criteria.";
