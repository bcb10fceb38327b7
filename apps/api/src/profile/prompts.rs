// Profile extraction prompt templates.

pub const CANDIDATE_EXTRACT_PROMPT: &str = r#"Extract a structured candidate profile from the resume text below.

RESUME:
{text}

OUTPUT SCHEMA (return exactly this structure, use null for anything not stated):
{
  "name": "string" | null,
  "city": "string" | null,
  "experience_years": number | null,
  "position": "string" | null,
  "education": "string" | null,
  "languages": ["Language (level)"] | null,
  "salary_expectation": integer | null,
  "employment_type": "string" | null,
  "skills": ["string"] | null,
  "seniority": "junior" | "middle" | "senior" | "lead" | null
}

RULES:
1. experience_years counts only relevant professional experience.
2. salary_expectation is a single monthly amount without currency symbols.
3. Never guess: a field that the text does not state is null.
4. Return ONLY the JSON object. No other text, no code fences."#;

pub const VACANCY_EXTRACT_PROMPT: &str = r#"Extract structured requirements from the vacancy text below.

VACANCY:
{text}

OUTPUT SCHEMA (return exactly this structure, use null for anything not stated):
{
  "city": "string" | null,
  "min_experience_years": number | null,
  "position": "string" | null,
  "education": "string" | null,
  "languages": ["string"] | null,
  "salary_min": integer | null,
  "salary_max": integer | null,
  "employment_type": "string" | null,
  "must_have_skills": ["string"] | null,
  "nice_to_have_skills": ["string"] | null,
  "seniority": "junior" | "middle" | "senior" | "lead" | null
}

RULES:
1. must_have_skills lists only explicitly required skills; "a plus" or "nice to have" go to nice_to_have_skills.
2. Salaries are monthly amounts without currency symbols.
3. Never guess: a field that the text does not state is null.
4. Return ONLY the JSON object. No other text, no code fences."#;
