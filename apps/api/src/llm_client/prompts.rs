// Shared prompt fragments. Each analysis operation defines its own prompts
// alongside it and appends these.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps scoring evidence-based.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every judgement strictly on the text provided. \
    Do NOT infer skills, employers, or years of experience that are not stated. \
    If the text does not support a claim, omit it.";
