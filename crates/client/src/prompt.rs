//! Prompt text for span triage and detailed span explanations.

use std::fmt::Write;

use drafter_primitives::IssueType;

use crate::DocumentContext;

/// Marker placed before the paragraph under analysis in document context.
pub const TARGET_MARKER: &str = ">>> TARGET <<<";

const TRIAGE_INSTRUCTIONS: &str = r#"Identify specific text spans that would benefit from deeper thinking or structural improvement:

HIGH PRIORITY (focus on these first):
- Expansion opportunities: vague claims, unsupported statements, or ideas that need more development
- Structural issues: poor flow, missing transitions, illogical organization
- Factual concerns: questionable claims, missing evidence, or assertions that need support
- Logic gaps: conclusions that don't follow from premises, missing steps in reasoning

MEDIUM PRIORITY:
- Clarity problems: genuinely confusing or ambiguous statements that impede understanding
- Evidence gaps: claims that would benefit from examples, data, or citations

LOW PRIORITY (only flag if no higher-priority issues exist):
- Basic issues: grammar, spelling, or simple style problems

For each span you identify:
1. Extract the EXACT text (must match character-for-character, including spaces and punctuation)
2. Give character offsets counted from position 0 of the paragraph:
   - startOffset: where the span begins
   - endOffset: where the span ends (exclusive)
   - Example: in "Hello world", "world" starts at 6 and ends at 11
3. Categorize: expansion, structure, factual, logic, clarity, evidence, or basic
4. Set priority: high, medium, or low
5. Rate your confidence (0.0-1.0)
6. Provide reasoning that helps the writer think deeper

Spans must not overlap. Be selective.

Respond with valid JSON in exactly this format, using only ASCII quotes and escaping quotes inside strings:
{
  "spans": [
    {
      "text": "exact text from the paragraph",
      "startOffset": 0,
      "endOffset": 10,
      "type": "expansion|structure|factual|logic|clarity|evidence|basic",
      "priority": "high|medium|low",
      "confidence": 0.85,
      "reasoning": "Question or insight, under 100 characters, no line breaks"
    }
  ]
}

If no significant issues are found, return: {"spans": []}"#;

/// Builds the span triage prompt for one paragraph.
pub fn triage(text: &str, context: Option<&DocumentContext>) -> String {
	let mut prompt = String::from(
		"You are a thoughtful writing coach that helps writers think more deeply about their ideas and \
		 improve the structure of their arguments. Focus on high-value feedback that helps the writer \
		 develop their thinking, not basic proofreading.\n\n",
	);

	if let Some(context) = context.filter(|c| c.paragraphs.len() > 1) {
		let _ = writeln!(prompt, "Full document for context (the paragraph to analyze is marked {TARGET_MARKER}):");
		for paragraph in &context.paragraphs {
			if paragraph.id == context.target {
				let _ = writeln!(prompt, "{TARGET_MARKER} {}", paragraph.content);
			} else {
				let _ = writeln!(prompt, "{}", paragraph.content);
			}
		}
		prompt.push('\n');
		prompt.push_str("Only report spans inside the target paragraph; offsets are relative to it.\n\n");
	}

	let _ = write!(prompt, "Paragraph to analyze:\n\"{text}\"\n\n{TRIAGE_INSTRUCTIONS}");
	prompt
}

/// Builds the detailed explanation prompt for one already-identified span.
pub fn span_analysis(context: &str, span: &str, issue_type: IssueType, reasoning: &str) -> String {
	format!(
		r#"You are an expert writing assistant providing detailed, actionable feedback on a specific text span that has been identified as needing improvement.

Context (full paragraph):
"{context}"

Problematic span:
"{span}"

Issue type: {issue_type}
Initial reasoning: {reasoning}

Provide:
1. Detailed explanation: why is this problematic, and what does it cost the reader?
2. Suggested revisions: 2-3 rewrites that address the issue, keep the author's voice, and fit the paragraph.
3. Writing principle: the general rule that applies here.
4. Severity: low (optional polish), medium (recommended), or high (should be fixed).

Format your response as JSON:
{{
  "explanation": "Detailed explanation of the issue",
  "suggestions": [
    {{ "text": "Suggested revision", "rationale": "Why this revision works" }}
  ],
  "principle": "General writing principle that applies",
  "severity": "low|medium|high"
}}"#
	)
}
