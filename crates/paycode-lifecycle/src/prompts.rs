//! Prompt construction for the generation capability.
//!
//! All prompts pin the model to the closed rule language vocabulary so
//! the compiler, not the provider, stays the arbiter of validity.

use paycode_types::{RuleExample, RuleSimilarity};

/// Description of the rule language given to the model verbatim.
const LANGUAGE_REFERENCE: &str = r#"Rule logic language reference:

Statements:
  let <name> = <expr>;
  if <expr> { <statements> } else { <statements> }
  allocate "<PayCode>" <expr> ["<description>"];

Readable shift fields:
  shift.total_hours   shift duration in fractional hours
  shift.start_hour    hour of day the shift starts (0-23, minute fraction)
  shift.end_hour      hour of day the shift ends
  shift.weekday       0 = Monday through 6 = Sunday
  shift.is_weekend    1 on Saturday or Sunday, else 0

Builtins: min(a, b), max(a, b), abs(x), floor(x), ceil(x)
Operators: + - * /  < > <= >= == !=  && || !
Comparisons yield 1 or 0; `if` treats any non-zero value as true.
Allocated hours must never be negative.

Respond with rule logic statements only. No prose, no code fences."#;

/// Prompt asking the model to restate a rule as a structured intent.
pub fn intent_prompt(statement: &str, description: &str, example: Option<&RuleExample>) -> String {
    let mut prompt = format!(
        "You are interpreting a payroll rule before any code is written.\n\n\
         Rule statement: {statement}\n\
         Rule description: {description}\n"
    );
    if let Some(example) = example {
        prompt.push_str(&format!(
            "\nWorked example supplied by the author:\n\
             Shift from {} to {}\n\
             Expected outcome: {}\n",
            example.shift_start, example.shift_end, example.expected_outcome
        ));
    }
    prompt.push_str(
        "\nRestate the rule as a short structured interpretation covering: the condition \
         that triggers it, the pay codes it allocates to, and how hours are split. \
         Plain text, no code.",
    );
    prompt
}

/// Prompt asking the model for rule logic implementing an interpreted
/// intent.
pub fn codegen_prompt(statement: &str, intent: &str, similar: &[RuleSimilarity]) -> String {
    let mut prompt = format!(
        "{LANGUAGE_REFERENCE}\n\n\
         Write rule logic implementing this payroll rule.\n\n\
         Rule statement: {statement}\n\
         Interpretation: {intent}\n"
    );
    if !similar.is_empty() {
        prompt.push_str("\nPreviously activated rules with similar statements:\n");
        for hit in similar {
            prompt.push_str(&format!("  - {} ({})\n", hit.rule_statement, hit.rule_description));
        }
    }
    prompt
}

/// Prompt asking the model to repair logic that failed to compile.
pub fn fix_prompt(failed_code: &str, error_text: &str) -> String {
    format!(
        "{LANGUAGE_REFERENCE}\n\n\
         The following rule logic failed to compile.\n\n\
         Code:\n{failed_code}\n\n\
         Compiler errors: {error_text}\n\n\
         Return a corrected version of the full rule logic that fixes these errors \
         without changing what the rule does."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn intent_prompt_includes_example_when_present() {
        let example = RuleExample {
            shift_start: Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            shift_end: Utc.with_ymd_and_hms(2026, 3, 2, 18, 0, 0).unwrap(),
            expected_outcome: "8 Regular, 2 Overtime".into(),
        };
        let with = intent_prompt("overtime after 8", "standard", Some(&example));
        assert!(with.contains("8 Regular, 2 Overtime"));
        let without = intent_prompt("overtime after 8", "standard", None);
        assert!(!without.contains("Worked example"));
    }

    #[test]
    fn codegen_prompt_lists_similar_rules() {
        let similar = vec![RuleSimilarity {
            rule_id: paycode_types::RuleId::new(),
            rule_statement: "double pay on Sundays".into(),
            rule_description: "sunday premium".into(),
            score: 0.9,
            organization_id: paycode_types::OrganizationId::new("org-1"),
            created_at: Utc::now(),
            created_by: "alice".into(),
        }];
        let prompt = codegen_prompt("overtime after 8", "pay overtime", &similar);
        assert!(prompt.contains("double pay on Sundays"));
        assert!(prompt.contains("shift.total_hours"));
    }

    #[test]
    fn fix_prompt_carries_code_and_errors() {
        let prompt = fix_prompt("allocate \"Regular\" 8", "P017 (line 1): unexpected end of input");
        assert!(prompt.contains("allocate \"Regular\" 8"));
        assert!(prompt.contains("P017"));
    }
}
