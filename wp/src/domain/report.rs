//! Validation verdicts and refinement requests

use serde::{Deserialize, Serialize};

/// Director verdict for one validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Approved,
    Rejected,
    Warning,
}

/// One Director invocation's findings; never mutated after creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub iteration: u32,
    pub verdict: Verdict,
    pub budget_verified: bool,
    pub logistics_verified: bool,
    /// 0-based indices of days needing regeneration
    pub flagged_days: Vec<u32>,
    /// Human-readable findings, one line per issue
    pub logs: Vec<String>,
}

impl ValidationReport {
    /// Whether the plan is acceptable as-is
    ///
    /// A WARNING with no flagged days is acceptable: issues exist but
    /// nothing is actionable.
    pub fn is_acceptable(&self) -> bool {
        match self.verdict {
            Verdict::Approved => true,
            Verdict::Warning => self.flagged_days.is_empty(),
            Verdict::Rejected => false,
        }
    }

    /// Whether flagged days should be regenerated
    pub fn needs_refinement(&self) -> bool {
        !self.is_acceptable() && !self.flagged_days.is_empty()
    }
}

/// Instruction to regenerate specific days; consumed by the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinementRequest {
    pub iteration: u32,
    pub days_to_refine: Vec<u32>,
    pub budget_issues: Vec<String>,
    pub logistics_issues: Vec<String>,
}

/// Validation summary attached to the terminal `done` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationMetadata {
    pub budget_verified: bool,
    pub logistics_verified: bool,
    pub total_iterations: u32,
    pub refined_days: Vec<u32>,
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(verdict: Verdict, flagged: Vec<u32>) -> ValidationReport {
        ValidationReport {
            iteration: 1,
            verdict,
            budget_verified: verdict == Verdict::Approved,
            logistics_verified: verdict == Verdict::Approved,
            flagged_days: flagged,
            logs: vec![],
        }
    }

    #[test]
    fn test_verdict_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Approved).unwrap(), "\"APPROVED\"");
        assert_eq!(serde_json::to_string(&Verdict::Rejected).unwrap(), "\"REJECTED\"");
        assert_eq!(serde_json::to_string(&Verdict::Warning).unwrap(), "\"WARNING\"");
    }

    #[test]
    fn test_acceptable_verdicts() {
        assert!(report(Verdict::Approved, vec![]).is_acceptable());
        assert!(report(Verdict::Warning, vec![]).is_acceptable());
        assert!(!report(Verdict::Warning, vec![1]).is_acceptable());
        assert!(!report(Verdict::Rejected, vec![1]).is_acceptable());
    }

    #[test]
    fn test_needs_refinement() {
        assert!(report(Verdict::Rejected, vec![3]).needs_refinement());
        assert!(report(Verdict::Warning, vec![3]).needs_refinement());
        assert!(!report(Verdict::Approved, vec![]).needs_refinement());
        // Rejected with nothing flagged: nothing actionable to regenerate
        assert!(!report(Verdict::Rejected, vec![]).needs_refinement());
    }
}
