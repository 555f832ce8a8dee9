//! Aggregated verification results.

use crate::{
    pair::PairKind,
    verifier::{Outcome, VerificationResult},
};
use std::io::{self, Write};
use supply_audit_primitives::format_ether;

/// How a run ended, as a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every pair was checked and conserved.
    Conserved,
    /// At least one pair had a supply mismatch.
    Mismatch,
    /// No mismatch found, but some pairs could not be checked.
    Indeterminate,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Conserved => 0,
            Self::Mismatch => 1,
            Self::Indeterminate => 2,
        }
    }
}

/// Results of one pass over the catalog, in catalog order.
///
/// `valid` is the conjunction of `equal` over every checked pair. Pairs that
/// could not be checked do not take part in it and are counted separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    results: Vec<VerificationResult>,
    valid: bool,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            valid: true,
        }
    }

    pub fn push(&mut self, result: VerificationResult) {
        if let Some(equal) = result.equal() {
            self.valid &= equal;
        }
        self.results.push(result);
    }

    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn conserved(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Conserved { .. }))
    }

    pub fn mismatched(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Mismatch { .. }))
    }

    pub fn indeterminate(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Indeterminate { .. }))
    }

    fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| f(&r.outcome)).count()
    }

    /// Names of the pairs with a supply mismatch.
    pub fn mismatched_pairs(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.equal() == Some(false))
            .map(|r| r.pair.as_str())
            .collect()
    }

    pub fn exit_status(&self) -> ExitStatus {
        if !self.valid {
            ExitStatus::Mismatch
        } else if self.indeterminate() > 0 {
            ExitStatus::Indeterminate
        } else {
            ExitStatus::Conserved
        }
    }

    /// Line-oriented report.
    pub fn write_table(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Bridge Supply Verification")?;
        writeln!(out, "==========================")?;
        writeln!(out)?;

        for result in &self.results {
            let status = match result.outcome {
                Outcome::Conserved { .. } => "OK",
                Outcome::Mismatch { .. } => "MISMATCH",
                Outcome::Indeterminate { .. } => "INDETERMINATE",
            };
            writeln!(out, "[{status}] {} ({})", result.pair, result.kind)?;

            match &result.escrowed_token {
                Some(token) => writeln!(
                    out,
                    "  Source:       {} (token {token})",
                    result.source
                )?,
                None => writeln!(out, "  Source:       {}", result.source)?,
            }
            match &result.wrapped_token {
                Some(token) => writeln!(
                    out,
                    "  Destination:  {} (token {token})",
                    result.destination
                )?,
                None => writeln!(out, "  Destination:  {}", result.destination)?,
            }

            match &result.outcome {
                Outcome::Indeterminate { reason } => {
                    writeln!(out, "  Error:        {reason}")?;
                }
                outcome => {
                    if let (Some(source), Some(destination)) =
                        (outcome.source_amount(), outcome.destination_amount())
                    {
                        if result.kind == PairKind::EtherBurn {
                            writeln!(
                                out,
                                "  Locked:       {source} ({} ETH)",
                                format_ether(source)
                            )?;
                        } else {
                            writeln!(out, "  Locked:       {source}")?;
                        }
                        writeln!(out, "  Minted:       {destination}")?;
                        writeln!(out, "  Equal:        {}", source == destination)?;
                    }
                }
            }
            writeln!(out)?;
        }

        writeln!(
            out,
            "Overall valid: {} ({} conserved, {} mismatched, {} indeterminate)",
            self.valid,
            self.conserved(),
            self.mismatched(),
            self.indeterminate()
        )?;

        let mismatched = self.mismatched_pairs();
        if !mismatched.is_empty() {
            writeln!(out, "Mismatched pairs: {}", mismatched.join(", "))?;
        }

        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        let pairs: Vec<_> = self
            .results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.pair,
                    "kind": r.kind,
                    "source": r.source,
                    "destination": r.destination,
                    "escrowed_token": r.escrowed_token,
                    "wrapped_token": r.wrapped_token,
                    "source_amount": r.outcome.source_amount().map(|a| a.to_string()),
                    "destination_amount": r.outcome.destination_amount().map(|a| a.to_string()),
                    "equal": r.equal(),
                    "error": match &r.outcome {
                        Outcome::Indeterminate { reason } => Some(reason.as_str()),
                        _ => None,
                    },
                })
            })
            .collect();

        serde_json::json!({
            "valid": self.valid,
            "conserved": self.conserved(),
            "mismatched": self.mismatched(),
            "indeterminate": self.indeterminate(),
            "pairs": pairs,
        })
    }
}
