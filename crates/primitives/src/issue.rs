use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Issue category reported by the reasoning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
	/// Vague or undeveloped claims.
	Expansion,
	/// Flow, transitions, organisation.
	Structure,
	/// Questionable or unsupported assertions.
	Factual,
	/// Conclusions that do not follow.
	Logic,
	/// Confusing or ambiguous wording.
	Clarity,
	/// Claims needing examples, data, or citations.
	Evidence,
	/// Grammar, spelling, simple style.
	Basic,
}

impl IssueType {
	pub const ALL: [IssueType; 7] = [
		Self::Expansion,
		Self::Structure,
		Self::Factual,
		Self::Logic,
		Self::Clarity,
		Self::Evidence,
		Self::Basic,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Expansion => "expansion",
			Self::Structure => "structure",
			Self::Factual => "factual",
			Self::Logic => "logic",
			Self::Clarity => "clarity",
			Self::Evidence => "evidence",
			Self::Basic => "basic",
		}
	}
}

impl fmt::Display for IssueType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for IssueType {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let s = s.trim();
		Self::ALL
			.into_iter()
			.find(|ty| ty.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnknownVariant(s.to_string()))
	}
}

/// Three-level ordinal priority. Orders as `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	Low,
	Medium,
	High,
}

impl Priority {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Low => "low",
			Self::Medium => "medium",
			Self::High => "high",
		}
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Priority {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			other => Err(UnknownVariant(other.to_string())),
		}
	}
}

/// A category or priority string outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown variant `{}`", self.0)
	}
}

impl std::error::Error for UnknownVariant {}
