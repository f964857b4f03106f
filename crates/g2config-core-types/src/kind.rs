//! Entity kinds of the configuration document
//!
//! Every collection the engine understands is named by an `EntityKind`.
//! The kind also knows which `G2_CONFIG` section stores its records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A kind of entity stored in the configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    DataSource,
    Attribute,
    Feature,
    FeatureClass,
    Element,
    FeatureElement,

    // Functions
    StandardizeFunction,
    ExpressionFunction,
    ComparisonFunction,
    DistinctFunction,
    MatchingFunction,
    ScoringFunction,
    CandidateFunction,
    ValidationFunction,

    // Calls and their element rows
    StandardizeCall,
    ExpressionCall,
    ComparisonCall,
    DistinctCall,
    ExpressionCallElement,
    ComparisonCallElement,
    DistinctCallElement,

    // Thresholds and plans
    ComparisonThreshold,
    GenericThreshold,
    GenericPlan,

    // Resolution rules
    Fragment,
    Rule,
    BehaviorOverride,
}

impl EntityKind {
    /// All kinds, in document order
    pub const ALL: [EntityKind; 27] = [
        EntityKind::DataSource,
        EntityKind::Attribute,
        EntityKind::Feature,
        EntityKind::FeatureClass,
        EntityKind::Element,
        EntityKind::FeatureElement,
        EntityKind::StandardizeFunction,
        EntityKind::ExpressionFunction,
        EntityKind::ComparisonFunction,
        EntityKind::DistinctFunction,
        EntityKind::MatchingFunction,
        EntityKind::ScoringFunction,
        EntityKind::CandidateFunction,
        EntityKind::ValidationFunction,
        EntityKind::StandardizeCall,
        EntityKind::ExpressionCall,
        EntityKind::ComparisonCall,
        EntityKind::DistinctCall,
        EntityKind::ExpressionCallElement,
        EntityKind::ComparisonCallElement,
        EntityKind::DistinctCallElement,
        EntityKind::ComparisonThreshold,
        EntityKind::GenericThreshold,
        EntityKind::GenericPlan,
        EntityKind::Fragment,
        EntityKind::Rule,
        EntityKind::BehaviorOverride,
    ];

    /// Stable snake_case name, identical to the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::DataSource => "data_source",
            EntityKind::Attribute => "attribute",
            EntityKind::Feature => "feature",
            EntityKind::FeatureClass => "feature_class",
            EntityKind::Element => "element",
            EntityKind::FeatureElement => "feature_element",
            EntityKind::StandardizeFunction => "standardize_function",
            EntityKind::ExpressionFunction => "expression_function",
            EntityKind::ComparisonFunction => "comparison_function",
            EntityKind::DistinctFunction => "distinct_function",
            EntityKind::MatchingFunction => "matching_function",
            EntityKind::ScoringFunction => "scoring_function",
            EntityKind::CandidateFunction => "candidate_function",
            EntityKind::ValidationFunction => "validation_function",
            EntityKind::StandardizeCall => "standardize_call",
            EntityKind::ExpressionCall => "expression_call",
            EntityKind::ComparisonCall => "comparison_call",
            EntityKind::DistinctCall => "distinct_call",
            EntityKind::ExpressionCallElement => "expression_call_element",
            EntityKind::ComparisonCallElement => "comparison_call_element",
            EntityKind::DistinctCallElement => "distinct_call_element",
            EntityKind::ComparisonThreshold => "comparison_threshold",
            EntityKind::GenericThreshold => "generic_threshold",
            EntityKind::GenericPlan => "generic_plan",
            EntityKind::Fragment => "fragment",
            EntityKind::Rule => "rule",
            EntityKind::BehaviorOverride => "behavior_override",
        }
    }

    /// Name of the `G2_CONFIG` section holding this kind's records
    pub fn section(&self) -> &'static str {
        match self {
            EntityKind::DataSource => "CFG_DSRC",
            EntityKind::Attribute => "CFG_ATTR",
            EntityKind::Feature => "CFG_FTYPE",
            EntityKind::FeatureClass => "CFG_FCLASS",
            EntityKind::Element => "CFG_FELEM",
            EntityKind::FeatureElement => "CFG_FBOM",
            EntityKind::StandardizeFunction => "CFG_SFUNC",
            EntityKind::ExpressionFunction => "CFG_EFUNC",
            EntityKind::ComparisonFunction => "CFG_CFUNC",
            EntityKind::DistinctFunction => "CFG_DFUNC",
            EntityKind::MatchingFunction => "CFG_MFUNC",
            EntityKind::ScoringFunction => "CFG_SCFUNC",
            EntityKind::CandidateFunction => "CFG_CDFUNC",
            EntityKind::ValidationFunction => "CFG_VFUNC",
            EntityKind::StandardizeCall => "CFG_SFCALL",
            EntityKind::ExpressionCall => "CFG_EFCALL",
            EntityKind::ComparisonCall => "CFG_CFCALL",
            EntityKind::DistinctCall => "CFG_DFCALL",
            EntityKind::ExpressionCallElement => "CFG_EFBOM",
            EntityKind::ComparisonCallElement => "CFG_CFBOM",
            EntityKind::DistinctCallElement => "CFG_DFBOM",
            EntityKind::ComparisonThreshold => "CFG_CFRTN",
            EntityKind::GenericThreshold => "CFG_GENERIC_THRESHOLD",
            EntityKind::GenericPlan => "CFG_GPLAN",
            EntityKind::Fragment => "CFG_ERFRAG",
            EntityKind::Rule => "CFG_ERRULE",
            EntityKind::BehaviorOverride => "CFG_FBOVR",
        }
    }

    /// True for the eight function registries
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            EntityKind::StandardizeFunction
                | EntityKind::ExpressionFunction
                | EntityKind::ComparisonFunction
                | EntityKind::DistinctFunction
                | EntityKind::MatchingFunction
                | EntityKind::ScoringFunction
                | EntityKind::CandidateFunction
                | EntityKind::ValidationFunction
        )
    }

    /// True for the four call kinds
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            EntityKind::StandardizeCall
                | EntityKind::ExpressionCall
                | EntityKind::ComparisonCall
                | EntityKind::DistinctCall
        )
    }

    /// True for the call element (bill of materials) kinds
    pub fn is_call_element(&self) -> bool {
        matches!(
            self,
            EntityKind::ExpressionCallElement
                | EntityKind::ComparisonCallElement
                | EntityKind::DistinctCallElement
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityKind(pub String);

impl fmt::Display for UnknownEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity kind: {}", self.0)
    }
}

impl std::error::Error for UnknownEntityKind {}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    /// Accepts the snake_case name or the section name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EntityKind::ALL
            .iter()
            .copied()
            .find(|k| {
                k.as_str().eq_ignore_ascii_case(wanted) || k.section().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownEntityKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sections_are_unique() {
        let sections: HashSet<_> = EntityKind::ALL.iter().map(|k| k.section()).collect();
        assert_eq!(sections.len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_serde_name_matches_as_str() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            let back: EntityKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn test_from_str_accepts_section_names() {
        assert_eq!("CFG_DSRC".parse::<EntityKind>(), Ok(EntityKind::DataSource));
        assert_eq!("cfg_cfcall".parse::<EntityKind>(), Ok(EntityKind::ComparisonCall));
        assert_eq!("Generic_Plan".parse::<EntityKind>(), Ok(EntityKind::GenericPlan));
        assert!("CFG_NOPE".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_category_predicates() {
        assert_eq!(EntityKind::ALL.iter().filter(|k| k.is_function()).count(), 8);
        assert_eq!(EntityKind::ALL.iter().filter(|k| k.is_call()).count(), 4);
        assert_eq!(EntityKind::ALL.iter().filter(|k| k.is_call_element()).count(), 3);
    }
}
