//! Per-kind schema descriptors
//!
//! One static descriptor per entity kind names the collection's identity
//! fields, its uniqueness constraints and the shapes of its known fields.
//! The generic insert/update/delete machinery in `ops::engine` is driven
//! entirely by these tables.

use g2config_core_types::EntityKind;
use serde_json::Value;

/// Expected JSON shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Str,
    Int,
    /// The strings "Yes" or "No", case-insensitive
    YesNo,
    Any,
}

impl FieldShape {
    /// Check a value against the shape
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldShape::Str => value.is_string(),
            FieldShape::Int => value.is_i64(),
            FieldShape::YesNo => value
                .as_str()
                .is_some_and(|s| s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("no")),
            FieldShape::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: FieldShape,
    /// Field may hold JSON null
    pub nullable: bool,
}

const fn field(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec {
        name,
        shape,
        nullable: false,
    }
}

const fn nullable(name: &'static str, shape: FieldShape) -> FieldSpec {
    FieldSpec {
        name,
        shape,
        nullable: true,
    }
}

/// Static schema of one entity kind
#[derive(Debug)]
pub struct KindDescriptor {
    pub kind: EntityKind,
    /// Engine-assigned numeric id
    pub id_field: Option<&'static str>,
    /// Case-insensitive unique code
    pub code_field: Option<&'static str>,
    /// Composite identity for kinds without id or code
    pub key_fields: &'static [&'static str],
    /// Additional uniqueness constraint over mutable fields
    pub unique_fields: &'static [&'static str],
    pub fields: &'static [FieldSpec],
    /// Kind can be read but never mutated
    pub read_only: bool,
}

impl KindDescriptor {
    /// Fields that may never change once a record exists
    pub fn immutable_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.id_field
            .into_iter()
            .chain(self.code_field)
            .chain(self.key_fields.iter().copied())
    }

    pub fn is_immutable(&self, name: &str) -> bool {
        self.immutable_fields().any(|f| f == name)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

use FieldShape::{Any, Int, Str, YesNo};

static DATA_SOURCE: KindDescriptor = KindDescriptor {
    kind: EntityKind::DataSource,
    id_field: Some("DSRC_ID"),
    code_field: Some("DSRC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("DSRC_DESC", Str),
        field("DSRC_RELY", Int),
        field("RETENTION_LEVEL", Str),
        field("CONVERSATIONAL", YesNo),
    ],
    read_only: false,
};

static ATTRIBUTE: KindDescriptor = KindDescriptor {
    kind: EntityKind::Attribute,
    id_field: Some("ATTR_ID"),
    code_field: Some("ATTR_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("ATTR_CLASS", Str),
        nullable("FTYPE_CODE", Str),
        nullable("FELEM_CODE", Str),
        field("FELEM_REQ", Str),
        nullable("DEFAULT_VALUE", Any),
        field("INTERNAL", YesNo),
    ],
    read_only: false,
};

static FEATURE: KindDescriptor = KindDescriptor {
    kind: EntityKind::Feature,
    id_field: Some("FTYPE_ID"),
    code_field: Some("FTYPE_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("FTYPE_DESC", Str),
        field("FCLASS_ID", Int),
        field("FTYPE_FREQ", Str),
        field("FTYPE_EXCL", YesNo),
        field("FTYPE_STAB", YesNo),
        field("ANONYMIZE", YesNo),
        field("DERIVED", YesNo),
        field("USED_FOR_CAND", YesNo),
        field("SHOW_IN_MATCH_KEY", Str),
        field("PERSIST_HISTORY", YesNo),
        field("VERSION", Int),
        field("RTYPE_ID", Int),
    ],
    read_only: false,
};

static FEATURE_CLASS: KindDescriptor = KindDescriptor {
    kind: EntityKind::FeatureClass,
    id_field: Some("FCLASS_ID"),
    code_field: Some("FCLASS_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[field("FCLASS_DESC", Str)],
    read_only: true,
};

static ELEMENT: KindDescriptor = KindDescriptor {
    kind: EntityKind::Element,
    id_field: Some("FELEM_ID"),
    code_field: Some("FELEM_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("FELEM_DESC", Str),
        field("DATA_TYPE", Str),
        field("TOKENIZE", YesNo),
    ],
    read_only: false,
};

static FEATURE_ELEMENT: KindDescriptor = KindDescriptor {
    kind: EntityKind::FeatureElement,
    id_field: None,
    code_field: None,
    key_fields: &["FTYPE_ID", "FELEM_ID"],
    unique_fields: &[],
    fields: &[
        field("FTYPE_ID", Int),
        field("FELEM_ID", Int),
        field("EXEC_ORDER", Int),
        field("DISPLAY_LEVEL", Int),
        nullable("DISPLAY_DELIM", Str),
        field("DERIVED", YesNo),
    ],
    read_only: false,
};

static STANDARDIZE_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::StandardizeFunction,
    id_field: Some("SFUNC_ID"),
    code_field: Some("SFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("SFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static EXPRESSION_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::ExpressionFunction,
    id_field: Some("EFUNC_ID"),
    code_field: Some("EFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("EFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static COMPARISON_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::ComparisonFunction,
    id_field: Some("CFUNC_ID"),
    code_field: Some("CFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("CFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
        field("ANON_SUPPORT", YesNo),
    ],
    read_only: false,
};

static DISTINCT_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::DistinctFunction,
    id_field: Some("DFUNC_ID"),
    code_field: Some("DFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("DFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static MATCHING_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::MatchingFunction,
    id_field: Some("MFUNC_ID"),
    code_field: Some("MFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("MFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static SCORING_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::ScoringFunction,
    id_field: Some("SCFUNC_ID"),
    code_field: Some("SCFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("SCFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static CANDIDATE_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::CandidateFunction,
    id_field: Some("CDFUNC_ID"),
    code_field: Some("CDFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("CDFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static VALIDATION_FUNCTION: KindDescriptor = KindDescriptor {
    kind: EntityKind::ValidationFunction,
    id_field: Some("VFUNC_ID"),
    code_field: Some("VFUNC_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("VFUNC_DESC", Str),
        field("CONNECT_STR", Str),
        nullable("LANGUAGE", Str),
    ],
    read_only: false,
};

static STANDARDIZE_CALL: KindDescriptor = KindDescriptor {
    kind: EntityKind::StandardizeCall,
    id_field: Some("SFCALL_ID"),
    code_field: None,
    key_fields: &[],
    unique_fields: &["FTYPE_ID", "FELEM_ID", "EXEC_ORDER"],
    fields: &[
        field("FTYPE_ID", Int),
        field("FELEM_ID", Int),
        field("SFUNC_ID", Int),
        field("EXEC_ORDER", Int),
    ],
    read_only: false,
};

static EXPRESSION_CALL: KindDescriptor = KindDescriptor {
    kind: EntityKind::ExpressionCall,
    id_field: Some("EFCALL_ID"),
    code_field: None,
    key_fields: &[],
    unique_fields: &["FTYPE_ID", "FELEM_ID", "EXEC_ORDER"],
    fields: &[
        field("FTYPE_ID", Int),
        field("FELEM_ID", Int),
        field("EFUNC_ID", Int),
        field("EXEC_ORDER", Int),
        field("EFEAT_FTYPE_ID", Int),
        field("IS_VIRTUAL", YesNo),
    ],
    read_only: false,
};

static COMPARISON_CALL: KindDescriptor = KindDescriptor {
    kind: EntityKind::ComparisonCall,
    id_field: Some("CFCALL_ID"),
    code_field: None,
    key_fields: &[],
    unique_fields: &["FTYPE_ID"],
    fields: &[
        field("FTYPE_ID", Int),
        field("CFUNC_ID", Int),
        field("EXEC_ORDER", Int),
    ],
    read_only: false,
};

static DISTINCT_CALL: KindDescriptor = KindDescriptor {
    kind: EntityKind::DistinctCall,
    id_field: Some("DFCALL_ID"),
    code_field: None,
    key_fields: &[],
    unique_fields: &["FTYPE_ID"],
    fields: &[
        field("FTYPE_ID", Int),
        field("DFUNC_ID", Int),
        field("EXEC_ORDER", Int),
    ],
    read_only: false,
};

static EXPRESSION_CALL_ELEMENT: KindDescriptor = KindDescriptor {
    kind: EntityKind::ExpressionCallElement,
    id_field: None,
    code_field: None,
    key_fields: &["EFCALL_ID", "FTYPE_ID", "FELEM_ID"],
    unique_fields: &[],
    fields: &[
        field("EFCALL_ID", Int),
        field("FTYPE_ID", Int),
        field("FELEM_ID", Int),
        field("EXEC_ORDER", Int),
        field("FELEM_REQ", Str),
    ],
    read_only: false,
};

static COMPARISON_CALL_ELEMENT: KindDescriptor = KindDescriptor {
    kind: EntityKind::ComparisonCallElement,
    id_field: None,
    code_field: None,
    key_fields: &["CFCALL_ID", "FTYPE_ID", "FELEM_ID"],
    unique_fields: &[],
    fields: &[
        field("CFCALL_ID", Int),
        field("FTYPE_ID", Int),
        field("FELEM_ID", Int),
        field("EXEC_ORDER", Int),
    ],
    read_only: false,
};

static DISTINCT_CALL_ELEMENT: KindDescriptor = KindDescriptor {
    kind: EntityKind::DistinctCallElement,
    id_field: None,
    code_field: None,
    key_fields: &["DFCALL_ID", "FTYPE_ID", "FELEM_ID"],
    unique_fields: &[],
    fields: &[
        field("DFCALL_ID", Int),
        field("FTYPE_ID", Int),
        field("FELEM_ID", Int),
        field("EXEC_ORDER", Int),
    ],
    read_only: false,
};

static COMPARISON_THRESHOLD: KindDescriptor = KindDescriptor {
    kind: EntityKind::ComparisonThreshold,
    id_field: Some("CFRTN_ID"),
    code_field: None,
    key_fields: &[],
    unique_fields: &["CFUNC_ID", "FTYPE_ID", "CFUNC_RTNVAL"],
    fields: &[
        field("CFUNC_ID", Int),
        field("FTYPE_ID", Int),
        field("CFUNC_RTNVAL", Str),
        field("EXEC_ORDER", Int),
        field("SAME_SCORE", Int),
        field("CLOSE_SCORE", Int),
        field("LIKELY_SCORE", Int),
        field("PLAUSIBLE_SCORE", Int),
        field("UN_LIKELY_SCORE", Int),
    ],
    read_only: false,
};

static GENERIC_THRESHOLD: KindDescriptor = KindDescriptor {
    kind: EntityKind::GenericThreshold,
    id_field: None,
    code_field: None,
    key_fields: &["GPLAN_ID", "BEHAVIOR", "FTYPE_ID"],
    unique_fields: &[],
    fields: &[
        field("GPLAN_ID", Int),
        field("BEHAVIOR", Str),
        field("FTYPE_ID", Int),
        field("CANDIDATE_CAP", Int),
        field("SCORING_CAP", Int),
        field("SEND_TO_REDO", YesNo),
    ],
    read_only: false,
};

static GENERIC_PLAN: KindDescriptor = KindDescriptor {
    kind: EntityKind::GenericPlan,
    id_field: Some("GPLAN_ID"),
    code_field: Some("GPLAN_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[field("GPLAN_DESC", Str)],
    read_only: false,
};

static FRAGMENT: KindDescriptor = KindDescriptor {
    kind: EntityKind::Fragment,
    id_field: Some("ERFRAG_ID"),
    code_field: Some("ERFRAG_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("ERFRAG_DESC", Str),
        field("ERFRAG_SOURCE", Str),
        nullable("ERFRAG_DEPENDS", Str),
    ],
    read_only: false,
};

static RULE: KindDescriptor = KindDescriptor {
    kind: EntityKind::Rule,
    id_field: Some("ERRULE_ID"),
    code_field: Some("ERRULE_CODE"),
    key_fields: &[],
    unique_fields: &[],
    fields: &[
        field("RESOLVE", YesNo),
        field("RELATE", YesNo),
        field("RTYPE_ID", Int),
        nullable("QUAL_ERFRAG_CODE", Str),
        nullable("DISQ_ERFRAG_CODE", Str),
        nullable("ERRULE_TIER", Int),
    ],
    read_only: false,
};

static BEHAVIOR_OVERRIDE: KindDescriptor = KindDescriptor {
    kind: EntityKind::BehaviorOverride,
    id_field: None,
    code_field: None,
    key_fields: &["FTYPE_ID", "UTYPE_CODE"],
    unique_fields: &[],
    fields: &[
        field("FTYPE_ID", Int),
        field("UTYPE_CODE", Str),
        field("FTYPE_FREQ", Str),
        field("FTYPE_EXCL", YesNo),
        field("FTYPE_STAB", YesNo),
    ],
    read_only: false,
};

/// Descriptor of a kind
pub fn descriptor(kind: EntityKind) -> &'static KindDescriptor {
    match kind {
        EntityKind::DataSource => &DATA_SOURCE,
        EntityKind::Attribute => &ATTRIBUTE,
        EntityKind::Feature => &FEATURE,
        EntityKind::FeatureClass => &FEATURE_CLASS,
        EntityKind::Element => &ELEMENT,
        EntityKind::FeatureElement => &FEATURE_ELEMENT,
        EntityKind::StandardizeFunction => &STANDARDIZE_FUNCTION,
        EntityKind::ExpressionFunction => &EXPRESSION_FUNCTION,
        EntityKind::ComparisonFunction => &COMPARISON_FUNCTION,
        EntityKind::DistinctFunction => &DISTINCT_FUNCTION,
        EntityKind::MatchingFunction => &MATCHING_FUNCTION,
        EntityKind::ScoringFunction => &SCORING_FUNCTION,
        EntityKind::CandidateFunction => &CANDIDATE_FUNCTION,
        EntityKind::ValidationFunction => &VALIDATION_FUNCTION,
        EntityKind::StandardizeCall => &STANDARDIZE_CALL,
        EntityKind::ExpressionCall => &EXPRESSION_CALL,
        EntityKind::ComparisonCall => &COMPARISON_CALL,
        EntityKind::DistinctCall => &DISTINCT_CALL,
        EntityKind::ExpressionCallElement => &EXPRESSION_CALL_ELEMENT,
        EntityKind::ComparisonCallElement => &COMPARISON_CALL_ELEMENT,
        EntityKind::DistinctCallElement => &DISTINCT_CALL_ELEMENT,
        EntityKind::ComparisonThreshold => &COMPARISON_THRESHOLD,
        EntityKind::GenericThreshold => &GENERIC_THRESHOLD,
        EntityKind::GenericPlan => &GENERIC_PLAN,
        EntityKind::Fragment => &FRAGMENT,
        EntityKind::Rule => &RULE,
        EntityKind::BehaviorOverride => &BEHAVIOR_OVERRIDE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_an_identity() {
        for kind in EntityKind::ALL {
            let d = descriptor(kind);
            assert_eq!(d.kind, kind);
            assert!(
                d.id_field.is_some() || d.code_field.is_some() || !d.key_fields.is_empty(),
                "{} has no identity",
                kind
            );
        }
    }

    #[test]
    fn test_function_descriptors_share_shape() {
        for kind in EntityKind::ALL.iter().filter(|k| k.is_function()) {
            let d = descriptor(*kind);
            assert!(d.field("CONNECT_STR").is_some(), "{} lacks CONNECT_STR", kind);
            assert!(d.id_field.is_some() && d.code_field.is_some());
        }
    }

    #[test]
    fn test_yes_no_shape() {
        assert!(FieldShape::YesNo.accepts(&Value::from("yes")));
        assert!(FieldShape::YesNo.accepts(&Value::from("No")));
        assert!(!FieldShape::YesNo.accepts(&Value::from("maybe")));
        assert!(!FieldShape::YesNo.accepts(&Value::from(1)));
    }

    #[test]
    fn test_immutable_fields() {
        let d = descriptor(EntityKind::DataSource);
        assert!(d.is_immutable("DSRC_ID"));
        assert!(d.is_immutable("DSRC_CODE"));
        assert!(!d.is_immutable("DSRC_DESC"));
        let g = descriptor(EntityKind::GenericThreshold);
        assert!(g.is_immutable("BEHAVIOR"));
        assert!(!g.is_immutable("SCORING_CAP"));
    }
}
