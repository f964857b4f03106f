//! Rule fragments (`CFG_ERFRAG`)
//!
//! A fragment source may embed other fragments as `FRAGMENT[./CODE>0 ...]`.
//! Every embedded code must name an existing fragment; their ids are kept in
//! `ERFRAG_DEPENDS` as a sorted comma-separated list, recomputed whenever the
//! source changes. A fragment may not depend on itself, directly or through
//! other fragments.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{ConfigError, Result};
use crate::model::record::{get_i64, get_str, normalize_code};
use crate::model::Document;
use crate::ops::engine::{self, DeleteReport};
use crate::ops::patch::{Patch, Update};
use crate::ops::record;
use crate::policy::DeletePolicy;
use crate::refgraph::parse_id_list;
use crate::registry::{EntityKey, Registry};
use g2config_core_types::EntityKind;

const FRAGMENT_OPEN: &str = "FRAGMENT[";
const CODE_TERMINATORS: &str = "|=><)] /";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFragment {
    #[serde(alias = "code")]
    pub fragment: String,
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FragmentUpdate {
    pub description: Update<String>,
    pub source: Update<String>,
}

/// Fragment codes referenced inside the `FRAGMENT[...]` groups of `source`
pub fn referenced_fragments(source: &str) -> Vec<String> {
    let mut codes = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find(FRAGMENT_OPEN) {
        let body = &rest[start + FRAGMENT_OPEN.len()..];
        let end = body.find(']').unwrap_or(body.len());
        for token in body[..end].split('/').skip(1) {
            let code: String = token
                .chars()
                .take_while(|c| !CODE_TERMINATORS.contains(*c))
                .collect();
            if !code.is_empty() {
                codes.push(code);
            }
        }
        rest = &body[end..];
    }
    codes
}

/// Resolve the dependency list of a fragment source
///
/// Returns `None` when the source embeds no fragments.
///
/// # Errors
///
/// Returns `InvalidReference` for an embedded code with no fragment.
pub fn fragment_dependencies(doc: &Document, source: &str) -> Result<Option<String>> {
    let registry = Registry::new(doc, EntityKind::Fragment);
    let mut ids = BTreeSet::new();
    for code in referenced_fragments(source) {
        let id = registry
            .id_of(&code)
            .map_err(|_| ConfigError::InvalidReference {
                kind: EntityKind::Fragment,
                field: "ERFRAG_SOURCE".to_string(),
                target: EntityKind::Fragment,
                value: code.clone(),
            })?;
        ids.insert(id);
    }
    if ids.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        ids.iter().map(i64::to_string).collect::<Vec<_>>().join(","),
    ))
}

fn self_reference(code: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: "ERFRAG_SOURCE".to_string(),
        reason: format!("fragment {} depends on itself", code),
    }
}

/// Reject a source that embeds the fragment's own code, or whose
/// dependencies lead back to fragment `id`
fn check_acyclic(
    doc: &Document,
    code: &str,
    id: Option<i64>,
    source: &str,
    depends: Option<&str>,
) -> Result<()> {
    if referenced_fragments(source)
        .iter()
        .any(|c| c.eq_ignore_ascii_case(code))
    {
        return Err(self_reference(code));
    }
    let (Some(id), Some(depends)) = (id, depends) else {
        return Ok(());
    };
    let registry = Registry::new(doc, EntityKind::Fragment);
    let mut seen = BTreeSet::new();
    let mut pending = parse_id_list(depends);
    while let Some(next) = pending.pop() {
        if next == id {
            return Err(self_reference(code));
        }
        if !seen.insert(next) {
            continue;
        }
        if let Some(list) = registry
            .lookup_by_id(next)
            .and_then(|r| get_str(r, "ERFRAG_DEPENDS"))
        {
            pending.extend(parse_id_list(list));
        }
    }
    Ok(())
}

/// Extend `patch` with a source change for the fragment named by `key`,
/// recomputing its dependency list
///
/// # Errors
///
/// Returns `NotFound`, `InvalidReference` for an unknown embedded fragment,
/// or `InvalidField` for a self-dependency.
pub(crate) fn with_source(
    doc: &Document,
    key: &EntityKey,
    patch: Patch,
    source: Update<String>,
) -> Result<Patch> {
    Ok(match source {
        Update::Set(source) => {
            let current = Registry::new(doc, EntityKind::Fragment).get(key)?;
            let code = get_str(current, "ERFRAG_CODE").unwrap_or_default();
            let depends = fragment_dependencies(doc, &source)?;
            check_acyclic(
                doc,
                code,
                get_i64(current, "ERFRAG_ID"),
                &source,
                depends.as_deref(),
            )?;
            patch
                .set("ERFRAG_SOURCE", source)
                .set("ERFRAG_DEPENDS", depends.map_or(Value::Null, Value::from))
        }
        Update::Clear => patch.clear("ERFRAG_SOURCE"),
        Update::Unchanged => patch,
    })
}

/// Add a fragment, returning its id
///
/// # Errors
///
/// - `DuplicateCode` when the code exists
/// - `InvalidReference` when the source embeds an unknown fragment
/// - `InvalidField` when the source embeds the fragment itself
pub fn add_fragment(doc: &mut Document, params: AddFragment) -> Result<i64> {
    let code = normalize_code("ERFRAG_CODE", &params.fragment)?;
    check_acyclic(doc, &code, None, &params.source, None)?;
    let depends = fragment_dependencies(doc, &params.source)?;
    let description = params.description.unwrap_or_else(|| code.clone());
    let rec = record(json!({
        "ERFRAG_CODE": code,
        "ERFRAG_DESC": description,
        "ERFRAG_SOURCE": params.source,
        "ERFRAG_DEPENDS": depends,
    }));
    Ok(engine::insert(doc, EntityKind::Fragment, rec)?.unwrap_or_default())
}

/// # Errors
///
/// Returns `NotFound`, or `ReferencedByOthers` while rules or other
/// fragments use it.
pub fn delete_fragment(doc: &mut Document, code: &str, policy: &dyn DeletePolicy) -> Result<DeleteReport> {
    engine::delete(doc, EntityKind::Fragment, &EntityKey::code(code), policy)
}

/// Update a fragment; a new source recomputes `ERFRAG_DEPENDS`
///
/// # Errors
///
/// Returns `NotFound`, `InvalidField` when the source is cleared or makes
/// the fragment depend on itself, or `InvalidReference` for an unknown
/// embedded fragment.
pub fn set_fragment(doc: &mut Document, code: &str, update: FragmentUpdate) -> Result<()> {
    let key = EntityKey::code(code);
    let patch = Patch::new().update("ERFRAG_DESC", update.description);
    let patch = with_source(doc, &key, patch, update.source)?;
    engine::update(doc, EntityKind::Fragment, &key, &patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RejectReferencedPolicy;

    fn frag(code: &str, source: &str) -> AddFragment {
        AddFragment {
            fragment: code.to_string(),
            source: source.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_referenced_fragments_scans_groups() {
        let codes = referenced_fragments(
            "./FRAGMENT[./SAME_NAME>0] and ./FRAGMENT[./CLOSE_DOB>0 or ./SAME_DOB>0]/SCORE>90",
        );
        assert_eq!(codes, vec!["SAME_NAME", "CLOSE_DOB", "SAME_DOB"]);
        assert!(referenced_fragments("./SCORE>90").is_empty());
    }

    #[test]
    fn test_add_fragment_records_dependencies() {
        let mut doc = Document::empty();
        add_fragment(&mut doc, frag("same_name", "./SCORES/NAME[./FULL_SCORE>90]")).unwrap();
        add_fragment(&mut doc, frag("close_dob", "./SCORES/DOB[./FULL_SCORE>85]")).unwrap();
        add_fragment(
            &mut doc,
            frag("sn_cd", "./FRAGMENT[./CLOSE_DOB>0 and ./SAME_NAME>0]"),
        )
        .unwrap();

        let recs = doc.records(EntityKind::Fragment);
        assert_eq!(recs[0]["ERFRAG_DEPENDS"], Value::Null);
        assert_eq!(recs[2]["ERFRAG_DEPENDS"], "1,2");
        assert_eq!(recs[2]["ERFRAG_DESC"], "SN_CD");
    }

    #[test]
    fn test_unknown_embedded_fragment_is_rejected() {
        let mut doc = Document::empty();
        let result = add_fragment(&mut doc, frag("x", "./FRAGMENT[./MISSING>0]"));
        assert!(matches!(result, Err(ConfigError::InvalidReference { .. })));
        assert!(doc.records(EntityKind::Fragment).is_empty());
    }

    #[test]
    fn test_self_dependency_is_rejected() {
        let mut doc = Document::empty();
        let result = add_fragment(&mut doc, frag("loop", "./FRAGMENT[./LOOP>0]"));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidField { ref field, .. }) if field == "ERFRAG_SOURCE"
        ));

        add_fragment(&mut doc, frag("base", "./SCORES/NAME[./FULL_SCORE>90]")).unwrap();
        let update = FragmentUpdate {
            source: Update::Set("./FRAGMENT[./BASE>0]".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            set_fragment(&mut doc, "BASE", update),
            Err(ConfigError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_dependency_cycle_is_rejected() {
        let mut doc = Document::empty();
        add_fragment(&mut doc, frag("a", "./SCORES/NAME[./FULL_SCORE>90]")).unwrap();
        add_fragment(&mut doc, frag("b", "./FRAGMENT[./A>0]")).unwrap();
        add_fragment(&mut doc, frag("c", "./FRAGMENT[./B>0]")).unwrap();

        // A -> C -> B -> A
        let update = FragmentUpdate {
            source: Update::Set("./FRAGMENT[./C>0]".to_string()),
            ..Default::default()
        };
        let result = set_fragment(&mut doc, "A", update);
        assert!(matches!(result, Err(ConfigError::InvalidField { .. })));
        assert_eq!(doc.records(EntityKind::Fragment)[0]["ERFRAG_DEPENDS"], Value::Null);
    }

    #[test]
    fn test_dependency_blocks_delete_until_source_changes() {
        let mut doc = Document::empty();
        add_fragment(&mut doc, frag("base", "./SCORES/NAME[./FULL_SCORE>90]")).unwrap();
        add_fragment(&mut doc, frag("outer", "./FRAGMENT[./BASE>0]")).unwrap();

        assert!(matches!(
            delete_fragment(&mut doc, "BASE", &RejectReferencedPolicy),
            Err(ConfigError::ReferencedByOthers { .. })
        ));

        set_fragment(
            &mut doc,
            "OUTER",
            FragmentUpdate {
                source: Update::Set("./SCORES/DOB[./FULL_SCORE>90]".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(doc.records(EntityKind::Fragment)[1]["ERFRAG_DEPENDS"], Value::Null);
        delete_fragment(&mut doc, "BASE", &RejectReferencedPolicy).unwrap();
    }
}
