use g2config_core::{apply, Command, ConfigError, Document, RejectReferencedPolicy};
use serde_json::json;

/// A small but connected configuration: two data sources, one feature
/// class, an ALT_NAME feature with two elements, a mapped attribute and one
/// function in each of the standardize/expression/comparison registries.
#[allow(dead_code)]
pub fn base_document() -> Document {
    Document::from_value(json!({"G2_CONFIG": {
        "CFG_DSRC": [
            {"DSRC_ID": 1, "DSRC_CODE": "TEST", "DSRC_DESC": "Test", "DSRC_RELY": 1,
             "RETENTION_LEVEL": "Remember", "CONVERSATIONAL": "No"},
            {"DSRC_ID": 2, "DSRC_CODE": "SEARCH", "DSRC_DESC": "Search", "DSRC_RELY": 1,
             "RETENTION_LEVEL": "Forget", "CONVERSATIONAL": "No"}
        ],
        "CFG_FCLASS": [
            {"FCLASS_ID": 1, "FCLASS_CODE": "NAME", "FCLASS_DESC": "Name"},
            {"FCLASS_ID": 7, "FCLASS_CODE": "OTHER", "FCLASS_DESC": "Other"}
        ],
        "CFG_FELEM": [
            {"FELEM_ID": 1, "FELEM_CODE": "FULL_NAME", "FELEM_DESC": "FULL_NAME",
             "DATA_TYPE": "string", "TOKENIZE": "No"},
            {"FELEM_ID": 2, "FELEM_CODE": "SUR_NAME", "FELEM_DESC": "SUR_NAME",
             "DATA_TYPE": "string", "TOKENIZE": "No"}
        ],
        "CFG_FTYPE": [
            {"FTYPE_ID": 1, "FTYPE_CODE": "ALT_NAME", "FTYPE_DESC": "Name", "FCLASS_ID": 1,
             "FTYPE_FREQ": "NAME", "FTYPE_EXCL": "No", "FTYPE_STAB": "No",
             "ANONYMIZE": "No", "DERIVED": "No", "USED_FOR_CAND": "No",
             "SHOW_IN_MATCH_KEY": "Yes", "PERSIST_HISTORY": "Yes", "VERSION": 1, "RTYPE_ID": 0}
        ],
        "CFG_FBOM": [
            {"FTYPE_ID": 1, "FELEM_ID": 1, "EXEC_ORDER": 1, "DISPLAY_LEVEL": 1, "DERIVED": "No"},
            {"FTYPE_ID": 1, "FELEM_ID": 2, "EXEC_ORDER": 2, "DISPLAY_LEVEL": 1, "DERIVED": "No"}
        ],
        "CFG_ATTR": [
            {"ATTR_ID": 1, "ATTR_CODE": "NAME_FULL", "ATTR_CLASS": "NAME",
             "FTYPE_CODE": "ALT_NAME", "FELEM_CODE": "FULL_NAME", "FELEM_REQ": "No",
             "DEFAULT_VALUE": null, "INTERNAL": "No"}
        ],
        "CFG_SFUNC": [
            {"SFUNC_ID": 1, "SFUNC_CODE": "PARSE_NAME", "SFUNC_DESC": "Parse name",
             "CONNECT_STR": "g2StdName", "LANGUAGE": null}
        ],
        "CFG_EFUNC": [
            {"EFUNC_ID": 1, "EFUNC_CODE": "NAME_HASHER", "EFUNC_DESC": "Name hasher",
             "CONNECT_STR": "g2NameHasher", "LANGUAGE": null}
        ],
        "CFG_CFUNC": [
            {"CFUNC_ID": 1, "CFUNC_CODE": "CMP_NAME", "CFUNC_DESC": "Compare names",
             "CONNECT_STR": "g2CmpName", "ANON_SUPPORT": "Yes", "LANGUAGE": null}
        ],
        "CFG_RTYPE": [
            {"RTYPE_ID": 1, "RTYPE_CODE": "DISCLOSED", "RCLASS_ID": 2, "BREAK_RES": 0}
        ],
        "CONFIG_BASE_VERSION": {
            "VERSION": "4.0.0",
            "COMPATIBILITY_VERSION": {"CONFIG_VERSION": "11"}
        }
    }}))
    .unwrap()
}

#[allow(dead_code)]
pub fn command(json: serde_json::Value) -> Command {
    serde_json::from_value(json).unwrap()
}

/// Apply under the default reject policy
#[allow(dead_code)]
pub fn try_apply(doc: &Document, cmd: serde_json::Value) -> Result<Document, ConfigError> {
    apply(doc.clone(), command(cmd), &RejectReferencedPolicy)
}

#[allow(dead_code)]
pub fn apply_ok(doc: &Document, cmd: serde_json::Value) -> Document {
    try_apply(doc, cmd).unwrap()
}
