use g2config_core_types::schema;
use g2config_core_types::EntityKind;
use thiserror::Error;

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure of the engine is classified into one of these kinds. Each
/// kind has a stable string code for programmatic handling and a distinct
/// numeric code reported through the last-error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Unparseable document or command, missing or wrong-shaped field
    MalformedInput,
    /// Code or composite key already present in the collection
    DuplicateCode,
    /// Target of a delete, set or get does not exist
    NotFound,
    /// A reference field does not resolve in its target collection
    InvalidReference,
    /// Delete would leave dangling references
    ReferencedByOthers,
    /// Attempt to change a code, id or key field
    ImmutableField,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::MalformedInput => "ERR_MALFORMED_INPUT",
            ExErrorKind::DuplicateCode => "ERR_DUPLICATE_CODE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidReference => "ERR_INVALID_REFERENCE",
            ExErrorKind::ReferencedByOthers => "ERR_REFERENCED_BY_OTHERS",
            ExErrorKind::ImmutableField => "ERR_IMMUTABLE_FIELD",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Get the numeric code reported at the text boundary
    pub fn numeric_code(&self) -> i64 {
        match self {
            ExErrorKind::MalformedInput => schema::ERROR_CODE_MALFORMED_INPUT,
            ExErrorKind::DuplicateCode => schema::ERROR_CODE_DUPLICATE_CODE,
            ExErrorKind::NotFound => schema::ERROR_CODE_NOT_FOUND,
            ExErrorKind::InvalidReference => schema::ERROR_CODE_INVALID_REFERENCE,
            ExErrorKind::ReferencedByOthers => schema::ERROR_CODE_REFERENCED_BY_OTHERS,
            ExErrorKind::ImmutableField => schema::ERROR_CODE_IMMUTABLE_FIELD,
            ExErrorKind::Internal => schema::ERROR_CODE_INTERNAL,
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the context needed to report a failure
/// at the boundary: the operation, the entity kind and key, and the field
/// involved.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_kind: Option<EntityKind>,
    entity_id: Option<String>,
    field: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_kind: None,
            entity_id: None,
            field: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kind = Some(kind);
        self
    }

    /// Add entity code or id context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn numeric_code(&self) -> i64 {
        self.kind.numeric_code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_kind(&self) -> Option<EntityKind> {
        self.entity_kind
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.kind.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(kind) = self.entity_kind {
            write!(f, " (entity_kind: {})", kind)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for configuration document operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    // ===== Document Errors =====
    /// Text is not JSON, or has no `G2_CONFIG` object
    #[error("Malformed configuration document: {reason}")]
    MalformedDocument { reason: String },

    /// A known section exists but is not an array of objects
    #[error("Section {section} is not an array of records")]
    InvalidSection { section: String },

    // ===== Input Errors =====
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// Command or query text does not deserialize
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    #[error("Unknown system parameter: {name}")]
    UnknownParameter { name: String },

    /// Kind is read-only or otherwise not applicable to the operation
    #[error("Operation {operation} is not supported for {kind}")]
    UnsupportedOperation { kind: EntityKind, operation: String },

    // ===== Identity Errors =====
    #[error("{kind} already exists: {key}")]
    DuplicateCode { kind: EntityKind, key: String },

    #[error("Config section already exists: {section}")]
    DuplicateSection { section: String },

    #[error("Value already present in {list}")]
    DuplicateHash { list: String },

    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },

    #[error("Config section not found: {section}")]
    SectionNotFound { section: String },

    #[error("Value not present in {list}")]
    HashNotFound { list: String },

    // ===== Reference Errors =====
    #[error("{kind}.{field} references unknown {target}: {value}")]
    InvalidReference {
        kind: EntityKind,
        field: String,
        target: EntityKind,
        value: String,
    },

    #[error("{kind} {key} is referenced by {referenced_by}.{field}")]
    ReferencedByOthers {
        kind: EntityKind,
        key: String,
        referenced_by: EntityKind,
        field: String,
    },

    #[error("{kind}.{field} cannot be changed")]
    ImmutableField { kind: EntityKind, field: String },

    // ===== Internal Errors =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<ConfigError> for ExError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        match err {
            ConfigError::MalformedDocument { .. } => {
                ExError::new(ExErrorKind::MalformedInput).with_message(message)
            }

            ConfigError::InvalidSection { section } => ExError::new(ExErrorKind::MalformedInput)
                .with_field(section)
                .with_message(message),

            ConfigError::MissingField { field } | ConfigError::InvalidField { field, .. } => {
                ExError::new(ExErrorKind::MalformedInput)
                    .with_field(field)
                    .with_message(message)
            }

            ConfigError::MalformedRequest { .. } => {
                ExError::new(ExErrorKind::MalformedInput).with_message(message)
            }

            ConfigError::UnknownParameter { name } => ExError::new(ExErrorKind::MalformedInput)
                .with_field(name)
                .with_message(message),

            ConfigError::UnsupportedOperation { kind, .. } => {
                ExError::new(ExErrorKind::MalformedInput)
                    .with_entity_kind(kind)
                    .with_message(message)
            }

            ConfigError::DuplicateCode { kind, key } => ExError::new(ExErrorKind::DuplicateCode)
                .with_entity_kind(kind)
                .with_entity_id(key)
                .with_message(message),

            ConfigError::DuplicateSection { section } => ExError::new(ExErrorKind::DuplicateCode)
                .with_entity_id(section)
                .with_message(message),

            ConfigError::DuplicateHash { list } => ExError::new(ExErrorKind::DuplicateCode)
                .with_field(list)
                .with_message(message),

            ConfigError::NotFound { kind, key } => ExError::new(ExErrorKind::NotFound)
                .with_entity_kind(kind)
                .with_entity_id(key)
                .with_message(message),

            ConfigError::SectionNotFound { section } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(section)
                .with_message(message),

            ConfigError::HashNotFound { list } => ExError::new(ExErrorKind::NotFound)
                .with_field(list)
                .with_message(message),

            ConfigError::InvalidReference { kind, field, .. } => {
                ExError::new(ExErrorKind::InvalidReference)
                    .with_entity_kind(kind)
                    .with_field(field)
                    .with_message(message)
            }

            ConfigError::ReferencedByOthers {
                kind, key, field, ..
            } => ExError::new(ExErrorKind::ReferencedByOthers)
                .with_entity_kind(kind)
                .with_entity_id(key)
                .with_field(field)
                .with_message(message),

            ConfigError::ImmutableField { kind, field } => {
                ExError::new(ExErrorKind::ImmutableField)
                    .with_entity_kind(kind)
                    .with_field(field)
                    .with_message(message)
            }

            ConfigError::Serialization { .. } | ConfigError::Internal { .. } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::MalformedInput, "ERR_MALFORMED_INPUT"),
            (ExErrorKind::DuplicateCode, "ERR_DUPLICATE_CODE"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::InvalidReference, "ERR_INVALID_REFERENCE"),
            (ExErrorKind::ReferencedByOthers, "ERR_REFERENCED_BY_OTHERS"),
            (ExErrorKind::ImmutableField, "ERR_IMMUTABLE_FIELD"),
            (ExErrorKind::Internal, "ERR_INTERNAL"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_duplicate_code_conversion_keeps_context() {
        let err = ConfigError::DuplicateCode {
            kind: EntityKind::DataSource,
            key: "CUSTOMERS".to_string(),
        };
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::DuplicateCode);
        assert_eq!(ex.entity_kind(), Some(EntityKind::DataSource));
        assert_eq!(ex.entity_id(), Some("CUSTOMERS"));
        assert!(ex.message().contains("CUSTOMERS"));
    }

    #[test]
    fn test_display_includes_op_and_field() {
        let ex = ExError::new(ExErrorKind::ImmutableField)
            .with_op("set_data_source")
            .with_field("DSRC_CODE")
            .with_message("code cannot change");
        let text = ex.to_string();
        assert!(text.starts_with("[ERR_IMMUTABLE_FIELD]"));
        assert!(text.contains("in operation 'set_data_source'"));
        assert!(text.contains("(field: DSRC_CODE)"));
    }

    #[test]
    fn test_serde_error_maps_to_internal() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ConfigError = parse_err.into();
        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::Internal);
    }
}
