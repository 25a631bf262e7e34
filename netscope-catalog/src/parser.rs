//! Catalog parser.
//!
//! Reads the document line by line, tracking the current category header,
//! and turns every `<METHOD> <path>` line into an [`ApiDefinition`]. Lines
//! that look like neither are dropped without aborting the run.

use crate::classify::{classify_line, CatalogRules, LineClass};
use netscope_core::{ApiCatalog, ApiDefinition, CatalogError, EndpointKind, Service};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Lines between two progress events.
const PROGRESS_INTERVAL: usize = 1000;

/// Path substrings that add a tag.
pub const TAG_TRIGGERS: [(&str, &str); 4] = [
    ("stats", "statistics"),
    ("config", "configuration"),
    ("status", "status"),
    ("clear", "maintenance"),
];

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(get|post|put|delete)\s+(/\S+)").expect("Invalid endpoint regex")
});

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("Invalid placeholder regex"));

/// Parser turning documentation text into a catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogParser {
    rules: CatalogRules,
}

impl CatalogParser {
    pub fn new(rules: CatalogRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &CatalogRules {
        &self.rules
    }

    /// Parse the document at `path`.
    ///
    /// Only a read failure is an error; invalid UTF-8 is replaced, and
    /// unrecognized lines are skipped.
    pub fn parse_file(&self, path: &Path) -> Result<ApiCatalog, CatalogError> {
        let bytes = std::fs::read(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Parsing catalog document");
        Ok(self.parse_str(&String::from_utf8_lossy(&bytes)))
    }

    /// Parse document text already in memory.
    pub fn parse_str(&self, content: &str) -> ApiCatalog {
        let mut catalog = ApiCatalog::new();
        let mut category = String::new();
        let mut dropped = 0usize;
        let mut replaced = 0usize;

        for (index, line) in content.lines().enumerate() {
            if index > 0 && index % PROGRESS_INTERVAL == 0 {
                tracing::debug!(lines = index, definitions = catalog.len(), "Catalog parse progress");
            }

            match classify_line(line, &self.rules) {
                LineClass::Skip => {}
                LineClass::Header(header) => category = header.to_string(),
                LineClass::Candidate(candidate) => match parse_endpoint(candidate, &category) {
                    Some(definition) => {
                        if catalog.insert(definition).is_some() {
                            replaced += 1;
                        }
                    }
                    None => dropped += 1,
                },
            }
        }

        tracing::info!(
            definitions = catalog.len(),
            replaced,
            dropped,
            "Catalog parse complete"
        );
        catalog
    }
}

/// Extract a definition from one candidate line, or `None` if the line has
/// no `<METHOD> <path>` pair.
pub fn parse_endpoint(line: &str, category: &str) -> Option<ApiDefinition> {
    let captures = ENDPOINT.captures(line)?;
    let method = captures.get(1)?.as_str().to_ascii_uppercase();
    let path = captures.get(2)?.as_str().to_string();

    Some(ApiDefinition {
        id: format!("{}_{}_{}", category, method, path.replace('/', "_")),
        service: service_for_path(&path),
        description: describe(category, &path, &method),
        params: placeholders(&path),
        tags: tags_for(category, &path, &method),
        category: category.to_string(),
        method,
        path,
    })
}

/// Owning service, by path precedence.
pub fn service_for_path(path: &str) -> Service {
    if path.contains("/api/") || path.contains("/resources/") {
        EndpointKind::FleetRest
    } else if path.contains("/telemetry/") || path.contains("/streaming/") {
        EndpointKind::Telemetry
    } else if path.contains("/command-api") {
        EndpointKind::CommandApi
    } else {
        EndpointKind::GenericRest
    }
}

fn describe(category: &str, path: &str, method: &str) -> String {
    let category = category.replace(['-', '_'], " ");
    let path = path.replace(['/', '-', '_'], " ");
    format!("{} {} for {}", method, path.trim(), category)
}

fn placeholders(path: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(path)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn tags_for(category: &str, path: &str, method: &str) -> Vec<String> {
    let mut tags = vec![method.to_string(), category.to_lowercase()];
    tags.extend(
        TAG_TRIGGERS
            .iter()
            .filter(|(trigger, _)| path.contains(trigger))
            .map(|(_, tag)| tag.to_string()),
    );
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint_fields() {
        let definition = parse_endpoint("get /rest/interfaces/{name}/stats", "Interface-Counters")
            .expect("line should match");
        assert_eq!(definition.method, "GET");
        assert_eq!(definition.path, "/rest/interfaces/{name}/stats");
        assert_eq!(definition.service, EndpointKind::GenericRest);
        assert_eq!(definition.params, vec!["name".to_string()]);
        assert_eq!(definition.id, "Interface-Counters_GET__rest_interfaces_{name}_stats");
        assert_eq!(
            definition.description,
            "GET rest interfaces {name} stats for Interface Counters"
        );
        assert_eq!(
            definition.tags,
            vec!["GET", "interface-counters", "statistics"]
        );
    }

    #[test]
    fn test_parse_endpoint_rejects_non_matching() {
        assert!(parse_endpoint("see the reference for GET usage", "X").is_none());
        assert!(parse_endpoint("FETCH /api/x", "X").is_none());
        assert!(parse_endpoint("GET api/x", "X").is_none());
    }

    #[test]
    fn test_service_precedence() {
        assert_eq!(service_for_path("/api/config/running"), EndpointKind::FleetRest);
        assert_eq!(service_for_path("/v1/resources/x"), EndpointKind::FleetRest);
        assert_eq!(service_for_path("/telemetry/api/x"), EndpointKind::FleetRest);
        assert_eq!(service_for_path("/streaming/counters"), EndpointKind::Telemetry);
        assert_eq!(service_for_path("/telemetry/streaming"), EndpointKind::Telemetry);
        assert_eq!(service_for_path("/command-api"), EndpointKind::CommandApi);
        assert_eq!(service_for_path("/vRest/aaa"), EndpointKind::GenericRest);
    }

    #[test]
    fn test_multiple_placeholders() {
        assert_eq!(
            placeholders("/api/{device}/interfaces/{intf}"),
            vec!["device".to_string(), "intf".to_string()]
        );
        assert!(placeholders("/api/plain").is_empty());
    }

    #[test]
    fn test_maintenance_tag() {
        let tags = tags_for("Counters", "/rest/counters/clear", "POST");
        assert_eq!(tags, vec!["POST", "counters", "maintenance"]);
    }

    #[test]
    fn test_parse_str_tracks_categories() {
        let content = "Arista Networks Guide\n\nAaaTacacs\nGET /vRest/aaa/tacacs\nAccessLists\nPOST /vRest/acl\n";
        let catalog = CatalogParser::default().parse_str(content);
        assert_eq!(catalog.len(), 2);
        let categories: Vec<&str> = catalog.definitions().map(|d| d.category.as_str()).collect();
        assert!(categories.contains(&"AaaTacacs"));
        assert!(categories.contains(&"AccessLists"));
    }

    #[test]
    fn test_endpoint_before_any_header_has_empty_category() {
        let catalog = CatalogParser::default().parse_str("GET /vRest/root\n");
        let definition = catalog.definitions().next().expect("one definition");
        assert_eq!(definition.category, "");
        assert!(catalog.generic_rest.contains_key("eos_rest__GET"));
    }

    #[test]
    fn test_collision_keeps_later_definition() {
        let content = "Acl\nGET /vRest/acl/first\nGET /vRest/acl/second\n";
        let catalog = CatalogParser::default().parse_str(content);
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.generic_rest.get("eos_rest_Acl_GET").map(|d| d.path.as_str()),
            Some("/vRest/acl/second")
        );
    }

    #[test]
    fn test_parse_file_missing_is_io_error() {
        let err = CatalogParser::default()
            .parse_file(Path::new("/nonexistent/netscope/catalog.txt"))
            .expect_err("missing file should fail");
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
