use std::fmt::Write;

use hcl::{Block, Body};
use thiserror::Error;

/// One `resource` block lifted out of a parsed Terraform file.
#[derive(Debug, Clone)]
pub struct ParsedResource {
    pub kind: String,
    pub name: String,
    pub body: Body,
}

/// Errors raised while extracting resource blocks in resource-granularity mode.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid HCL in {origin}: {source}")]
    Syntax {
        origin: String,
        #[source]
        source: hcl::Error,
    },
    #[error("resource block in {origin} must carry exactly a type and a name label")]
    MissingLabels { origin: String },
}

/// Parse `src` and return every top-level `resource` block.
///
/// `origin` labels the source (usually a file path) in error messages. Any HCL
/// syntax error is fatal for the run; there is no partial recovery.
pub fn parse_resources(src: &str, origin: &str) -> Result<Vec<ParsedResource>, ResourceError> {
    let body = hcl::parse(src).map_err(|source| ResourceError::Syntax {
        origin: origin.to_string(),
        source,
    })?;
    let mut resources = Vec::new();
    for block in body.blocks() {
        if block.identifier() != "resource" {
            continue;
        }
        let labels = block.labels();
        let (kind, name) = match labels {
            [kind, name] => (kind.as_str(), name.as_str()),
            _ => {
                return Err(ResourceError::MissingLabels {
                    origin: origin.to_string(),
                })
            }
        };
        resources.push(ParsedResource {
            kind: kind.to_string(),
            name: name.to_string(),
            body: block.body().clone(),
        });
    }
    Ok(resources)
}

/// Render one resource block back into canonical HCL-like text for the model.
///
/// Attributes render as `key = <json-encoded value>`; nested blocks recurse at
/// one deeper indent level. Pure and deterministic.
pub fn format_resource(kind: &str, name: &str, body: &Body) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "resource \"{kind}\" \"{name}\" {{");
    write_body(&mut out, body, 1);
    out.push_str("}\n");
    out
}

fn write_body(out: &mut String, body: &Body, depth: usize) {
    let indent = "  ".repeat(depth);
    for attr in body.attributes() {
        let value =
            serde_json::to_string(attr.expr()).unwrap_or_else(|_| "null".to_string());
        let _ = writeln!(out, "{indent}{key} = {value}", key = attr.key());
    }
    for block in body.blocks() {
        write_block_header(out, block, &indent);
        write_body(out, block.body(), depth + 1);
        let _ = writeln!(out, "{indent}}}");
    }
}

fn write_block_header(out: &mut String, block: &Block, indent: &str) {
    let mut header = String::from(block.identifier());
    for label in block.labels() {
        let _ = write!(header, " \"{}\"", label.as_str());
    }
    let _ = writeln!(out, "{indent}{header} {{");
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
provider "aws" {
  region = "eu-west-1"
}

resource "aws_security_group" "open" {
  name = "open"

  ingress {
    from_port   = 22
    to_port     = 22
    cidr_blocks = ["0.0.0.0/0"]
  }
}

resource "aws_s3_bucket" "logs" {
  bucket = "corp-logs"
}
"#;

    #[test]
    fn extracts_only_resource_blocks() {
        let resources = parse_resources(SAMPLE, "sample.tf").unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].kind, "aws_security_group");
        assert_eq!(resources[0].name, "open");
        assert_eq!(resources[1].kind, "aws_s3_bucket");
        assert_eq!(resources[1].name, "logs");
    }

    #[test]
    fn formats_attributes_and_nested_blocks() {
        let resources = parse_resources(SAMPLE, "sample.tf").unwrap();
        let rendered = format_resource(
            &resources[0].kind,
            &resources[0].name,
            &resources[0].body,
        );
        assert!(rendered.starts_with("resource \"aws_security_group\" \"open\" {\n"));
        assert!(rendered.contains("  name = \"open\"\n"));
        assert!(rendered.contains("  ingress {\n"));
        assert!(rendered.contains("    from_port = 22\n"));
        assert!(rendered.contains("    cidr_blocks = [\"0.0.0.0/0\"]\n"));
        assert!(rendered.ends_with("}\n"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let resources = parse_resources(SAMPLE, "sample.tf").unwrap();
        let first = format_resource(&resources[1].kind, &resources[1].name, &resources[1].body);
        let second = format_resource(&resources[1].kind, &resources[1].name, &resources[1].body);
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_hcl_is_a_syntax_error() {
        let err = parse_resources("resource \"a\" \"b\" {", "broken.tf").unwrap_err();
        assert!(matches!(err, ResourceError::Syntax { .. }));
        assert!(err.to_string().contains("broken.tf"));
    }

    #[test]
    fn resource_without_two_labels_is_rejected() {
        let err = parse_resources("resource \"onlytype\" {\n}\n", "odd.tf").unwrap_err();
        assert!(matches!(err, ResourceError::MissingLabels { .. }));
    }
}
