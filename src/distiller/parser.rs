use serde_json::Deserializer;

use crate::error::{Error, Result};
use crate::models::AtomicChange;

/// Parses the distiller's stdout. The JSON array may be preceded by log lines
/// and followed by anything; blank output means no changes.
pub fn parse_distiller_output(output: &str) -> Result<Vec<AtomicChange>> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut last_error = None;
    for start in array_starts(output) {
        let mut stream = Deserializer::from_str(&output[start..]).into_iter::<Vec<AtomicChange>>();
        match stream.next() {
            Some(Ok(changes)) => return Ok(changes),
            Some(Err(e)) => last_error = Some(e),
            None => {}
        }
    }

    Err(Error::ParseError(match last_error {
        Some(e) => format!("Failed to parse distiller output: {}", e),
        None => "No JSON array found in distiller output".to_string(),
    }))
}

/// Byte offsets of `[` characters that open a line.
fn array_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut offset = 0;
    text.split_inclusive('\n').filter_map(move |line| {
        let line_start = offset;
        offset += line.len();
        let indent = line.len() - line.trim_start().len();
        line.trim_start()
            .starts_with('[')
            .then_some(line_start + indent)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeKind;

    #[test]
    fn test_parse_plain_array() {
        let output = r#"[{"change_type": "STATEMENT_INSERT", "changed_entity": "IF_STATEMENT"}]"#;
        let changes = parse_distiller_output(output).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_kind, ChangeKind::StatementInsert);
        assert_eq!(changes[0].parent_entity, None);
    }

    #[test]
    fn test_parse_skips_log_lines() {
        let output = "[main] INFO distiller - parsing\n\
                      loaded 2 files\n\
                      [\n  {\"change_type\": \"DOC_UPDATE\", \"changed_entity\": \"JAVADOC\", \"parent_entity\": \"METHOD\"}\n]\n\
                      done\n";
        let changes = parse_distiller_output(output).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_kind, ChangeKind::DocUpdate);
    }

    #[test]
    fn test_blank_output_is_no_changes() {
        assert!(parse_distiller_output("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_kind_keeps_the_rest_of_the_array() {
        let output = r#"[
            {"change_type": "STATEMENT_INSERT", "changed_entity": "IF_STATEMENT"},
            {"change_type": "STATEMENT_TELEPORT", "changed_entity": "IF_STATEMENT"}
        ]"#;
        let changes = parse_distiller_output(output).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_kind, ChangeKind::StatementInsert);
        assert_eq!(
            changes[1].change_kind,
            ChangeKind::Unknown("STATEMENT_TELEPORT".to_string())
        );
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let output = r#"[{"change_type": "STATEMENT_INSERT"}]"#;
        assert!(matches!(parse_distiller_output(output), Err(Error::ParseError(_))));
    }
}
