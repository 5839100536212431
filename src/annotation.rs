//! `@returnTypeArg` annotation extraction.
//!
//! A method opts into argument-driven return types by naming one of its
//! parameters in its docblock:
//!
//! ```text
//! /**
//!  * @return mixed
//!  * @returnTypeArg $type
//!  */
//! public static function instance($type, array $args = []) { ... }
//! ```
//!
//! Extraction is purely textual.  Whether the name refers to a real
//! parameter is decided later by the override engine.

/// The marker that introduces the parameter name.
pub const RETURN_TYPE_ARG_MARKER: &str = "@returnTypeArg";

/// Extract the parameter name following `@returnTypeArg `.
///
/// Returns `None` when there is no docblock or no marker.  The returned
/// name has its `$` sigil and surrounding whitespace stripped and may be
/// empty when nothing follows the marker.
pub fn extract_override_parameter_name(doc: Option<&str>) -> Option<String> {
    extract_with_marker(doc, RETURN_TYPE_ARG_MARKER)
}

/// Same as [`extract_override_parameter_name`] with a custom marker.
///
/// Only the first occurrence is considered.  The marker must be followed
/// by a single space; the name runs to the end of that line.
pub fn extract_with_marker(doc: Option<&str>, marker: &str) -> Option<String> {
    let doc = doc?;
    let needle = format!("{} ", marker);
    let start = memchr::memmem::find(doc.as_bytes(), needle.as_bytes())? + needle.len();

    let rest = &doc[start..];
    let line = match memchr::memchr(b'\n', rest.as_bytes()) {
        Some(eol) => &rest[..eol],
        None => rest,
    };

    Some(line.trim().trim_start_matches('$').trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_docblock() {
        assert_eq!(extract_override_parameter_name(None), None);
    }

    #[test]
    fn docblock_without_marker() {
        let doc = "/**\n * @param string $type\n * @return mixed\n */";
        assert_eq!(extract_override_parameter_name(Some(doc)), None);
    }

    #[test]
    fn extracts_name_without_sigil() {
        let doc = "/**\n * @param string $type\n * @return mixed\n * @returnTypeArg $type\n */";
        assert_eq!(
            extract_override_parameter_name(Some(doc)).as_deref(),
            Some("type")
        );
    }

    #[test]
    fn crlf_and_padding_are_trimmed() {
        let doc = "/**\r\n * @returnTypeArg    $service   \r\n */";
        assert_eq!(
            extract_override_parameter_name(Some(doc)).as_deref(),
            Some("service")
        );
    }

    #[test]
    fn name_without_sigil_is_accepted() {
        let doc = "/**\n * @returnTypeArg type\n */";
        assert_eq!(
            extract_override_parameter_name(Some(doc)).as_deref(),
            Some("type")
        );
    }

    #[test]
    fn marker_at_end_of_text_yields_empty_name() {
        assert_eq!(
            extract_override_parameter_name(Some("@returnTypeArg ")).as_deref(),
            Some("")
        );
    }

    #[test]
    fn marker_without_trailing_space_is_ignored() {
        assert_eq!(
            extract_override_parameter_name(Some("/** @returnTypeArg\n */")),
            None
        );
    }

    #[test]
    fn single_line_docblock_keeps_the_rest_of_the_line() {
        // No identifier validation happens here; the engine reports the
        // mismatch.
        assert_eq!(
            extract_override_parameter_name(Some("/** @returnTypeArg $type */")).as_deref(),
            Some("type */")
        );
    }

    #[test]
    fn only_the_first_marker_counts() {
        let doc = "/**\n * @returnTypeArg $first\n * @returnTypeArg $second\n */";
        assert_eq!(
            extract_override_parameter_name(Some(doc)).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn custom_marker() {
        let doc = "/**\n * @phpantom-return-arg $class\n */";
        assert_eq!(
            extract_with_marker(Some(doc), "@phpantom-return-arg").as_deref(),
            Some("class")
        );
        assert_eq!(extract_override_parameter_name(Some(doc)), None);
    }
}
