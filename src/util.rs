/// Small helpers shared by the parser, the project model and the server:
/// name splitting and byte-offset / line / LSP position conversion.
use tower_lsp::lsp_types::Position;

/// Return the last `\`-separated segment of a (possibly qualified) name.
///
/// `"App\\Models\\User"` → `"User"`, `"User"` → `"User"`.
pub fn short_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// 1-based line number of a byte offset.
pub fn line_number(content: &str, offset: u32) -> u32 {
    let end = (offset as usize).min(content.len());
    memchr::memchr_iter(b'\n', &content.as_bytes()[..end]).count() as u32 + 1
}

/// Convert a byte offset into an LSP position (zero-based line, UTF-16
/// column).
pub fn offset_to_position(content: &str, offset: u32) -> Position {
    let mut end = (offset as usize).min(content.len());
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let before = &content[..end];
    let line_start = memchr::memrchr(b'\n', before.as_bytes()).map_or(0, |idx| idx + 1);
    let line = memchr::memchr_iter(b'\n', before.as_bytes()).count() as u32;
    let character = before[line_start..].encode_utf16().count() as u32;
    Position { line, character }
}

/// Convert an LSP position (line, UTF-16 column) to a byte offset in
/// content.  Positions past the end clamp to the end of the content.
pub fn position_to_offset(content: &str, position: Position) -> u32 {
    let mut offset: usize = 0;
    for (i, line) in content.split_inclusive('\n').enumerate() {
        if i == position.line as usize {
            let mut units = 0u32;
            for (idx, ch) in line.char_indices() {
                if units >= position.character || ch == '\n' {
                    return (offset + idx) as u32;
                }
                units += ch.len_utf16() as u32;
            }
            return (offset + line.trim_end_matches('\n').len()) as u32;
        }
        offset += line.len();
    }
    content.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names() {
        assert_eq!(short_name("App\\Models\\User"), "User");
        assert_eq!(short_name("User"), "User");
        assert_eq!(short_name("\\Exception"), "Exception");
    }

    #[test]
    fn line_numbers_are_one_based() {
        let content = "<?php\n\nfoo();\n";
        assert_eq!(line_number(content, 0), 1);
        assert_eq!(line_number(content, 7), 3);
        assert_eq!(line_number(content, 10_000), 4);
    }

    #[test]
    fn positions_round_trip_on_ascii() {
        let content = "<?php\n$x = Locator::get('Foo');\n";
        let offset = content.find("get").unwrap() as u32;
        let pos = offset_to_position(content, offset);
        assert_eq!(pos, Position { line: 1, character: 14 });
        assert_eq!(position_to_offset(content, pos), offset);
    }

    #[test]
    fn utf16_columns() {
        let content = "<?php\n$é = 1; $x = 2;\n";
        let offset = content.find("$x").unwrap() as u32;
        let pos = offset_to_position(content, offset);
        assert_eq!(pos.character, 8);
        assert_eq!(position_to_offset(content, pos), offset);
    }

    #[test]
    fn position_past_end_clamps() {
        let content = "<?php\n";
        assert_eq!(
            position_to_offset(content, Position { line: 9, character: 0 }),
            content.len() as u32
        );
    }
}
